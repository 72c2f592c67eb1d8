use std::ops::RangeInclusive;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

use crate::csv::join_row;
use crate::FixtureError;

pub const TODO_HEADER: &str = "id,title,description,completed,priority,dueAt,createdAt,updatedAt";
pub const HABIT_HEADER: &str =
    "id,title,description,period,target,color,icon,createdAt,updatedAt";

pub const PRIORITY_RANGE: RangeInclusive<u8> = 0..=2;
pub const TARGET_RANGE: RangeInclusive<u8> = 1..=10;

pub const COLOR_SWATCHES: [&str; 10] = [
    "#4CAF50", "#2196F3", "#FF5722", "#9C27B0", "#FFC107", "#00BCD4", "#E91E63", "#3F51B5",
    "#8BC34A", "#FF9800",
];

pub const ICON_GLYPHS: [&str; 8] = ["🏃", "📚", "💧", "🧘", "🍎", "💤", "✍️", "🎯"];

pub(crate) const TODO_ID_PREFIX: &str = "todo";
pub(crate) const HABIT_ID_PREFIX: &str = "habit";

pub(crate) const TODO_COMPLETED_COLUMN: usize = 3;
pub(crate) const TODO_PRIORITY_COLUMN: usize = 4;
pub(crate) const TODO_CREATED_AT_COLUMN: usize = 6;

const ID_WIDTH: usize = 6;
const CREATED_STEP_SECONDS: i64 = 3_600;
const DUE_WINDOW_SECONDS: i64 = 30 * 86_400;
const UPDATE_WINDOW_SECONDS: i64 = 86_400;

/// Formats a UTC instant as `YYYY-MM-DDTHH:MM:SSZ`.
///
/// # Errors
/// Returns [`FixtureError::Timestamp`] when the instant cannot be rendered as RFC 3339.
pub fn format_timestamp(value: OffsetDateTime) -> Result<String, FixtureError> {
    value
        .to_offset(time::UtcOffset::UTC)
        .format(&Rfc3339)
        .map_err(|err| FixtureError::Timestamp(format!("failed to format timestamp: {err}")))
}

#[must_use]
pub fn sequence_id(prefix: &str, sequence: u64) -> String {
    format!("{prefix}-{sequence:0width$}", width = ID_WIDTH)
}

fn offset_by(
    base: OffsetDateTime,
    seconds: Option<i64>,
    sequence: u64,
) -> Result<OffsetDateTime, FixtureError> {
    seconds
        .and_then(|seconds| base.checked_add(Duration::seconds(seconds)))
        .ok_or_else(|| {
            FixtureError::Timestamp(format!("timestamp out of range for sequence {sequence}"))
        })
}

fn created_at(base: OffsetDateTime, sequence: u64) -> Result<OffsetDateTime, FixtureError> {
    let seconds = i64::try_from(sequence)
        .ok()
        .and_then(|sequence| sequence.checked_mul(CREATED_STEP_SECONDS));
    offset_by(base, seconds, sequence)
}

fn updated_at<R: Rng + ?Sized>(
    created_at: OffsetDateTime,
    sequence: u64,
    rng: &mut R,
) -> Result<OffsetDateTime, FixtureError> {
    offset_by(created_at, Some(rng.gen_range(1..=UPDATE_WINDOW_SECONDS)), sequence)
}

fn optional_timestamp(value: Option<OffsetDateTime>) -> Result<String, FixtureError> {
    value.map_or_else(|| Ok(String::new()), format_timestamp)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    pub const ALL: [Self; 3] = [Self::Daily, Self::Weekly, Self::Monthly];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub priority: u8,
    pub due_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TodoRecord {
    /// Synthesizes the todo for `sequence` (1-based).
    ///
    /// Every 3rd todo has an empty description, every 4th is completed and every
    /// 2nd carries a due date.
    ///
    /// # Errors
    /// Returns [`FixtureError::Timestamp`] when a derived timestamp overflows.
    pub fn build<R: Rng + ?Sized>(
        sequence: u64,
        base: OffsetDateTime,
        rng: &mut R,
    ) -> Result<Self, FixtureError> {
        let description = if sequence % 3 == 0 {
            String::new()
        } else {
            format!("Description for todo {sequence}")
        };
        let priority = rng.gen_range(PRIORITY_RANGE);
        let due_at = if sequence % 2 == 0 {
            Some(offset_by(base, Some(rng.gen_range(0..=DUE_WINDOW_SECONDS)), sequence)?)
        } else {
            None
        };
        let created_at = created_at(base, sequence)?;
        let updated_at = updated_at(created_at, sequence, rng)?;

        Ok(Self {
            id: sequence_id(TODO_ID_PREFIX, sequence),
            title: format!("Todo {sequence}"),
            description,
            completed: sequence % 4 == 0,
            priority,
            due_at,
            created_at,
            updated_at,
        })
    }

    pub(crate) fn csv_fields(&self) -> Result<Vec<String>, FixtureError> {
        Ok(vec![
            self.id.clone(),
            self.title.clone(),
            self.description.clone(),
            self.completed.to_string(),
            self.priority.to_string(),
            optional_timestamp(self.due_at)?,
            format_timestamp(self.created_at)?,
            format_timestamp(self.updated_at)?,
        ])
    }

    /// # Errors
    /// Returns [`FixtureError::Timestamp`] when a timestamp cannot be formatted.
    pub fn to_csv_row(&self) -> Result<String, FixtureError> {
        Ok(join_row(&self.csv_fields()?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub period: Period,
    pub target: u8,
    pub color: String,
    pub icon: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl HabitRecord {
    /// Synthesizes the habit for `sequence` (1-based).
    ///
    /// Every 4th habit has an empty description and every 5th an empty icon.
    ///
    /// # Errors
    /// Returns [`FixtureError::Timestamp`] when a derived timestamp overflows.
    pub fn build<R: Rng + ?Sized>(
        sequence: u64,
        base: OffsetDateTime,
        rng: &mut R,
    ) -> Result<Self, FixtureError> {
        let description = if sequence % 4 == 0 {
            String::new()
        } else {
            format!("Description for habit {sequence}")
        };
        let period = Period::ALL.choose(rng).copied().unwrap_or(Period::Daily);
        let target = rng.gen_range(TARGET_RANGE);
        let color = COLOR_SWATCHES.choose(rng).copied().unwrap_or(COLOR_SWATCHES[0]);
        let icon = if sequence % 5 == 0 {
            String::new()
        } else {
            ICON_GLYPHS.choose(rng).copied().unwrap_or_default().to_string()
        };
        let created_at = created_at(base, sequence)?;
        let updated_at = updated_at(created_at, sequence, rng)?;

        Ok(Self {
            id: sequence_id(HABIT_ID_PREFIX, sequence),
            title: format!("Habit {sequence}"),
            description,
            period,
            target,
            color: color.to_string(),
            icon,
            created_at,
            updated_at,
        })
    }

    /// # Errors
    /// Returns [`FixtureError::Timestamp`] when a timestamp cannot be formatted.
    pub fn to_csv_row(&self) -> Result<String, FixtureError> {
        Ok(join_row(&[
            self.id.clone(),
            self.title.clone(),
            self.description.clone(),
            self.period.as_str().to_string(),
            self.target.to_string(),
            self.color.clone(),
            self.icon.clone(),
            format_timestamp(self.created_at)?,
            format_timestamp(self.updated_at)?,
        ]))
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::GeneratorConfig;

    fn base() -> OffsetDateTime {
        GeneratorConfig::default().base_time()
    }

    fn todo(sequence: u64) -> TodoRecord {
        let mut rng = StdRng::seed_from_u64(7);
        TodoRecord::build(sequence, base(), &mut rng)
            .unwrap_or_else(|err| panic!("todo {sequence} failed: {err}"))
    }

    #[test]
    fn ids_are_zero_padded_to_six_digits() {
        assert_eq!(sequence_id("todo", 4), "todo-000004");
        assert_eq!(sequence_id("habit", 1_234_567), "habit-1234567");
    }

    #[test]
    fn todo_structural_fields_follow_sequence() {
        let third = todo(3);
        assert_eq!(third.id, "todo-000003");
        assert_eq!(third.title, "Todo 3");
        assert!(third.description.is_empty());
        assert!(!third.completed);
        assert!(third.due_at.is_none());

        let fourth = todo(4);
        assert!(fourth.completed);
        assert_eq!(fourth.description, "Description for todo 4");
        assert!(fourth.due_at.is_some());
    }

    #[test]
    fn todo_timestamps_are_ordered_and_scaled_by_sequence() {
        let record = todo(10);
        assert_eq!(record.created_at, base() + Duration::hours(10));
        assert!(record.updated_at > record.created_at);
        assert!(record.updated_at <= record.created_at + Duration::days(1));
        let due = record.due_at.unwrap_or_else(|| panic!("even sequence should carry dueAt"));
        assert!(due >= base() && due <= base() + Duration::days(30));
    }

    #[test]
    fn todo_row_renders_booleans_and_utc_timestamps() {
        let row = todo(4).to_csv_row().unwrap_or_else(|err| panic!("row failed: {err}"));
        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(fields.len(), 8);
        assert_eq!(fields[0], "todo-000004");
        assert_eq!(fields[3], "true");
        assert_eq!(fields[6], "2024-01-01T04:00:00Z");
        assert!(fields[7].ends_with('Z'));
    }

    #[test]
    fn habit_fields_stay_within_their_domains() {
        let mut rng = StdRng::seed_from_u64(11);
        for sequence in 1..=40 {
            let habit = HabitRecord::build(sequence, base(), &mut rng)
                .unwrap_or_else(|err| panic!("habit {sequence} failed: {err}"));
            assert!(TARGET_RANGE.contains(&habit.target));
            assert!(COLOR_SWATCHES.contains(&habit.color.as_str()));
            assert_eq!(habit.description.is_empty(), sequence % 4 == 0);
            assert_eq!(habit.icon.is_empty(), sequence % 5 == 0);
            assert!(habit.updated_at > habit.created_at);
        }
    }

    #[test]
    fn period_round_trips_through_its_token() {
        for period in Period::ALL {
            assert_eq!(Period::parse(period.as_str()), Some(period));
        }
        assert_eq!(Period::parse("yearly"), None);
    }
}
