//! Synthetic Todo / Habit CSV fixtures for importer and parser test suites.
//!
//! Rows are derived from a monotonically increasing sequence number. Structural
//! fields (id, title, description presence, completion flag) depend only on that
//! number; the remaining fields draw from a seedable RNG.

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

mod corruption;
mod csv;
mod generate;
mod record;
mod validate;

pub use corruption::{Corruption, ErrorPlan, ERROR_SLOT_PERIOD};
pub use csv::split_row;
pub use generate::{
    generate_habits_csv, generate_todos_csv, generate_todos_with_errors_csv, write_habits,
    write_todos, write_todos_with_errors, GenerationReport,
};
pub use record::{
    format_timestamp, sequence_id, HabitRecord, Period, TodoRecord, COLOR_SWATCHES, HABIT_HEADER,
    ICON_GLYPHS, PRIORITY_RANGE, TARGET_RANGE, TODO_HEADER,
};
pub use validate::{
    validate_csv, validate_csv_file, validate_habit_row, validate_row, validate_todo_row,
    InvalidRow, RowViolation, ValidationReport,
};

/// 2024-01-01T00:00:00Z
const DEFAULT_BASE_UNIX_SECONDS: i64 = 1_704_067_200;

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid error ratio {0}: expected a value within 0.0..=1.0")]
    InvalidRatio(f64),
    #[error("timestamp error: {0}")]
    Timestamp(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Todo,
    Habit,
}

impl RecordKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::Habit => "habit",
        }
    }

    #[must_use]
    pub fn header(self) -> &'static str {
        match self {
            Self::Todo => TODO_HEADER,
            Self::Habit => HABIT_HEADER,
        }
    }

    #[must_use]
    pub fn field_count(self) -> usize {
        self.header().split(',').count()
    }
}

/// Inputs shared by every generation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorConfig {
    base_time: OffsetDateTime,
    seed: Option<u64>,
}

impl GeneratorConfig {
    /// Builds a config anchored at `base_time`, normalized to UTC whole seconds.
    ///
    /// # Errors
    /// Returns [`FixtureError::Timestamp`] when the sub-second part cannot be cleared.
    pub fn new(base_time: OffsetDateTime, seed: Option<u64>) -> Result<Self, FixtureError> {
        let base_time = base_time
            .to_offset(time::UtcOffset::UTC)
            .replace_nanosecond(0)
            .map_err(|err| FixtureError::Timestamp(err.to_string()))?;
        Ok(Self { base_time, seed })
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn base_time(&self) -> OffsetDateTime {
        self.base_time
    }

    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Seeded when a seed is configured, otherwise drawn from OS entropy.
    #[must_use]
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_time: OffsetDateTime::UNIX_EPOCH + Duration::seconds(DEFAULT_BASE_UNIX_SECONDS),
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_time_is_start_of_2024() {
        let config = GeneratorConfig::default();
        let formatted = format_timestamp(config.base_time())
            .unwrap_or_else(|err| panic!("format failed: {err}"));
        assert_eq!(formatted, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn config_drops_sub_second_precision_and_offset() {
        let offset = time::UtcOffset::from_hms(8, 0, 0)
            .unwrap_or_else(|err| panic!("invalid offset: {err}"));
        let base = (OffsetDateTime::UNIX_EPOCH + Duration::milliseconds(1_704_096_000_250))
            .to_offset(offset);
        let config =
            GeneratorConfig::new(base, None).unwrap_or_else(|err| panic!("config failed: {err}"));
        let formatted = format_timestamp(config.base_time())
            .unwrap_or_else(|err| panic!("format failed: {err}"));
        assert_eq!(formatted, "2024-01-01T08:00:00Z");
    }

    #[test]
    fn record_kind_field_counts_follow_headers() {
        assert_eq!(RecordKind::Todo.field_count(), 8);
        assert_eq!(RecordKind::Habit.field_count(), 9);
        assert_eq!(RecordKind::Habit.as_str(), "habit");
    }
}
