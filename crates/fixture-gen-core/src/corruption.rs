use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::csv::join_row;
use crate::record::{
    TodoRecord, TODO_COMPLETED_COLUMN, TODO_CREATED_AT_COLUMN, TODO_PRIORITY_COLUMN,
};
use crate::FixtureError;

/// Only every `ERROR_SLOT_PERIOD`-th slot (1-based) may carry a corrupted row.
pub const ERROR_SLOT_PERIOD: usize = 5;

const MISSING_FIELDS_KEPT: usize = 3;
const INVALID_BOOLEAN_TOKEN: &str = "maybe";
const NON_NUMERIC_PRIORITY: &str = "high";
const MALFORMED_TIMESTAMP: &str = "2024-13-45 25:61:00";

/// Guards against `N * r` landing just below an integer, e.g. `100 * 0.29`.
const RATIO_EPSILON: f64 = 1e-9;

/// One broken schema invariant per corrupted todo row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Corruption {
    MissingFields,
    InvalidBoolean,
    NonNumericPriority,
    MalformedTimestamp,
}

impl Corruption {
    pub const ALL: [Self; 4] = [
        Self::MissingFields,
        Self::InvalidBoolean,
        Self::NonNumericPriority,
        Self::MalformedTimestamp,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingFields => "missing_fields",
            Self::InvalidBoolean => "invalid_boolean",
            Self::NonNumericPriority => "non_numeric_priority",
            Self::MalformedTimestamp => "malformed_timestamp",
        }
    }

    pub fn choose<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    /// Renders `record` with this corruption applied; every other field keeps its
    /// normal encoding.
    ///
    /// # Errors
    /// Returns [`FixtureError::Timestamp`] when a timestamp cannot be formatted.
    pub fn apply(self, record: &TodoRecord) -> Result<String, FixtureError> {
        let mut fields = record.csv_fields()?;
        match self {
            Self::MissingFields => fields.truncate(MISSING_FIELDS_KEPT),
            Self::InvalidBoolean => {
                fields[TODO_COMPLETED_COLUMN] = INVALID_BOOLEAN_TOKEN.to_string();
            }
            Self::NonNumericPriority => {
                fields[TODO_PRIORITY_COLUMN] = NON_NUMERIC_PRIORITY.to_string();
            }
            Self::MalformedTimestamp => {
                fields[TODO_CREATED_AT_COLUMN] = MALFORMED_TIMESTAMP.to_string();
            }
        }
        Ok(join_row(&fields))
    }
}

/// Corrupted-row budget for an error-injection batch.
///
/// `requested` is `floor(total * ratio)`; `effective` caps it at the number of
/// eligible slots, `total / ERROR_SLOT_PERIOD`.
#[derive(Debug, Clone, Copy, Serialize, Eq, PartialEq)]
pub struct ErrorPlan {
    pub total: usize,
    pub requested: usize,
    pub effective: usize,
}

impl ErrorPlan {
    /// # Errors
    /// Returns [`FixtureError::InvalidRatio`] unless `ratio` is finite and within `0.0..=1.0`.
    pub fn new(total: usize, ratio: f64) -> Result<Self, FixtureError> {
        if !ratio.is_finite() || !(0.0..=1.0).contains(&ratio) {
            return Err(FixtureError::InvalidRatio(ratio));
        }
        let requested = floor_product(total, ratio);
        let capacity = total / ERROR_SLOT_PERIOD;
        Ok(Self { total, requested, effective: requested.min(capacity) })
    }

    #[must_use]
    pub fn is_eligible(slot: usize) -> bool {
        slot % ERROR_SLOT_PERIOD == 0
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn floor_product(total: usize, ratio: f64) -> usize {
    let product = (total as f64 * ratio + RATIO_EPSILON).floor();
    (product as usize).min(total)
}
