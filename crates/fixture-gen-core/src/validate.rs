use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::csv::split_row;
use crate::record::{Period, PRIORITY_RANGE, TARGET_RANGE};
use crate::{FixtureError, RecordKind};

const MAX_REPORTED_ROWS: usize = 20;

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum RowViolation {
    #[error("unterminated quoted field")]
    Unparseable,
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("required field `{field}` is empty")]
    MissingValue { field: &'static str },
    #[error("`{field}` is not a boolean token: `{value}`")]
    InvalidBoolean { field: &'static str, value: String },
    #[error("`{field}` is not an integer: `{value}`")]
    InvalidInteger { field: &'static str, value: String },
    #[error("`{field}` value {value} is out of range")]
    OutOfRange { field: &'static str, value: i64 },
    #[error("`{field}` is not an ISO-8601 UTC timestamp: `{value}`")]
    InvalidTimestamp { field: &'static str, value: String },
    #[error("`{field}` has unknown value `{value}`")]
    InvalidEnum { field: &'static str, value: String },
    #[error("updatedAt precedes createdAt")]
    TimestampOrder,
}

impl RowViolation {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unparseable => "unparseable",
            Self::FieldCount { .. } => "field_count",
            Self::MissingValue { .. } => "missing_value",
            Self::InvalidBoolean { .. } => "invalid_boolean",
            Self::InvalidInteger { .. } => "invalid_integer",
            Self::OutOfRange { .. } => "out_of_range",
            Self::InvalidTimestamp { .. } => "invalid_timestamp",
            Self::InvalidEnum { .. } => "invalid_enum",
            Self::TimestampOrder => "timestamp_order",
        }
    }
}

#[derive(Debug, Clone, Serialize, Eq, PartialEq)]
pub struct InvalidRow {
    pub line: usize,
    pub id: String,
    pub violations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Eq, PartialEq)]
pub struct ValidationReport {
    pub kind: RecordKind,
    pub header_ok: bool,
    pub rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub violations: BTreeMap<String, usize>,
    pub first_invalid: Vec<InvalidRow>,
}

/// Collects every violation in a row rather than stopping at the first one.
struct RowChecker {
    violations: Vec<RowViolation>,
}

impl RowChecker {
    fn new() -> Self {
        Self { violations: Vec::new() }
    }

    fn required(&mut self, field: &'static str, value: &str) {
        if value.is_empty() {
            self.violations.push(RowViolation::MissingValue { field });
        }
    }

    fn boolean(&mut self, field: &'static str, value: &str) {
        if value != "true" && value != "false" {
            self.violations.push(RowViolation::InvalidBoolean { field, value: value.to_string() });
        }
    }

    fn integer_in(&mut self, field: &'static str, value: &str, min: i64, max: i64) {
        match value.parse::<i64>() {
            Ok(parsed) if (min..=max).contains(&parsed) => {}
            Ok(parsed) => self.violations.push(RowViolation::OutOfRange { field, value: parsed }),
            Err(_) => self
                .violations
                .push(RowViolation::InvalidInteger { field, value: value.to_string() }),
        }
    }

    fn timestamp(&mut self, field: &'static str, value: &str) -> Option<OffsetDateTime> {
        if value.is_empty() {
            self.violations.push(RowViolation::MissingValue { field });
            return None;
        }
        let parsed = OffsetDateTime::parse(value, &Rfc3339)
            .ok()
            .filter(|parsed| value.ends_with('Z') && parsed.nanosecond() == 0);
        if parsed.is_none() {
            self.violations
                .push(RowViolation::InvalidTimestamp { field, value: value.to_string() });
        }
        parsed
    }

    fn optional_timestamp(&mut self, field: &'static str, value: &str) {
        if !value.is_empty() {
            self.timestamp(field, value);
        }
    }

    fn ordered(&mut self, created_at: Option<OffsetDateTime>, updated_at: Option<OffsetDateTime>) {
        if let (Some(created_at), Some(updated_at)) = (created_at, updated_at) {
            if updated_at < created_at {
                self.violations.push(RowViolation::TimestampOrder);
            }
        }
    }

    fn finish(self) -> Result<(), Vec<RowViolation>> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(self.violations)
        }
    }
}

fn split_exact(line: &str, expected: usize) -> Result<Vec<String>, Vec<RowViolation>> {
    let fields = split_row(line).ok_or_else(|| vec![RowViolation::Unparseable])?;
    if fields.len() != expected {
        return Err(vec![RowViolation::FieldCount { expected, found: fields.len() }]);
    }
    Ok(fields)
}

/// Checks one todo data row against the full todo schema.
///
/// # Errors
/// Returns every violation found. A wrong field count is reported alone since
/// column positions are then meaningless.
pub fn validate_todo_row(line: &str) -> Result<(), Vec<RowViolation>> {
    let fields = split_exact(line, RecordKind::Todo.field_count())?;
    let mut checker = RowChecker::new();
    checker.required("id", &fields[0]);
    checker.required("title", &fields[1]);
    checker.boolean("completed", &fields[3]);
    checker.integer_in(
        "priority",
        &fields[4],
        i64::from(*PRIORITY_RANGE.start()),
        i64::from(*PRIORITY_RANGE.end()),
    );
    checker.optional_timestamp("dueAt", &fields[5]);
    let created_at = checker.timestamp("createdAt", &fields[6]);
    let updated_at = checker.timestamp("updatedAt", &fields[7]);
    checker.ordered(created_at, updated_at);
    checker.finish()
}

/// Checks one habit data row against the full habit schema.
///
/// # Errors
/// Returns every violation found, or only the field-count mismatch.
pub fn validate_habit_row(line: &str) -> Result<(), Vec<RowViolation>> {
    let fields = split_exact(line, RecordKind::Habit.field_count())?;
    let mut checker = RowChecker::new();
    checker.required("id", &fields[0]);
    checker.required("title", &fields[1]);
    if Period::parse(&fields[3]).is_none() {
        checker
            .violations
            .push(RowViolation::InvalidEnum { field: "period", value: fields[3].clone() });
    }
    checker.integer_in(
        "target",
        &fields[4],
        i64::from(*TARGET_RANGE.start()),
        i64::from(*TARGET_RANGE.end()),
    );
    if !is_hex_color(&fields[5]) {
        checker
            .violations
            .push(RowViolation::InvalidEnum { field: "color", value: fields[5].clone() });
    }
    let created_at = checker.timestamp("createdAt", &fields[7]);
    let updated_at = checker.timestamp("updatedAt", &fields[8]);
    checker.ordered(created_at, updated_at);
    checker.finish()
}

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|ch| ch.is_ascii_hexdigit()))
}

/// # Errors
/// Returns the row's violations.
pub fn validate_row(kind: RecordKind, line: &str) -> Result<(), Vec<RowViolation>> {
    match kind {
        RecordKind::Todo => validate_todo_row(line),
        RecordKind::Habit => validate_habit_row(line),
    }
}

/// Validates a whole fixture: the first line must be the header of `kind`, every
/// later non-blank line is a data row.
///
/// # Errors
/// Returns [`FixtureError::Io`] when the reader fails.
pub fn validate_csv<R: BufRead>(
    kind: RecordKind,
    reader: R,
) -> Result<ValidationReport, FixtureError> {
    let mut report = ValidationReport {
        kind,
        header_ok: false,
        rows: 0,
        valid_rows: 0,
        invalid_rows: 0,
        violations: BTreeMap::new(),
        first_invalid: Vec::new(),
    };

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if index == 0 {
            report.header_ok = line.trim_end() == kind.header();
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        report.rows += 1;
        match validate_row(kind, &line) {
            Ok(()) => report.valid_rows += 1,
            Err(violations) => {
                report.invalid_rows += 1;
                for violation in &violations {
                    *report.violations.entry(violation.kind().to_string()).or_default() += 1;
                }
                if report.first_invalid.len() < MAX_REPORTED_ROWS {
                    report.first_invalid.push(InvalidRow {
                        line: index + 1,
                        id: split_row(&line)
                            .and_then(|fields| fields.into_iter().next())
                            .unwrap_or_default(),
                        violations: violations.iter().map(ToString::to_string).collect(),
                    });
                }
            }
        }
    }

    tracing::debug!(
        kind = kind.as_str(),
        rows = report.rows,
        invalid_rows = report.invalid_rows,
        "fixture validated"
    );
    Ok(report)
}

/// # Errors
/// Returns [`FixtureError::Open`] when `path` cannot be opened, or a read failure.
pub fn validate_csv_file(kind: RecordKind, path: &Path) -> Result<ValidationReport, FixtureError> {
    let file =
        File::open(path).map_err(|source| FixtureError::Open { path: path.to_path_buf(), source })?;
    validate_csv(kind, BufReader::new(file))
}
