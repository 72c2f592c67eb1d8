use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::corruption::{Corruption, ErrorPlan};
use crate::record::{HabitRecord, TodoRecord};
use crate::{FixtureError, GeneratorConfig, RecordKind};

/// Summary of one generated fixture.
#[derive(Debug, Clone, Serialize, Eq, PartialEq)]
pub struct GenerationReport {
    pub kind: RecordKind,
    pub path: Option<PathBuf>,
    pub rows: usize,
    pub corrupted_rows: usize,
    pub corruption_counts: BTreeMap<String, usize>,
}

impl GenerationReport {
    fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            path: None,
            rows: 0,
            corrupted_rows: 0,
            corruption_counts: BTreeMap::new(),
        }
    }

    fn record_corruption(&mut self, corruption: Corruption) {
        self.corrupted_rows += 1;
        *self.corruption_counts.entry(corruption.as_str().to_string()).or_default() += 1;
    }
}

fn sequence(slot: usize) -> u64 {
    u64::try_from(slot).unwrap_or(u64::MAX)
}

fn write_line<W: Write>(out: &mut W, line: &str) -> Result<(), FixtureError> {
    out.write_all(line.as_bytes())?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Writes the todo header followed by `count` todo rows.
///
/// # Errors
/// Returns [`FixtureError`] when writing fails or a timestamp overflows.
pub fn write_todos<W: Write>(
    out: &mut W,
    count: usize,
    config: &GeneratorConfig,
) -> Result<GenerationReport, FixtureError> {
    let mut rng = config.rng();
    let mut report = GenerationReport::new(RecordKind::Todo);
    write_line(out, RecordKind::Todo.header())?;
    for slot in 1..=count {
        let record = TodoRecord::build(sequence(slot), config.base_time(), &mut rng)?;
        write_line(out, &record.to_csv_row()?)?;
        report.rows += 1;
    }
    Ok(report)
}

/// Writes the habit header followed by `count` habit rows.
///
/// # Errors
/// Returns [`FixtureError`] when writing fails or a timestamp overflows.
pub fn write_habits<W: Write>(
    out: &mut W,
    count: usize,
    config: &GeneratorConfig,
) -> Result<GenerationReport, FixtureError> {
    let mut rng = config.rng();
    let mut report = GenerationReport::new(RecordKind::Habit);
    write_line(out, RecordKind::Habit.header())?;
    for slot in 1..=count {
        let record = HabitRecord::build(sequence(slot), config.base_time(), &mut rng)?;
        write_line(out, &record.to_csv_row()?)?;
        report.rows += 1;
    }
    Ok(report)
}

/// Writes `total` todo rows where eligible slots carry corrupted rows until the
/// [`ErrorPlan`] budget is spent.
///
/// # Errors
/// Returns [`FixtureError::InvalidRatio`] for a ratio outside `0.0..=1.0`, or any
/// write / timestamp failure.
pub fn write_todos_with_errors<W: Write>(
    out: &mut W,
    total: usize,
    error_ratio: f64,
    config: &GeneratorConfig,
) -> Result<GenerationReport, FixtureError> {
    let plan = ErrorPlan::new(total, error_ratio)?;
    let mut rng = config.rng();
    let mut report = GenerationReport::new(RecordKind::Todo);
    let mut budget = plan.effective;

    write_line(out, RecordKind::Todo.header())?;
    for slot in 1..=total {
        let record = TodoRecord::build(sequence(slot), config.base_time(), &mut rng)?;
        if budget > 0 && ErrorPlan::is_eligible(slot) {
            let corruption = Corruption::choose(&mut rng);
            write_line(out, &corruption.apply(&record)?)?;
            report.record_corruption(corruption);
            budget -= 1;
        } else {
            write_line(out, &record.to_csv_row()?)?;
        }
        report.rows += 1;
    }

    if plan.effective < plan.requested {
        tracing::warn!(
            requested = plan.requested,
            effective = plan.effective,
            "error budget exceeds eligible slots; corrupted rows capped"
        );
    }
    Ok(report)
}

fn write_file<F>(path: &Path, write: F) -> Result<GenerationReport, FixtureError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<GenerationReport, FixtureError>,
{
    let file = File::create(path)
        .map_err(|source| FixtureError::Open { path: path.to_path_buf(), source })?;
    let mut writer = BufWriter::new(file);
    let mut report = write(&mut writer)?;
    writer.flush()?;
    report.path = Some(path.to_path_buf());
    tracing::info!(
        path = %path.display(),
        kind = report.kind.as_str(),
        rows = report.rows,
        corrupted_rows = report.corrupted_rows,
        "fixture written"
    );
    Ok(report)
}

/// # Errors
/// Returns [`FixtureError::Open`] when `path` cannot be created, or any write failure.
pub fn generate_todos_csv(
    path: &Path,
    count: usize,
    config: &GeneratorConfig,
) -> Result<GenerationReport, FixtureError> {
    write_file(path, |out| write_todos(out, count, config))
}

/// # Errors
/// Returns [`FixtureError::Open`] when `path` cannot be created, or any write failure.
pub fn generate_habits_csv(
    path: &Path,
    count: usize,
    config: &GeneratorConfig,
) -> Result<GenerationReport, FixtureError> {
    write_file(path, |out| write_habits(out, count, config))
}

/// # Errors
/// Returns [`FixtureError::InvalidRatio`], [`FixtureError::Open`], or any write failure.
pub fn generate_todos_with_errors_csv(
    path: &Path,
    total: usize,
    error_ratio: f64,
    config: &GeneratorConfig,
) -> Result<GenerationReport, FixtureError> {
    ErrorPlan::new(total, error_ratio)?;
    write_file(path, |out| write_todos_with_errors(out, total, error_ratio, config))
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use proptest::prelude::*;
    use time::format_description::well_known::Rfc3339;
    use time::OffsetDateTime;

    use super::*;
    use crate::csv::split_row;
    use crate::validate::validate_todo_row;

    fn seeded(seed: u64) -> GeneratorConfig {
        GeneratorConfig::default().with_seed(seed)
    }

    fn render<F>(write: F) -> (GenerationReport, Vec<String>)
    where
        F: FnOnce(&mut Vec<u8>) -> Result<GenerationReport, FixtureError>,
    {
        let mut buffer = Vec::new();
        let report = write(&mut buffer).unwrap_or_else(|err| panic!("generation failed: {err}"));
        let text = String::from_utf8(buffer).unwrap_or_else(|err| panic!("not UTF-8: {err}"));
        (report, text.lines().map(str::to_string).collect())
    }

    fn fields(line: &str) -> Vec<String> {
        split_row(line).unwrap_or_else(|| panic!("row should split: {line}"))
    }

    fn parse(value: &str) -> OffsetDateTime {
        OffsetDateTime::parse(value, &Rfc3339)
            .unwrap_or_else(|err| panic!("invalid timestamp {value}: {err}"))
    }

    fn unique_temp_dir(prefix: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_else(|err| panic!("clock should be >= UNIX_EPOCH: {err}"))
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("{prefix}-{now}"));
        std::fs::create_dir_all(&dir)
            .unwrap_or_else(|err| panic!("failed to create temp dir {}: {err}", dir.display()));
        dir
    }

    #[test]
    fn todo_file_has_header_plus_requested_rows() {
        let dir = unique_temp_dir("fixture-gen-todos");
        let path = dir.join("todos.csv");
        let report = generate_todos_csv(&path, 100, &GeneratorConfig::default())
            .unwrap_or_else(|err| panic!("generation failed: {err}"));
        assert_eq!(report.rows, 100);
        assert_eq!(report.path.as_deref(), Some(path.as_path()));

        let body = std::fs::read_to_string(&path)
            .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()));
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 101);
        assert_eq!(lines[0], crate::TODO_HEADER);

        let third = fields(lines[3]);
        assert_eq!(third[0], "todo-000003");
        assert_eq!(third[2], "");
        let fourth = fields(lines[4]);
        assert_eq!(fourth[0], "todo-000004");
        assert_eq!(fourth[3], "true");

        std::fs::remove_dir_all(&dir).unwrap_or_else(|err| panic!("cleanup failed: {err}"));
    }

    #[test]
    fn open_failure_is_reported_with_the_path() {
        let dir = unique_temp_dir("fixture-gen-missing");
        let path = dir.join("no-such-dir").join("todos.csv");
        let err = generate_todos_csv(&path, 1, &GeneratorConfig::default())
            .err()
            .unwrap_or_else(|| panic!("expected open failure"));
        assert!(matches!(err, FixtureError::Open { path: ref failed, .. } if failed == &path));
        std::fs::remove_dir_all(&dir).unwrap_or_else(|err| panic!("cleanup failed: {err}"));
    }

    #[test]
    fn habit_rows_have_nine_fields() {
        let (report, lines) = render(|out| write_habits(out, 25, &seeded(1)));
        assert_eq!(report.kind, RecordKind::Habit);
        assert_eq!(lines.len(), 26);
        assert_eq!(lines[0], crate::HABIT_HEADER);
        for line in &lines[1..] {
            assert_eq!(fields(line).len(), 9, "bad habit row: {line}");
        }
    }

    #[test]
    fn structural_fields_are_identical_across_unseeded_runs() {
        let structural = |lines: &[String]| {
            lines
                .iter()
                .skip(1)
                .map(|line| {
                    let row = fields(line);
                    (row[0].clone(), row[1].clone(), row[2].is_empty(), row[3].clone())
                })
                .collect::<Vec<_>>()
        };
        let (_, first) = render(|out| write_todos(out, 50, &GeneratorConfig::default()));
        let (_, second) = render(|out| write_todos(out, 50, &GeneratorConfig::default()));
        assert_eq!(structural(&first), structural(&second));
    }

    #[test]
    fn seeded_runs_are_byte_identical() {
        let (_, first) = render(|out| write_todos_with_errors(out, 200, 0.1, &seeded(42)));
        let (_, second) = render(|out| write_todos_with_errors(out, 200, 0.1, &seeded(42)));
        assert_eq!(first, second);
    }

    #[test]
    fn error_mode_corrupts_exactly_the_budget() {
        let (report, lines) = render(|out| write_todos_with_errors(out, 100, 0.1, &seeded(9)));
        assert_eq!(report.rows, 100);
        assert_eq!(report.corrupted_rows, 10);
        assert_eq!(report.corruption_counts.values().sum::<usize>(), 10);
        assert_eq!(lines.len(), 101);

        let mut invalid_slots = Vec::new();
        for (index, line) in lines.iter().enumerate().skip(1) {
            match validate_todo_row(line) {
                Ok(()) => {}
                Err(violations) => {
                    assert_eq!(violations.len(), 1, "row {index} broke more than one rule: {line}");
                    invalid_slots.push(index);
                }
            }
        }
        assert_eq!(invalid_slots, (1..=10).map(|n| n * 5).collect::<Vec<_>>());
    }

    #[test]
    fn error_mode_rejects_bad_ratio_before_touching_disk() {
        let dir = unique_temp_dir("fixture-gen-ratio");
        let path = dir.join("errors.csv");
        let err = generate_todos_with_errors_csv(&path, 10, 2.0, &GeneratorConfig::default())
            .err()
            .unwrap_or_else(|| panic!("expected invalid ratio"));
        assert!(matches!(err, FixtureError::InvalidRatio(_)));
        assert!(!path.exists());
        std::fs::remove_dir_all(&dir).unwrap_or_else(|err| panic!("cleanup failed: {err}"));
    }

    proptest! {
        #[test]
        fn property_todo_rows_match_count_and_ordering(count in 0usize..300, seed in any::<u64>()) {
            let (report, lines) = render(|out| write_todos(out, count, &seeded(seed)));
            prop_assert_eq!(report.rows, count);
            prop_assert_eq!(lines.len(), count + 1);
            for line in lines.iter().skip(1) {
                let row = fields(line);
                prop_assert_eq!(row.len(), 8);
                prop_assert!(parse(&row[7]) >= parse(&row[6]));
            }
        }

        #[test]
        fn property_clean_rows_in_error_mode_validate(total in 0usize..400, percent in 0u32..=30, seed in any::<u64>()) {
            let ratio = f64::from(percent) / 100.0;
            let (report, lines) = render(|out| write_todos_with_errors(out, total, ratio, &seeded(seed)));
            let plan = ErrorPlan::new(total, ratio).unwrap_or_else(|err| panic!("{err}"));
            prop_assert_eq!(report.corrupted_rows, plan.effective);

            let invalid = lines
                .iter()
                .skip(1)
                .filter(|line| validate_todo_row(line).is_err())
                .count();
            prop_assert_eq!(invalid, plan.effective);
        }
    }
}
