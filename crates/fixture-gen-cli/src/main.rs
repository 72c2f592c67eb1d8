use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use fixture_gen_core::{
    generate_habits_csv, generate_todos_csv, generate_todos_with_errors_csv, validate_csv_file,
    ErrorPlan, GenerationReport, GeneratorConfig, RecordKind,
};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

const CLI_CONTRACT_VERSION: &str = "fixture-gen.v1";

#[derive(Debug, Parser)]
#[command(name = "fixture-gen")]
#[command(about = "Synthetic Todo / Habit CSV fixture generator")]
struct Cli {
    /// Fixed RNG seed; omit for OS entropy.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// RFC 3339 anchor for every generated timestamp.
    #[arg(long, global = true)]
    base_time: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Todos(GenerateArgs),
    Habits(GenerateArgs),
    TodosWithErrors(ErrorArgs),
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
struct GenerateArgs {
    #[arg(long)]
    out: PathBuf,
    #[arg(long, default_value_t = 100)]
    count: usize,
}

#[derive(Debug, Args)]
struct ErrorArgs {
    #[command(flatten)]
    generate: GenerateArgs,
    #[arg(long, default_value_t = 0.1)]
    error_ratio: f64,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    #[arg(long, value_enum)]
    kind: KindArg,
    #[arg(long)]
    input: PathBuf,
    /// Fail when the header or any row is invalid.
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Todo,
    Habit,
}

impl KindArg {
    fn into_record_kind(self) -> RecordKind {
        match self {
            Self::Todo => RecordKind::Todo,
            Self::Habit => RecordKind::Habit,
        }
    }
}

fn with_contract_version(value: Value) -> Value {
    match value {
        Value::Object(mut object) => {
            object.insert(
                "contract_version".to_string(),
                Value::String(CLI_CONTRACT_VERSION.to_string()),
            );
            Value::Object(object)
        }
        other => serde_json::json!({
            "contract_version": CLI_CONTRACT_VERSION,
            "payload": other
        }),
    }
}

fn emit_json(value: Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&with_contract_version(value))?);
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = build_config(cli.base_time.as_deref(), cli.seed)?;
    match cli.command {
        Command::Todos(args) => run_todos(&args, &config),
        Command::Habits(args) => run_habits(&args, &config),
        Command::TodosWithErrors(args) => run_todos_with_errors(&args, &config),
        Command::Validate(args) => run_validate(&args),
    }
}

fn build_config(base_time: Option<&str>, seed: Option<u64>) -> Result<GeneratorConfig> {
    let base = match base_time {
        Some(raw) => OffsetDateTime::parse(raw, &Rfc3339)
            .with_context(|| format!("invalid RFC3339 base time: {raw}"))?,
        None => GeneratorConfig::default().base_time(),
    };
    GeneratorConfig::new(base, seed).context("failed to build generator config")
}

fn emit_report(report: &GenerationReport, config: &GeneratorConfig, extra: Value) -> Result<()> {
    let mut value = serde_json::to_value(report).context("failed to serialize generation report")?;
    if let (Value::Object(object), Value::Object(extra)) = (&mut value, extra) {
        object.insert("seed".to_string(), serde_json::json!(config.seed()));
        object.extend(extra);
    }
    emit_json(value)
}

fn run_todos(args: &GenerateArgs, config: &GeneratorConfig) -> Result<()> {
    let report = generate_todos_csv(&args.out, args.count, config)
        .with_context(|| format!("failed to generate todos at {}", args.out.display()))?;
    emit_report(&report, config, serde_json::json!({}))
}

fn run_habits(args: &GenerateArgs, config: &GeneratorConfig) -> Result<()> {
    let report = generate_habits_csv(&args.out, args.count, config)
        .with_context(|| format!("failed to generate habits at {}", args.out.display()))?;
    emit_report(&report, config, serde_json::json!({}))
}

fn run_todos_with_errors(args: &ErrorArgs, config: &GeneratorConfig) -> Result<()> {
    let plan = ErrorPlan::new(args.generate.count, args.error_ratio)?;
    let report = generate_todos_with_errors_csv(
        &args.generate.out,
        args.generate.count,
        args.error_ratio,
        config,
    )
    .with_context(|| {
        format!("failed to generate error fixture at {}", args.generate.out.display())
    })?;
    emit_report(
        &report,
        config,
        serde_json::json!({
            "error_ratio": args.error_ratio,
            "requested_errors": plan.requested,
            "effective_errors": plan.effective
        }),
    )
}

fn run_validate(args: &ValidateArgs) -> Result<()> {
    let kind = args.kind.into_record_kind();
    let report = validate_csv_file(kind, &args.input)
        .with_context(|| format!("failed to validate {}", args.input.display()))?;
    let clean = report.header_ok && report.invalid_rows == 0;
    emit_json(serde_json::to_value(&report).context("failed to serialize validation report")?)?;
    if args.strict && !clean {
        return Err(anyhow!(
            "{} has {} invalid rows (header ok: {})",
            args.input.display(),
            report.invalid_rows,
            report.header_ok
        ));
    }
    Ok(())
}
