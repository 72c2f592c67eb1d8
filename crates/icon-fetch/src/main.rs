use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use icon_fetch::{
    default_templates, FetchConfig, FetchError, FetchSummary, IconFetcher, Manifest, UreqClient,
    DEFAULT_BASE_URL,
};
use tracing_subscriber::EnvFilter;

const EXIT_NO_SUCCESS: u8 = 1;
const EXIT_MANIFEST_MISSING: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "icon-fetch")]
#[command(about = "Download SVG icons listed in a JSON manifest")]
struct Cli {
    #[arg(long, default_value = "icons.json")]
    manifest: PathBuf,

    #[arg(long, default_value = "icons")]
    out_dir: PathBuf,

    /// Prefix substituted for `{base}` in every URL template.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Pause between network attempts.
    #[arg(long, default_value_t = 200)]
    delay_ms: u64,

    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(summary) => {
            print_summary(&summary);
            if summary.successes() == 0 {
                ExitCode::from(EXIT_NO_SUCCESS)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            match err.downcast_ref::<FetchError>() {
                Some(FetchError::ManifestNotFound(_)) => ExitCode::from(EXIT_MANIFEST_MISSING),
                _ => ExitCode::from(EXIT_NO_SUCCESS),
            }
        }
    }
}

fn run(cli: &Cli) -> Result<FetchSummary> {
    let manifest = Manifest::load(&cli.manifest)?;
    tracing::info!(entries = manifest.len(), manifest = %cli.manifest.display(), "manifest loaded");

    let client = UreqClient::new(Duration::from_secs(cli.timeout_secs));
    let config = FetchConfig {
        out_dir: cli.out_dir.clone(),
        base_url: cli.base_url.clone(),
        templates: default_templates(),
        delay: Duration::from_millis(cli.delay_ms),
    };
    let summary = IconFetcher::new(client, config).run(&manifest)?;
    Ok(summary)
}

fn print_summary(summary: &FetchSummary) {
    println!("Succeeded {}/{} icons", summary.successes(), summary.total);
    println!("Downloaded: {}", summary.downloaded);
    if summary.skipped > 0 {
        println!("Already present: {}", summary.skipped);
    }
    println!("Missed: {}", summary.missed.len());
    for slug in &summary.missed {
        println!("  {slug}");
    }
}
