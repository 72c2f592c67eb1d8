//! Manifest-driven icon downloader.
//!
//! Each manifest entry is resolved against an ordered chain of URL templates;
//! the first response that is an SVG document is written to the output
//! directory. Entries whose destination already holds data are skipped.

use std::path::PathBuf;

mod client;
mod fetcher;
mod manifest;
mod template;

pub use client::{is_svg_payload, AttemptError, HttpClient, UreqClient, DEFAULT_MAX_BODY_BYTES};
pub use fetcher::{EntryOutcome, FetchConfig, FetchSummary, IconFetcher};
pub use manifest::{Manifest, ManifestEntry};
pub use template::{default_templates, render_template, DEFAULT_BASE_URL};

/// Failures that end a run; per-URL problems are [`AttemptError`]s instead.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("manifest not found: {0}")]
    ManifestNotFound(PathBuf),
    #[error("failed to read manifest {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
