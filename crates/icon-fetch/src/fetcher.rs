use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::client::{is_svg_payload, HttpClient};
use crate::manifest::{Manifest, ManifestEntry};
use crate::template::{default_templates, render_template, DEFAULT_BASE_URL};
use crate::FetchError;

pub const DEFAULT_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub out_dir: PathBuf,
    pub base_url: String,
    pub templates: Vec<String>,
    /// Pause before every network attempt except the first of the run.
    pub delay: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("icons"),
            base_url: DEFAULT_BASE_URL.to_string(),
            templates: default_templates(),
            delay: DEFAULT_DELAY,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryOutcome {
    Downloaded { url: String, bytes: usize },
    Skipped,
    Missed { attempts: usize },
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct FetchSummary {
    pub total: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub missed: Vec<String>,
}

impl FetchSummary {
    /// Downloaded plus already-present entries.
    #[must_use]
    pub fn successes(&self) -> usize {
        self.downloaded + self.skipped
    }

    fn record(&mut self, entry: &ManifestEntry, outcome: &EntryOutcome) {
        self.total += 1;
        match outcome {
            EntryOutcome::Downloaded { .. } => self.downloaded += 1,
            EntryOutcome::Skipped => self.skipped += 1,
            EntryOutcome::Missed { .. } => self.missed.push(entry.slug.clone()),
        }
    }
}

struct Pacer {
    delay: Duration,
    started: bool,
}

impl Pacer {
    fn wait(&mut self) {
        if self.started && !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.started = true;
    }
}

pub struct IconFetcher<C> {
    client: C,
    config: FetchConfig,
}

impl<C: HttpClient> IconFetcher<C> {
    pub fn new(client: C, config: FetchConfig) -> Self {
        Self { client, config }
    }

    /// Resolves every manifest entry in order.
    ///
    /// # Errors
    /// Returns [`FetchError::Io`] when the output directory or a destination file
    /// cannot be written. Rejected or unresolvable entries are misses, not errors.
    pub fn run(&self, manifest: &Manifest) -> Result<FetchSummary, FetchError> {
        fs::create_dir_all(&self.config.out_dir)
            .map_err(|source| FetchError::Io { path: self.config.out_dir.clone(), source })?;

        let mut pacer = Pacer { delay: self.config.delay, started: false };
        let mut summary = FetchSummary::default();
        for entry in &manifest.icons {
            let outcome = self.fetch_entry(entry, &mut pacer)?;
            summary.record(entry, &outcome);
        }

        tracing::info!(
            total = summary.total,
            downloaded = summary.downloaded,
            skipped = summary.skipped,
            missed = summary.missed.len(),
            "icon fetch finished"
        );
        Ok(summary)
    }

    fn fetch_entry(
        &self,
        entry: &ManifestEntry,
        pacer: &mut Pacer,
    ) -> Result<EntryOutcome, FetchError> {
        if let Err(reason) = entry.check() {
            tracing::warn!(slug = %entry.slug, filename = %entry.filename, %reason, "entry rejected");
            return Ok(EntryOutcome::Missed { attempts: 0 });
        }
        let destination = self.config.out_dir.join(&entry.filename);
        if has_content(&destination) {
            tracing::debug!(slug = %entry.slug, path = %destination.display(), "already present");
            return Ok(EntryOutcome::Skipped);
        }

        for template in &self.config.templates {
            let url = render_template(template, &self.config.base_url, &entry.slug);
            pacer.wait();
            match self.client.get(&url) {
                Ok(body) if is_svg_payload(&body) => {
                    fs::write(&destination, &body)
                        .map_err(|source| FetchError::Io { path: destination.clone(), source })?;
                    tracing::info!(slug = %entry.slug, %url, bytes = body.len(), "downloaded");
                    return Ok(EntryOutcome::Downloaded { url, bytes: body.len() });
                }
                Ok(_) => tracing::debug!(slug = %entry.slug, %url, "response is not an SVG"),
                Err(err) => tracing::debug!(slug = %entry.slug, %url, error = %err, "attempt failed"),
            }
        }

        tracing::warn!(slug = %entry.slug, "no template produced an SVG");
        Ok(EntryOutcome::Missed { attempts: self.config.templates.len() })
    }
}

fn has_content(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|metadata| metadata.is_file() && metadata.len() > 0)
}
