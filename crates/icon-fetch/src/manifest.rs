use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::FetchError;

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct ManifestEntry {
    pub slug: String,
    #[serde(alias = "file")]
    pub filename: String,
}

impl ManifestEntry {
    /// Slugs are URL path segments and filenames must stay inside the output
    /// directory.
    ///
    /// # Errors
    /// Returns the reason the entry cannot be fetched.
    pub fn check(&self) -> Result<(), String> {
        if self.slug.is_empty()
            || !self.slug.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
        {
            return Err(format!("slug `{}` must be non-empty [A-Za-z0-9_-]", self.slug));
        }
        if !is_plain_file_name(&self.filename) {
            return Err(format!("filename `{}` must be a single path component", self.filename));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct Manifest {
    #[serde(default)]
    pub icons: Vec<ManifestEntry>,
}

impl Manifest {
    /// Reads a JSON manifest. Entries are checked one by one at fetch time.
    ///
    /// # Errors
    /// Returns [`FetchError::ManifestNotFound`] when `path` does not exist, and
    /// the read / parse errors otherwise.
    pub fn load(path: &Path) -> Result<Self, FetchError> {
        let body = fs::read_to_string(path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                FetchError::ManifestNotFound(path.to_path_buf())
            } else {
                FetchError::ManifestRead { path: path.to_path_buf(), source }
            }
        })?;
        serde_json::from_str(&body)
            .map_err(|source| FetchError::ManifestParse { path: path.to_path_buf(), source })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.icons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
}
