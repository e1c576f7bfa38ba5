//! YAML loading for human-curated seed data.
//!
//! Canonical manufacturer names and their known aliases live in
//! `catalog/manufacturers/*.yaml`, each file holding a list of entries:
//!
//! ```yaml
//! - name: Gateron
//!   aliases: ["Gateron Optoelectronic", "GTR"]
//! - name: Cherry
//!   aliases: ["Cherry MX", "ZF Electronics"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum YamlError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("YAML parse error in {path}: {source}")]
    Parse {
        path: String,
        source: serde_yml::Error,
    },
    #[error("Not a directory: {0}")]
    NotADirectory(String),
}

/// A curated manufacturer entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManufacturerSeed {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Load every manufacturer seed from the YAML files in `dir`, in file name order.
///
/// A missing directory yields an empty list.
pub fn load_manufacturers(dir: &Path) -> Result<Vec<ManufacturerSeed>, YamlError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    if !dir.is_dir() {
        return Err(YamlError::NotADirectory(dir.display().to_string()));
    }

    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .map_err(|e| YamlError::Io {
            path: dir.display().to_string(),
            source: e,
        })?
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml")
        })
        .collect();
    entries.sort_by_key(|e| e.file_name());

    let mut all = Vec::new();
    for entry in entries {
        let path = entry.path();
        let contents = std::fs::read_to_string(&path).map_err(|e| YamlError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let seeds: Vec<ManufacturerSeed> =
            serde_yml::from_str(&contents).map_err(|e| YamlError::Parse {
                path: path.display().to_string(),
                source: e,
            })?;
        all.extend(seeds);
    }

    Ok(all)
}

/// Default location of the manufacturer seed files, relative to a catalog root.
pub fn manufacturers_dir(catalog_dir: &Path) -> std::path::PathBuf {
    catalog_dir.join("manufacturers")
}
