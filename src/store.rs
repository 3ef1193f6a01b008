use std::fs;

use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::SpeciesKey;
use crate::error::HarvestError;

/// On-disk layout of one dataset:
///
/// ```text
/// <dataset_root>/
///   overview_map.html
///   report.csv
///   audios/<Genus_species>/<file-name>
/// ```
///
/// Existence of a file under `audios/` is the sole resumability signal; no
/// separate ledger is kept.
#[derive(Debug, Clone)]
pub struct Store {
    dataset_root: Utf8PathBuf,
}

impl Store {
    pub fn new(dataset_root: Utf8PathBuf) -> Self {
        Self { dataset_root }
    }

    pub fn audio_root(&self) -> Utf8PathBuf {
        self.dataset_root.join("audios")
    }

    pub fn species_dir(&self, key: &SpeciesKey) -> Utf8PathBuf {
        self.audio_root().join(key.folder_name())
    }

    pub fn recording_path(&self, key: &SpeciesKey, file_name: &str) -> Utf8PathBuf {
        self.species_dir(key).join(sanitize_file_name(file_name))
    }

    pub fn report_path(&self) -> Utf8PathBuf {
        self.dataset_root.join("report.csv")
    }

    pub fn map_path(&self) -> Utf8PathBuf {
        self.dataset_root.join("overview_map.html")
    }

    pub fn ensure_layout(&self) -> Result<(), HarvestError> {
        fs::create_dir_all(self.audio_root().as_std_path())
            .map_err(|err| HarvestError::Filesystem(err.to_string()))
    }

    pub fn ensure_species_dir(&self, key: &SpeciesKey) -> Result<(), HarvestError> {
        fs::create_dir_all(self.species_dir(key).as_std_path())
            .map_err(|err| HarvestError::Filesystem(err.to_string()))
    }

    pub fn exists(&self, path: &Utf8Path) -> bool {
        path.as_std_path().exists()
    }
}

/// Keeps catalog-supplied file names from escaping the species directory.
fn sanitize_file_name(name: &str) -> String {
    let cleaned = name.replace(['/', '\\'], "-");
    match cleaned.trim() {
        "" | "." | ".." => "unnamed".to_string(),
        trimmed => trimmed.to_string(),
    }
}
