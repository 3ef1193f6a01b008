use std::thread;
use std::time::Duration;

use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink};
use crate::domain::SpeciesKey;
use crate::error::HarvestError;
use crate::store::Store;
use crate::xeno::{Recording, XenoCantoClient};

/// Result of the at-most-one download attempt for a single recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded,
    SkippedExisting,
    SkippedIncomplete,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DownloadStats {
    pub downloaded: u64,
    pub skipped_existing: u64,
    pub skipped_incomplete: u64,
    pub failed: u64,
}

impl DownloadStats {
    pub fn record(&mut self, outcome: DownloadOutcome) {
        match outcome {
            DownloadOutcome::Downloaded => self.downloaded += 1,
            DownloadOutcome::SkippedExisting => self.skipped_existing += 1,
            DownloadOutcome::SkippedIncomplete => self.skipped_incomplete += 1,
            DownloadOutcome::Failed => self.failed += 1,
        }
    }

    pub fn merge(&mut self, other: DownloadStats) {
        self.downloaded += other.downloaded;
        self.skipped_existing += other.skipped_existing;
        self.skipped_incomplete += other.skipped_incomplete;
        self.failed += other.failed;
    }
}

/// Downloads a ranked selection for one species into its directory.
///
/// Per-file failures are isolated: a bad recording is recorded as `Failed`
/// and the batch continues. Nothing here ever aborts the run.
pub struct Downloader<'a, C: XenoCantoClient> {
    client: &'a C,
    store: &'a Store,
    species_delay: Duration,
}

impl<'a, C: XenoCantoClient> Downloader<'a, C> {
    pub fn new(client: &'a C, store: &'a Store, species_delay: Duration) -> Self {
        Self {
            client,
            store,
            species_delay,
        }
    }

    pub fn download_species(
        &self,
        key: &SpeciesKey,
        selection: &[Recording],
        sink: &dyn ProgressSink,
    ) -> Result<DownloadStats, HarvestError> {
        let mut stats = DownloadStats::default();
        if selection.is_empty() {
            return Ok(stats);
        }
        self.store.ensure_species_dir(key)?;

        for record in selection {
            let outcome = self.download_one(key, record, sink);
            stats.record(outcome);
        }

        sink.event(ProgressEvent {
            message: format!(
                "phase=Download; {} done: {} new, {} present, {} failed",
                key.display_name(),
                stats.downloaded,
                stats.skipped_existing,
                stats.failed
            ),
            elapsed: None,
        });

        // Courtesy pause before the next species, but only when the batch
        // actually touched the network.
        if stats.downloaded > 0 {
            thread::sleep(self.species_delay);
        }
        Ok(stats)
    }

    fn download_one(
        &self,
        key: &SpeciesKey,
        record: &Recording,
        sink: &dyn ProgressSink,
    ) -> DownloadOutcome {
        let url = record.file.as_deref().map(str::trim).filter(|url| !url.is_empty());
        let name = record
            .file_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());
        let (Some(url), Some(name)) = (url, name) else {
            tracing::warn!(
                id = record.id_or_unknown(),
                species = %key,
                "recording has incomplete file metadata, skipped"
            );
            return DownloadOutcome::SkippedIncomplete;
        };

        let destination = self.store.recording_path(key, name);
        if self.store.exists(&destination) {
            tracing::debug!(file = name, species = %key, "already present, skipped");
            return DownloadOutcome::SkippedExisting;
        }

        sink.event(ProgressEvent {
            message: format!("phase=Download; fetching {name}"),
            elapsed: None,
        });
        match self.client.download_file(url, destination.as_std_path()) {
            Ok(()) => {
                tracing::info!(file = name, species = %key, "downloaded");
                DownloadOutcome::Downloaded
            }
            Err(err) => {
                tracing::warn!(
                    id = record.id_or_unknown(),
                    file = name,
                    species = %key,
                    error = %err,
                    "download failed, continuing with next file"
                );
                DownloadOutcome::Failed
            }
        }
    }
}
