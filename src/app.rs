use std::time::Duration;

use serde::Serialize;

use crate::aggregate;
use crate::collector::MetadataCollector;
use crate::config::ResolvedConfig;
use crate::domain::Query;
use crate::download::{DownloadStats, Downloader};
use crate::error::HarvestError;
use crate::overview;
use crate::rank;
use crate::report;
use crate::store::Store;
use crate::xeno::XenoCantoClient;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Collect metadata and write the report, but download no media.
    pub skip_media: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: String,
    pub finished_at: String,
    pub queries: usize,
    pub total_records: usize,
    pub species: usize,
    pub partial: bool,
    #[serde(flatten)]
    pub downloads: DownloadStats,
    pub report_path: Option<String>,
    pub map_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Wires the pipeline together: map render, per-query collection,
/// aggregation, report, then ranked downloads per species.
///
/// Per-query and per-species failures are contained here; the run only
/// terminates early on errors raised before any network activity.
pub struct App<C: XenoCantoClient> {
    store: Store,
    client: C,
    config: ResolvedConfig,
}

impl<C: XenoCantoClient> App<C> {
    pub fn new(store: Store, client: C, config: ResolvedConfig) -> Self {
        Self {
            store,
            client,
            config,
        }
    }

    pub fn run(
        &self,
        options: RunOptions,
        sink: &dyn ProgressSink,
    ) -> Result<RunSummary, HarvestError> {
        let started_at = iso_timestamp();
        self.store.ensure_layout()?;

        // The overview is written before any network activity so a run that
        // later fails still leaves the artifact behind.
        let map_path = self.render_overview(sink);

        let queries = self.build_queries();
        let (records, partial) = self.collect_all(&queries, sink);
        let total_records = records.len();
        let groups = aggregate::aggregate(records);

        sink.event(ProgressEvent {
            message: format!("phase=Report; {} species", groups.len()),
            elapsed: None,
        });
        let report_path = match report::write_report(&self.store.report_path(), &groups) {
            Ok(()) => Some(self.store.report_path().to_string()),
            Err(err) => {
                tracing::warn!(error = %err, "report write failed, continuing");
                None
            }
        };

        let mut downloads = DownloadStats::default();
        if !options.skip_media {
            let downloader =
                Downloader::new(&self.client, &self.store, self.config.species_delay);
            for group in &groups {
                let selection = rank::select(
                    &group.records,
                    self.config.max_per_species,
                    self.config.only_high_quality,
                );
                sink.event(ProgressEvent {
                    message: format!(
                        "phase=Download; {} ({} of {} selected)",
                        group.key.display_name(),
                        selection.len(),
                        group.records.len()
                    ),
                    elapsed: None,
                });
                match downloader.download_species(&group.key, &selection, sink) {
                    Ok(stats) => downloads.merge(stats),
                    Err(err) => {
                        tracing::warn!(
                            species = %group.key,
                            error = %err,
                            "species batch failed, continuing with next species"
                        );
                    }
                }
            }
        }

        Ok(RunSummary {
            started_at,
            finished_at: iso_timestamp(),
            queries: queries.len(),
            total_records,
            species: groups.len(),
            partial,
            downloads,
            report_path,
            map_path,
        })
    }

    fn build_queries(&self) -> Vec<Query> {
        let mut queries: Vec<Query> = self
            .config
            .species
            .iter()
            .map(|key| Query::for_species(key, self.config.country.as_deref()))
            .collect();
        if let Some(area) = &self.config.area {
            queries.push(Query::for_area(area));
        }
        queries
    }

    fn collect_all(
        &self,
        queries: &[Query],
        sink: &dyn ProgressSink,
    ) -> (Vec<crate::xeno::Recording>, bool) {
        let collector = MetadataCollector::new(&self.client, self.config.page_delay);
        let mut records = Vec::new();
        let mut partial = false;

        for query in queries {
            sink.event(ProgressEvent {
                message: format!("phase=Collect; query {query}"),
                elapsed: None,
            });
            match collector.collect(query) {
                Ok(collected) => {
                    partial |= collected.partial;
                    records.extend(collected.records);
                }
                Err(err) => {
                    tracing::warn!(
                        query = %query,
                        error = %err,
                        "query failed, continuing with next query"
                    );
                    partial = true;
                }
            }
        }

        (records, partial)
    }

    fn render_overview(&self, sink: &dyn ProgressSink) -> Option<String> {
        let area = self.config.area.as_ref()?;
        sink.event(ProgressEvent {
            message: format!("phase=Map; rendering area {area}"),
            elapsed: None,
        });
        match overview::render_map(area, &self.store.map_path()) {
            Ok(()) => Some(self.store.map_path().to_string()),
            Err(err) => {
                tracing::warn!(error = %err, "map render failed, continuing");
                None
            }
        }
    }
}

fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
