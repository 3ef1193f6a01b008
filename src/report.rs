use camino::Utf8Path;
use serde::Serialize;

use crate::aggregate::SpeciesGroup;
use crate::error::HarvestError;

#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub species: String,
    pub common_name: String,
    pub recordings: usize,
    pub countries: String,
}

/// One row per species, in the order the aggregator produced (record count
/// descending). Countries are already sorted by the aggregation set.
pub fn rows(groups: &[SpeciesGroup]) -> Vec<ReportRow> {
    groups
        .iter()
        .map(|group| ReportRow {
            species: group.key.display_name(),
            common_name: group
                .common_name
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            recordings: group.records.len(),
            countries: group
                .countries
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect()
}

pub fn write_report(path: &Utf8Path, groups: &[SpeciesGroup]) -> Result<(), HarvestError> {
    let mut writer = csv::Writer::from_path(path.as_std_path())
        .map_err(|err| HarvestError::Report(err.to_string()))?;
    for row in rows(groups) {
        writer
            .serialize(row)
            .map_err(|err| HarvestError::Report(err.to_string()))?;
    }
    writer
        .flush()
        .map_err(|err| HarvestError::Report(err.to_string()))
}
