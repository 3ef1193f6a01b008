use std::collections::{BTreeSet, HashMap};

use crate::domain::SpeciesKey;
use crate::xeno::Recording;

/// All recordings collected for one species, in first-seen order across
/// pages and queries.
#[derive(Debug, Clone)]
pub struct SpeciesGroup {
    pub key: SpeciesKey,
    pub records: Vec<Recording>,
    pub common_name: Option<String>,
    pub countries: BTreeSet<String>,
}

impl SpeciesGroup {
    fn new(key: SpeciesKey) -> Self {
        Self {
            key,
            records: Vec::new(),
            common_name: None,
            countries: BTreeSet::new(),
        }
    }
}

/// Groups records by normalized species key.
///
/// Records missing genus or species are skipped with a warning. The common
/// name is fixed by the first record that carries one; later conflicting
/// names for the same key are ignored (deliberately lossy). The returned
/// groups are sorted by descending record count, ties by key ascending, so
/// report output is deterministic for identical input.
pub fn aggregate(records: Vec<Recording>) -> Vec<SpeciesGroup> {
    let mut groups: HashMap<SpeciesKey, SpeciesGroup> = HashMap::new();

    for record in records {
        let (Some(genus), Some(species)) = (record.genus.as_deref(), record.species.as_deref())
        else {
            tracing::warn!(
                id = record.id_or_unknown(),
                "recording missing genus/species, skipped"
            );
            continue;
        };
        let Ok(key) = SpeciesKey::new(genus, species) else {
            tracing::warn!(
                id = record.id_or_unknown(),
                "recording has blank genus/species, skipped"
            );
            continue;
        };

        let group = groups
            .entry(key.clone())
            .or_insert_with(|| SpeciesGroup::new(key));
        if group.common_name.is_none() {
            if let Some(name) = record.en.as_deref() {
                if !name.trim().is_empty() {
                    group.common_name = Some(name.trim().to_string());
                }
            }
        }
        if let Some(country) = record.cnt.as_deref() {
            if !country.trim().is_empty() {
                group.countries.insert(country.trim().to_string());
            }
        }
        group.records.push(record);
    }

    let mut groups: Vec<SpeciesGroup> = groups.into_values().collect();
    groups.sort_by(|a, b| {
        b.records
            .len()
            .cmp(&a.records.len())
            .then_with(|| a.key.cmp(&b.key))
    });
    groups
}
