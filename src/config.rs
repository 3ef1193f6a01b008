use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::{BoundingBox, SpeciesKey};
use crate::error::HarvestError;

pub const DEFAULT_MAX_PER_SPECIES: usize = 5;
pub const DEFAULT_PAGE_DELAY_MS: u64 = 500;
pub const DEFAULT_SPECIES_DELAY_MS: u64 = 200;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MEDIA_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub dataset_folder: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub species: Vec<SpeciesEntry>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub max_per_species: Option<usize>,
    #[serde(default)]
    pub only_high_quality: Option<bool>,
    #[serde(default)]
    pub page_delay_ms: Option<u64>,
    #[serde(default)]
    pub species_delay_ms: Option<u64>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub media_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SpeciesEntry {
    Shorthand(String),
    Detailed(SpeciesEntryObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SpeciesEntryObject {
    pub genus: String,
    pub species: String,
}

/// Immutable per-run configuration, resolved once at startup. No component
/// reads ambient state after this point.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api_key: String,
    pub dataset_root: Utf8PathBuf,
    pub country: Option<String>,
    pub species: Vec<SpeciesKey>,
    pub area: Option<BoundingBox>,
    pub max_per_species: usize,
    pub only_high_quality: bool,
    pub page_delay: Duration,
    pub species_delay: Duration,
    pub request_timeout: Duration,
    /// Whole-request deadline for one media download; larger than
    /// `request_timeout` because audio bodies dwarf metadata pages.
    pub media_timeout: Duration,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, HarvestError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("xeno-hv.json"),
        };

        if path.is_none() && !config_path.exists() {
            return Err(HarvestError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| HarvestError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| HarvestError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, HarvestError> {
        let api_key = config
            .api_key
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var("XENO_CANTO_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or(HarvestError::MissingApiKey)?;

        let species = config
            .species
            .into_iter()
            .map(|entry| match entry {
                SpeciesEntry::Shorthand(value) => value.parse::<SpeciesKey>(),
                SpeciesEntry::Detailed(obj) => SpeciesKey::new(&obj.genus, &obj.species),
            })
            .collect::<Result<Vec<_>, HarvestError>>()?;

        let area = config
            .area
            .as_deref()
            .map(str::parse::<BoundingBox>)
            .transpose()?;

        if species.is_empty() && area.is_none() {
            return Err(HarvestError::EmptyQuerySet);
        }

        let country = config
            .country
            .map(|value| value.trim().to_lowercase())
            .filter(|value| !value.is_empty());

        Ok(ResolvedConfig {
            api_key: api_key.trim().to_string(),
            dataset_root: Utf8PathBuf::from(
                config
                    .dataset_folder
                    .unwrap_or_else(|| "xeno_canto_dataset".to_string()),
            ),
            country,
            species,
            area,
            max_per_species: config.max_per_species.unwrap_or(DEFAULT_MAX_PER_SPECIES),
            only_high_quality: config.only_high_quality.unwrap_or(false),
            page_delay: Duration::from_millis(
                config.page_delay_ms.unwrap_or(DEFAULT_PAGE_DELAY_MS),
            ),
            species_delay: Duration::from_millis(
                config.species_delay_ms.unwrap_or(DEFAULT_SPECIES_DELAY_MS),
            ),
            request_timeout: Duration::from_secs(
                config
                    .request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            media_timeout: Duration::from_secs(
                config
                    .media_timeout_secs
                    .unwrap_or(DEFAULT_MEDIA_TIMEOUT_SECS),
            ),
        })
    }
}
