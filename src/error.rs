use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum HarvestError {
    #[error("invalid species entry: {0}")]
    InvalidSpecies(String),

    #[error("invalid bounding box (expected lat_min,lon_min,lat_max,lon_max): {0}")]
    InvalidBoundingBox(String),

    #[error("missing config file xeno-hv.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("missing API key: set \"api_key\" in the config or the XENO_CANTO_API_KEY env var")]
    MissingApiKey,

    #[error("config selects nothing to harvest: add a species list or an area box")]
    EmptyQuerySet,

    #[error("xeno-canto request failed: {0}")]
    XenoHttp(String),

    #[error("xeno-canto returned status {status}: {message}")]
    XenoStatus { status: u16, message: String },

    #[error("malformed API response: {0}")]
    MalformedResponse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to write report: {0}")]
    Report(String),
}
