use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Deserializer};

use crate::domain::Query;
use crate::error::HarvestError;

pub const BASE_URL: &str = "https://xeno-canto.org/api/3/recordings";

/// One recording descriptor as returned by the catalog API. Everything is
/// optional at the wire boundary; required-field policy is applied downstream
/// (missing gen/sp skips the record, missing file/file-name skips the
/// download).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Recording {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default, rename = "gen")]
    pub genus: Option<String>,
    #[serde(default, rename = "sp")]
    pub species: Option<String>,
    #[serde(default)]
    pub en: Option<String>,
    #[serde(default)]
    pub cnt: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default, rename = "file-name")]
    pub file_name: Option<String>,
}

impl Recording {
    pub fn id_or_unknown(&self) -> &str {
        self.id.as_deref().unwrap_or("<no id>")
    }
}

/// One page of the paginated recordings endpoint. The declared totals are
/// authoritative only when read from page 1. The live API has served the
/// counters both as JSON numbers and as strings, so both are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordingPage {
    #[serde(
        rename = "numRecordings",
        default,
        deserialize_with = "u64_from_number_or_string"
    )]
    pub num_recordings: u64,
    #[serde(
        rename = "numPages",
        default = "default_num_pages",
        deserialize_with = "u64_from_number_or_string"
    )]
    pub num_pages: u64,
    #[serde(default)]
    pub recordings: Vec<Recording>,
}

fn default_num_pages() -> u64 {
    1
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    Text(String),
}

fn u64_from_number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(value) => Ok(value),
        NumberOrString::Text(value) => value.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrString>::deserialize(deserializer)?;
    Ok(value.map(|value| match value {
        NumberOrString::Number(number) => number.to_string(),
        NumberOrString::Text(text) => text,
    }))
}

pub trait XenoCantoClient: Send + Sync {
    fn fetch_page(&self, query: &Query, page: u64) -> Result<RecordingPage, HarvestError>;
    fn download_file(&self, url: &str, destination: &Path) -> Result<(), HarvestError>;
}

#[derive(Clone)]
pub struct XenoCantoHttpClient {
    client: Client,
    base_url: String,
    api_key: String,
    media_timeout: Duration,
}

impl XenoCantoHttpClient {
    pub fn new(
        api_key: &str,
        timeout: Duration,
        media_timeout: Duration,
    ) -> Result<Self, HarvestError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("xeno-hv/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| HarvestError::XenoHttp(err.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| HarvestError::XenoHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            api_key: api_key.to_string(),
            media_timeout,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }
}

impl XenoCantoClient for XenoCantoHttpClient {
    fn fetch_page(&self, query: &Query, page: u64) -> Result<RecordingPage, HarvestError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("query", query.as_str()),
                ("key", self.api_key.as_str()),
                ("page", &page.to_string()),
            ])
            .send()
            .map_err(|err| HarvestError::XenoHttp(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "xeno-canto request failed".to_string());
            return Err(HarvestError::XenoStatus { status, message });
        }

        response
            .json::<RecordingPage>()
            .map_err(|err| HarvestError::MalformedResponse(err.to_string()))
    }

    fn download_file(&self, url: &str, destination: &Path) -> Result<(), HarvestError> {
        // Media bodies are much larger than metadata pages; the blocking
        // client timeout is a whole-request deadline, so downloads get their
        // own, longer one.
        let mut response = self
            .client
            .get(url)
            .timeout(self.media_timeout)
            .send()
            .map_err(|err| HarvestError::XenoHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "media request failed".to_string());
            return Err(HarvestError::XenoStatus { status, message });
        }

        let parent = destination
            .parent()
            .ok_or_else(|| HarvestError::Filesystem("invalid destination path".to_string()))?;
        fs::create_dir_all(parent).map_err(|err| HarvestError::Filesystem(err.to_string()))?;

        // Stream into a temp file and persist only after the full body is
        // written: an interrupted transfer must never leave a non-empty file
        // at the target path, because presence there is the resume signal.
        let mut temp = tempfile::Builder::new()
            .prefix(".xeno-hv")
            .tempfile_in(parent)
            .map_err(|err| HarvestError::Filesystem(err.to_string()))?;
        io::copy(&mut response, temp.as_file_mut())
            .map_err(|err| HarvestError::XenoHttp(err.to_string()))?;
        temp.persist(destination)
            .map_err(|err| HarvestError::Filesystem(err.to_string()))?;
        Ok(())
    }
}
