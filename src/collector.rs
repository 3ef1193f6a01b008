use std::thread;
use std::time::Duration;

use crate::domain::Query;
use crate::error::HarvestError;
use crate::xeno::{Recording, XenoCantoClient};

/// Everything a query yielded before pagination finished or broke off.
///
/// `partial` is set when a page request failed mid-way; callers decide
/// whether the truncated sequence is still usable. A partial result is never
/// silently reported as an empty one.
#[derive(Debug, Clone)]
pub struct Collected {
    pub records: Vec<Recording>,
    pub total_reported: u64,
    pub partial: bool,
}

impl Collected {
    fn empty() -> Self {
        Self {
            records: Vec::new(),
            total_reported: 0,
            partial: false,
        }
    }
}

/// Drives the catalog client across all pages of one query, in strictly
/// increasing page order, with a mandatory courtesy delay between requests.
pub struct MetadataCollector<'a, C: XenoCantoClient> {
    client: &'a C,
    page_delay: Duration,
}

impl<'a, C: XenoCantoClient> MetadataCollector<'a, C> {
    pub fn new(client: &'a C, page_delay: Duration) -> Self {
        Self { client, page_delay }
    }

    pub fn collect(&self, query: &Query) -> Result<Collected, HarvestError> {
        // Totals are read from page 1 only; later pages are not re-validated.
        let first = self.client.fetch_page(query, 1)?;
        if first.num_recordings == 0 {
            tracing::info!(query = %query, "query returned no recordings");
            return Ok(Collected::empty());
        }

        let total_reported = first.num_recordings;
        let total_pages = first.num_pages.max(1);
        tracing::info!(
            query = %query,
            total_reported,
            total_pages,
            "collecting metadata"
        );

        let mut records = first.recordings;
        for page in 2..=total_pages {
            // Rate-limit courtesy to the remote API. Part of the contract,
            // not an optimization; tests configure it to zero.
            thread::sleep(self.page_delay);
            match self.client.fetch_page(query, page) {
                Ok(result) => {
                    tracing::debug!(page, total_pages, records = result.recordings.len(), "page collected");
                    records.extend(result.recordings);
                }
                Err(err) => {
                    tracing::warn!(
                        query = %query,
                        page,
                        error = %err,
                        "page fetch failed, keeping partial result"
                    );
                    return Ok(Collected {
                        records,
                        total_reported,
                        partial: true,
                    });
                }
            }
        }

        Ok(Collected {
            records,
            total_reported,
            partial: false,
        })
    }
}
