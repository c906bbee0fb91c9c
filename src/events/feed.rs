//! The utility's winter peak-offer feed.
//!
//! The feed is a public JSON export of announced peak periods. Responses are
//! cached on disk: a cache younger than the configured TTL is used without
//! touching the network, and a stale cache is the fallback of last resort
//! when a refresh fails.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::PeakEvent;

/// Open-data export of announced residential peak periods, already refined
/// to the relevant rate option.
pub const DEFAULT_FEED_URL: &str = "https://donnees.hydroquebec.com/api/explore/v2.1/catalog/datasets/evenements-pointe/exports/json?lang=fr&refine=secteurclient%3A%22Residentiel%22&refine=offre%3A%22CPC-D%22&timezone=America%2FToronto";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// One entry of the announcement feed. Field names are the feed's own
/// (French); the same shape is written back to the cache file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinterPeakOffer {
    /// Rate option the event applies to.
    #[serde(rename = "offre", default)]
    pub offer: Option<String>,
    /// Start of the peak demand event.
    #[serde(rename = "datedebut")]
    pub start: DateTime<FixedOffset>,
    /// End of the peak demand event.
    #[serde(rename = "datefin")]
    pub end: DateTime<FixedOffset>,
    /// AM or PM.
    #[serde(rename = "plagehoraire", default)]
    pub period: Option<String>,
    /// ISO 8601 duration, e.g. `PT3H`.
    #[serde(rename = "duree", default)]
    pub duration: Option<String>,
    /// Résidentiel or Affaires.
    #[serde(rename = "secteurclient", default)]
    pub sector: Option<String>,
}

/// Failure to obtain peak events from both the feed and the cache.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("peak event feed request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to parse peak event feed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Fetch the list of peak events, consulting the cache first.
///
/// Returns events sorted chronologically, with malformed or overlapping
/// entries dropped, ready for the scheduler.
pub async fn peak_events(
    url: &str,
    cache_file: &Path,
    cache_ttl: Duration,
) -> Result<Vec<PeakEvent>, FeedError> {
    match read_cached(cache_file, cache_ttl) {
        Ok(offers) => return Ok(to_peak_events(offers)),
        Err(err) => debug!("peak event cache not usable: {err:#}"),
    }

    match fetch(url).await {
        Ok(body) => {
            if let Err(err) = write_cache(cache_file, &body) {
                warn!("failed to write peak event cache: {err:#}");
            }
            Ok(to_peak_events(serde_json::from_str(&body)?))
        }
        Err(err) => {
            // Last resort: a stale cache beats no schedule adjustment at all.
            match read_cached(cache_file, Duration::MAX) {
                Ok(offers) => {
                    warn!("peak event feed fetch failed ({err}); using stale cache");
                    Ok(to_peak_events(offers))
                }
                Err(_) => Err(err),
            }
        }
    }
}

async fn fetch(url: &str) -> Result<String, FeedError> {
    let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}

fn read_cached(cache_file: &Path, max_age: Duration) -> anyhow::Result<Vec<WinterPeakOffer>> {
    let modified = fs::metadata(cache_file)
        .and_then(|m| m.modified())
        .with_context(|| format!("no cache at {}", cache_file.display()))?;
    let age = modified.elapsed().unwrap_or_default();
    if age > max_age {
        anyhow::bail!("cache at {} is too old", cache_file.display());
    }
    let body = fs::read_to_string(cache_file)?;
    Ok(serde_json::from_str(&body)?)
}

fn write_cache(cache_file: &Path, body: &str) -> anyhow::Result<()> {
    if let Some(dir) = cache_file.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(cache_file, body)?;
    Ok(())
}

/// Convert feed entries into validated peak events: malformed intervals and
/// events overlapping an earlier one are dropped, the rest sorted by start.
fn to_peak_events(offers: Vec<WinterPeakOffer>) -> Vec<PeakEvent> {
    let mut events: Vec<PeakEvent> = Vec::with_capacity(offers.len());
    for offer in offers {
        if offer.start >= offer.end {
            warn!("skipping invalid peak event: {offer:?}");
            continue;
        }
        events.push(PeakEvent {
            start: offer.start,
            end: offer.end,
        });
    }
    events.sort_by_key(|e| e.start);
    events.dedup_by(|next, prev| {
        if next.start < prev.end {
            warn!("skipping peak event overlapping an earlier one: {next}");
            true
        } else {
            false
        }
    });
    events
}
