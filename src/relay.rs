pub mod api;
pub mod models;
pub mod utils;

use reqwest::Client;
use url::Url;

use crate::error::FeedError;

/// Where the feed text comes from on this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    /// Static fixture served next to the page.
    Local { url: Url },
    /// The real feed, wrapped by the CORS relay.
    Remote { relay: Url, target: String },
}

/// Fetches and normalizes the feed text. A single attempt; no retries.
pub async fn fetch_feed_text(client: &Client, source: &FeedSource) -> Result<String, FeedError> {
    match source {
        FeedSource::Local { url } => api::fetch_local_fixture(client, url).await,
        FeedSource::Remote { relay, target } => api::fetch_via_relay(client, relay, target).await,
    }
}
