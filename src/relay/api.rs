use log::{debug, info, warn};
use reqwest::Client;
use url::Url;

use super::{models::RelayEnvelope, utils};
use crate::error::FeedError;

const NOT_FOUND: &str = "not found";
const EMPTY_PAYLOAD: &str = "empty payload";

/// Downloads the development fixture. Any failure reads as "not found".
pub async fn fetch_local_fixture(client: &Client, url: &Url) -> Result<String, FeedError> {
    debug!("Loading local calendar fixture from {}", url);

    let response = client.get(url.as_str()).send().await.map_err(|e| {
        warn!("Failed to download local fixture. URL: {} Error: {}", url, e);
        FeedError::fetch(NOT_FOUND)
    })?;

    if !response.status().is_success() {
        warn!(
            "Failed to download local fixture. Status code: {} URL: {}",
            response.status(),
            url
        );
        return Err(FeedError::fetch(NOT_FOUND));
    }

    let ics_content = response.bytes().await.map_err(|e| {
        warn!("Failed to read local fixture. URL: {} Error: {}", url, e);
        FeedError::fetch(NOT_FOUND)
    })?;

    let ics_text = std::str::from_utf8(&ics_content)
        .map_err(|e| FeedError::format(format!("fixture is not valid UTF-8: {}", e)))?;

    utils::validate_calendar_text(ics_text)?;
    Ok(ics_text.to_string())
}

/// Fetches `target` through the relay and returns the decoded feed text.
pub async fn fetch_via_relay(
    client: &Client,
    relay: &Url,
    target: &str,
) -> Result<String, FeedError> {
    info!(
        "Fetching calendar via relay {}...",
        relay.host_str().unwrap_or("relay")
    );

    let request_url = utils::relay_request_url(relay, target);
    let response = client
        .get(request_url.as_str())
        .send()
        .await
        .map_err(|e| FeedError::fetch(format!("relay request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FeedError::fetch(status.to_string()));
    }

    let body = response
        .text()
        .await
        .map_err(|e| FeedError::fetch(format!("failed to read relay response: {}", e)))?;

    let contents = extract_contents(&body)?;
    utils::decode_contents(&contents)
}

/// Pulls the `contents` field out of a relay response body.
pub fn extract_contents(body: &str) -> Result<String, FeedError> {
    let envelope: RelayEnvelope = serde_json::from_str(body)
        .map_err(|e| FeedError::fetch(format!("invalid relay response: {}", e)))?;

    debug!("Relay response status: {:?}", envelope.status);

    let http_code = envelope
        .http_code()
        .map(|code| code.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    match envelope.contents {
        Some(contents) if !contents.is_empty() => Ok(contents),
        _ => Err(FeedError::fetch(format!(
            "{}: relay did not return calendar data. Status: {}",
            EMPTY_PAYLOAD, http_code
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedErrorKind;

    #[test]
    fn test_extract_contents() {
        let body = r#"{"contents": "BEGIN:VCALENDAR\r\nEND:VCALENDAR", "status": {"http_code": 200}}"#;
        assert_eq!(
            extract_contents(body).unwrap(),
            "BEGIN:VCALENDAR\r\nEND:VCALENDAR"
        );
    }

    #[test]
    fn test_empty_contents_is_fetch_error() {
        let err = extract_contents(r#"{"contents": ""}"#).unwrap_err();
        assert_eq!(err.kind(), FeedErrorKind::Fetch);
        assert!(err.to_string().contains("empty payload"));
        assert!(err.to_string().contains("unknown"));
    }

    #[test]
    fn test_null_contents_reports_relay_status() {
        let err = extract_contents(r#"{"contents": null, "status": {"http_code": 404}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_non_json_body_is_fetch_error() {
        let err = extract_contents("<html>rate limited</html>").unwrap_err();
        assert_eq!(err.kind(), FeedErrorKind::Fetch);
    }
}
