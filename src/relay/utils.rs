use base64::{Engine, engine::general_purpose::STANDARD};
use log::debug;
use url::Url;
use urlencoding::{decode_binary, encode};

use crate::error::FeedError;

/// Literal that opens every iCalendar document.
pub const CALENDAR_START_MARKER: &str = "BEGIN:VCALENDAR";

/// Builds `<relay>?url=<target>` with the target percent-encoded.
pub fn relay_request_url(relay: &Url, target: &str) -> Url {
    let mut url = relay.clone();
    url.set_query(Some(&format!("url={}", encode(target))));
    url
}

/// Normalizes the relay's `contents` field to feed text.
///
/// Data URLs are unwrapped (base64 or percent-encoded); anything else is taken
/// as already-decoded text. The result must look like a calendar document.
pub fn decode_contents(contents: &str) -> Result<String, FeedError> {
    let text = if contents.starts_with("data:") {
        debug!("Decoding data URL calendar payload...");
        decode_data_url(contents)?
    } else {
        debug!("Using plain text calendar payload...");
        contents.to_string()
    };
    let text = match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    };

    validate_calendar_text(&text)?;
    Ok(text)
}

/// The only content check made before parsing.
pub fn validate_calendar_text(text: &str) -> Result<(), FeedError> {
    if !text.contains(CALENDAR_START_MARKER) {
        return Err(FeedError::format(format!(
            "missing {} marker",
            CALENDAR_START_MARKER
        )));
    }
    Ok(())
}

fn decode_data_url(data_url: &str) -> Result<String, FeedError> {
    let (header, payload) = data_url
        .split_once(',')
        .ok_or_else(|| FeedError::format("data URL has no payload separator"))?;

    let bytes = if header.ends_with(";base64") {
        STANDARD
            .decode(payload.trim())
            .map_err(|e| FeedError::format(format!("invalid base64 payload: {}", e)))?
    } else {
        decode_binary(payload.as_bytes()).into_owned()
    };

    String::from_utf8(bytes)
        .map_err(|e| FeedError::format(format!("payload is not valid UTF-8: {}", e)))
}
