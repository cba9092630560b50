use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{debug, info};
use reqwest::Client;

pub mod calendar;
pub mod config;
pub mod error;
pub mod ics_parser;
pub mod relay;
pub mod render;
pub mod site;
pub mod subscribe;

pub use calendar::{CalendarEvent, CalendarFeedMetadata, LoadedCalendar};
pub use error::{FeedError, FeedErrorKind};
pub use relay::FeedSource;

/// Runs the whole feed pipeline once: fetch, decode, parse, then keep the
/// events starting on or after the day of `now`.
pub async fn load_calendar(
    client: &Client,
    source: &FeedSource,
    now: DateTime<Utc>,
    configured_tz: Option<Tz>,
) -> Result<LoadedCalendar, FeedError> {
    debug!("Starting calendar load from {:?}...", source);

    let ics_text = relay::fetch_feed_text(client, source).await?;
    info!(
        "Calendar contains {} events",
        ics_text.matches("BEGIN:VEVENT").count()
    );

    process_feed_text(&ics_text, now, configured_tz)
}

/// Validates, parses and filters feed text that is already in hand.
pub fn process_feed_text(
    ics_text: &str,
    now: DateTime<Utc>,
    configured_tz: Option<Tz>,
) -> Result<LoadedCalendar, FeedError> {
    relay::utils::validate_calendar_text(ics_text)?;

    let parsed = ics_parser::parse_feed(ics_text, configured_tz)?;
    let events = calendar::upcoming_events(&parsed.events, now, parsed.timezone);
    info!(
        "{} of {} events are upcoming as of {}",
        events.len(),
        parsed.events.len(),
        now.with_timezone(&parsed.timezone).date_naive()
    );

    Ok(LoadedCalendar {
        metadata: parsed.metadata,
        events,
        timezone: parsed.timezone,
    })
}

/// Same as [`process_feed_text`], starting from a raw relay response body.
pub fn process_relay_body(
    body: &str,
    now: DateTime<Utc>,
    configured_tz: Option<Tz>,
) -> Result<LoadedCalendar, FeedError> {
    let contents = relay::api::extract_contents(body)?;
    let ics_text = relay::utils::decode_contents(&contents)?;
    process_feed_text(&ics_text, now, configured_tz)
}
