use chrono::{DateTime, Utc};
use chrono_tz::Tz;

pub const DEFAULT_TITLE: &str = "Untitled Event";
pub const DEFAULT_ORGANIZER: &str = "Event Organizer";
pub const DEFAULT_CALENDAR_TITLE: &str = "Events Calendar";
pub const DEFAULT_CALENDAR_DESCRIPTION: &str = "Upcoming events from this calendar";

/// One VEVENT of the feed, resolved to absolute instants.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub id: usize,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub organizer: String,
    pub url: Option<String>,
    pub all_day: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarFeedMetadata {
    pub title: String,
    pub description: String,
    pub timezone: Option<String>,
}

impl Default for CalendarFeedMetadata {
    fn default() -> Self {
        Self {
            title: DEFAULT_CALENDAR_TITLE.to_string(),
            description: DEFAULT_CALENDAR_DESCRIPTION.to_string(),
            timezone: None,
        }
    }
}

/// Result of one successful pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCalendar {
    pub metadata: CalendarFeedMetadata,
    pub events: Vec<CalendarEvent>,
    pub timezone: Tz,
}

impl LoadedCalendar {
    /// Feed title for the page header. The generic fallback label never
    /// replaces `configured`.
    pub fn header_title<'a>(&'a self, configured: &'a str) -> &'a str {
        if self.metadata.title == DEFAULT_CALENDAR_TITLE {
            configured
        } else {
            &self.metadata.title
        }
    }

    pub fn header_description<'a>(&'a self, configured: &'a str) -> &'a str {
        if self.metadata.description == DEFAULT_CALENDAR_DESCRIPTION {
            configured
        } else {
            &self.metadata.description
        }
    }
}

/// Keeps events starting on or after the calendar date of `reference` in `tz`,
/// ordered by start. Ties keep their input order.
pub fn upcoming_events(
    events: &[CalendarEvent],
    reference: DateTime<Utc>,
    tz: Tz,
) -> Vec<CalendarEvent> {
    let today = reference.with_timezone(&tz).date_naive();

    let mut upcoming: Vec<CalendarEvent> = events
        .iter()
        .filter(|event| event.start_date.with_timezone(&tz).date_naive() >= today)
        .cloned()
        .collect();

    upcoming.sort_by_key(|event| event.start_date);
    upcoming
}

/// Picks the zone used for day boundaries and display.
pub fn resolve_timezone(configured: Option<Tz>, metadata: &CalendarFeedMetadata) -> Tz {
    if let Some(tz) = configured {
        return tz;
    }

    match metadata.timezone.as_deref() {
        Some(name) => name.parse::<Tz>().unwrap_or_else(|_| {
            log::warn!("Unrecognized calendar timezone '{}', using UTC", name);
            Tz::UTC
        }),
        None => Tz::UTC,
    }
}
