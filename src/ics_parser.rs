use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::parser::{Component, Property, read_calendar, unfold};
use icalendar::{CalendarDateTime, DatePerhapsTime};
use log::{debug, info, warn};

use crate::calendar::{
    CalendarEvent, CalendarFeedMetadata, DEFAULT_ORGANIZER, DEFAULT_TITLE, resolve_timezone,
};
use crate::error::FeedError;

/// Parsed feed before any date filtering.
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    pub metadata: CalendarFeedMetadata,
    pub events: Vec<CalendarEvent>,
    pub timezone: Tz,
}

/// Parses validated feed text. Event ids follow VEVENT encounter order, starting at 1.
///
/// Floating and all-day times are read in `configured_tz`, or in the feed's
/// `X-WR-TIMEZONE` when no zone is configured.
pub fn parse_feed(ics_text: &str, configured_tz: Option<Tz>) -> Result<ParsedFeed, FeedError> {
    let unfolded = unfold(ics_text.trim_start_matches('\u{feff}'));
    let calendar = read_calendar(unfolded.trim()).map_err(|e| FeedError::parse(e.to_string()))?;

    let metadata = extract_metadata(&calendar.properties);
    let timezone = resolve_timezone(configured_tz, &metadata);
    debug!("Resolving calendar times in {}", timezone);

    let events = calendar
        .components
        .iter()
        .filter(|component| component.name == "VEVENT")
        .enumerate()
        .map(|(index, vevent)| convert_vevent(vevent, index + 1, timezone))
        .collect::<Result<Vec<_>, _>>()?;

    info!("Parsed {} events from ICS data", events.len());

    Ok(ParsedFeed {
        metadata,
        events,
        timezone,
    })
}

fn extract_metadata(properties: &[Property]) -> CalendarFeedMetadata {
    let find_text = |name: &str| {
        properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| unescape_text(p.val.as_ref()))
            .filter(|value| !value.is_empty())
    };

    let defaults = CalendarFeedMetadata::default();
    CalendarFeedMetadata {
        title: find_text("X-WR-CALNAME").unwrap_or(defaults.title),
        description: find_text("X-WR-CALDESC").unwrap_or(defaults.description),
        timezone: find_text("X-WR-TIMEZONE"),
    }
}

fn convert_vevent(vevent: &Component, id: usize, tz: Tz) -> Result<CalendarEvent, FeedError> {
    let start_prop = vevent
        .find_prop("DTSTART")
        .ok_or_else(|| FeedError::parse(format!("event {} has no DTSTART", id)))?;
    let start = DatePerhapsTime::try_from(start_prop)
        .map_err(|_| invalid_time(id, "DTSTART", start_prop))?;
    let all_day = matches!(start, DatePerhapsTime::Date(_));
    let start_date =
        resolve_instant(&start, tz).ok_or_else(|| invalid_time(id, "DTSTART", start_prop))?;

    let end_date = match vevent.find_prop("DTEND") {
        Some(end_prop) => DatePerhapsTime::try_from(end_prop)
            .ok()
            .and_then(|end| resolve_instant(&end, tz))
            .ok_or_else(|| invalid_time(id, "DTEND", end_prop))?,
        None => match vevent
            .find_prop("DURATION")
            .and_then(|p| parse_duration(p.val.as_ref()))
        {
            Some(duration) => start_date + duration,
            None if all_day => start_date + Duration::days(1),
            None => start_date,
        },
    };

    let title = text_prop(vevent, "SUMMARY").unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let organizer = vevent
        .find_prop("ORGANIZER")
        .and_then(|prop| {
            prop.params
                .iter()
                .find(|p| p.key.as_str().eq_ignore_ascii_case("CN"))
        })
        .and_then(|p| p.val.as_ref().map(|v| v.to_string()))
        .map(|cn| cn.trim().trim_matches('"').to_string())
        .filter(|cn| !cn.is_empty())
        .unwrap_or_else(|| DEFAULT_ORGANIZER.to_string());

    let event = CalendarEvent {
        id,
        title,
        start_date,
        end_date,
        location: text_prop(vevent, "LOCATION"),
        description: text_prop(vevent, "DESCRIPTION"),
        organizer,
        url: text_prop(vevent, "URL"),
        all_day,
    };
    debug!("Event {}: {} ({})", event.id, event.title, event.start_date);

    Ok(event)
}

fn invalid_time(id: usize, name: &str, prop: &Property) -> FeedError {
    FeedError::parse(format!(
        "event {} has an invalid {} value '{}'",
        id,
        name,
        prop.val.to_string()
    ))
}

fn text_prop(vevent: &Component, name: &str) -> Option<String> {
    vevent
        .find_prop(name)
        .map(|p| unescape_text(p.val.as_ref()).trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Converts an iCalendar date or date-time to an instant. Floating times and
/// dates are read in `tz`.
pub fn resolve_instant(value: &DatePerhapsTime, tz: Tz) -> Option<DateTime<Utc>> {
    match value {
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => Some(dt.naive_utc().and_utc()),
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => localize(naive, tz),
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            match zone_from_tzid(tzid) {
                Some(zone) => localize(date_time, zone),
                None => {
                    warn!("Unrecognized timezone '{}', treating as {}", tzid, tz);
                    localize(date_time, tz)
                }
            }
        }
        DatePerhapsTime::Date(date) => localize(&date.and_time(NaiveTime::MIN), tz),
    }
}

// Outlook and Exchange feeds often name zones the Windows way.
const WINDOWS_ZONES: &[(&str, Tz)] = &[
    ("UTC", Tz::UTC),
    ("GMT Standard Time", chrono_tz::Europe::London),
    ("W. Europe Standard Time", chrono_tz::Europe::Berlin),
    ("Romance Standard Time", chrono_tz::Europe::Paris),
    ("Central Europe Standard Time", chrono_tz::Europe::Budapest),
    ("Central European Standard Time", chrono_tz::Europe::Warsaw),
    ("E. Europe Standard Time", chrono_tz::Europe::Chisinau),
    ("FLE Standard Time", chrono_tz::Europe::Helsinki),
    ("Russian Standard Time", chrono_tz::Europe::Moscow),
    ("Eastern Standard Time", chrono_tz::America::New_York),
    ("Central Standard Time", chrono_tz::America::Chicago),
    ("Mountain Standard Time", chrono_tz::America::Denver),
    ("US Mountain Standard Time", chrono_tz::America::Phoenix),
    ("Pacific Standard Time", chrono_tz::America::Los_Angeles),
    ("Alaskan Standard Time", chrono_tz::America::Anchorage),
    ("Hawaiian Standard Time", chrono_tz::Pacific::Honolulu),
    ("Atlantic Standard Time", chrono_tz::America::Halifax),
    ("E. South America Standard Time", chrono_tz::America::Sao_Paulo),
    ("India Standard Time", chrono_tz::Asia::Kolkata),
    ("China Standard Time", chrono_tz::Asia::Shanghai),
    ("Singapore Standard Time", chrono_tz::Asia::Singapore),
    ("Tokyo Standard Time", chrono_tz::Asia::Tokyo),
    ("Korea Standard Time", chrono_tz::Asia::Seoul),
    ("AUS Eastern Standard Time", chrono_tz::Australia::Sydney),
    ("New Zealand Standard Time", chrono_tz::Pacific::Auckland),
];

/// Resolves a TZID as an IANA name, falling back to Windows zone names.
pub fn zone_from_tzid(tzid: &str) -> Option<Tz> {
    let name = tzid.trim().trim_matches('"');
    name.parse::<Tz>().ok().or_else(|| {
        WINDOWS_ZONES
            .iter()
            .find(|(windows, _)| windows.eq_ignore_ascii_case(name))
            .map(|(_, zone)| *zone)
    })
}

fn localize(naive: &NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    // Times skipped by a DST jump land one hour later.
    tz.from_local_datetime(naive)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(*naive + Duration::hours(1)))
                .earliest()
        })
        .map(|local| local.with_timezone(&Utc))
}

fn parse_duration(value: &str) -> Option<Duration> {
    let duration = iso8601::duration(value.trim().trim_start_matches('+')).ok()?;
    let std_duration: std::time::Duration = duration.into();
    Duration::from_std(std_duration).ok()
}

/// Reverses RFC 5545 TEXT escaping.
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
