use anyhow::{Context, Result};
use askama::Template;
use chrono::{DateTime, Duration};
use chrono_tz::Tz;

use crate::calendar::{CalendarEvent, LoadedCalendar};
use crate::config::{Config, FeedMode, Profile};
use crate::error::FeedError;
use crate::subscribe::{self, SubscriptionLinks};

pub const QR_FILE_NAME: &str = "calendar-qr-code.svg";

/// Display data for one event card.
#[derive(Debug, Clone, PartialEq)]
pub struct EventCard {
    pub id: usize,
    pub title: String,
    pub when: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub organizer: String,
    pub url: Option<String>,
    pub add_to_calendar_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorView {
    pub detail: String,
    pub remedies: Vec<&'static str>,
}

#[derive(Template)]
#[template(path = "calendar.html")]
pub struct CalendarPage {
    pub title: String,
    pub description: String,
    pub links: SubscriptionLinks,
    pub http_url: String,
    pub webcal_url: String,
    pub qr_svg: String,
    pub qr_file: &'static str,
    pub events: Vec<EventCard>,
    pub error: Option<ErrorView>,
    pub timezone: String,
}

#[derive(Template)]
#[template(path = "landing.html")]
pub struct LandingPage<'a> {
    pub profile: &'a Profile,
    pub calendar_title: &'a str,
}

/// Suggestions shown under a failed load, tuned to where the feed came from.
pub fn remedies(mode: FeedMode) -> Vec<&'static str> {
    match mode {
        FeedMode::Local => vec![
            "Make sure a local web server is serving the site directory",
            "Check that the example calendar file exists next to the page",
            "Set DEVELOPMENT_MODE=false to load the published calendar instead",
        ],
        FeedMode::Remote => vec![
            "The calendar may be set to private - make sure it's public",
            "The calendar URL may have changed",
            "CORS proxy services may be temporarily unavailable",
        ],
    }
}

fn format_day(date: &DateTime<Tz>) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

fn format_time(date: &DateTime<Tz>) -> String {
    date.format("%-I:%M %p").to_string()
}

/// Human readable date and time span, in `tz`.
pub fn format_when(event: &CalendarEvent, tz: Tz) -> String {
    let start = event.start_date.with_timezone(&tz);
    let end = event.end_date.with_timezone(&tz);

    if event.all_day {
        // DTEND of an all-day event is exclusive.
        let last_day = (event.end_date - Duration::days(1)).with_timezone(&tz);
        if last_day.date_naive() > start.date_naive() {
            return format!("{} - {}", format_day(&start), format_day(&last_day));
        }
        return format!("{} (all day)", format_day(&start));
    }

    if start.date_naive() == end.date_naive() {
        format!(
            "{} at {} - {}",
            format_day(&start),
            format_time(&start),
            format_time(&end)
        )
    } else {
        format!(
            "{} at {} - {} at {}",
            format_day(&start),
            format_time(&start),
            format_day(&end),
            format_time(&end)
        )
    }
}

pub fn event_cards(events: &[CalendarEvent], tz: Tz) -> Vec<EventCard> {
    events
        .iter()
        .map(|event| EventCard {
            id: event.id,
            title: event.title.clone(),
            when: format_when(event, tz),
            location: event.location.clone(),
            description: event.description.clone(),
            organizer: event.organizer.clone(),
            url: event.url.clone(),
            add_to_calendar_url: subscribe::add_to_calendar_url(event),
        })
        .collect()
}

/// Builds the calendar page: either the full event list or the error view.
pub fn calendar_page(
    config: &Config,
    outcome: &Result<LoadedCalendar, FeedError>,
    qr_svg: String,
) -> CalendarPage {
    let mut page = CalendarPage {
        title: config.calendar_name.clone(),
        description: config.calendar_description.clone(),
        links: SubscriptionLinks::new(
            &config.calendar_http_url,
            &config.calendar_webcal_url,
            &config.calendar_name,
        ),
        http_url: config.calendar_http_url.clone(),
        webcal_url: config.calendar_webcal_url.clone(),
        qr_svg,
        qr_file: QR_FILE_NAME,
        events: Vec::new(),
        error: None,
        timezone: config.timezone.unwrap_or(Tz::UTC).to_string(),
    };

    match outcome {
        Ok(loaded) => {
            page.title = loaded.header_title(&config.calendar_name).to_string();
            page.description = loaded
                .header_description(&config.calendar_description)
                .to_string();
            page.events = event_cards(&loaded.events, loaded.timezone);
            page.timezone = loaded.timezone.to_string();
        }
        Err(err) => {
            page.error = Some(ErrorView {
                detail: err.to_string(),
                remedies: remedies(config.mode),
            });
        }
    }

    page
}

pub fn render_calendar_page(
    config: &Config,
    outcome: &Result<LoadedCalendar, FeedError>,
    qr_svg: String,
) -> Result<String> {
    calendar_page(config, outcome, qr_svg)
        .render()
        .context("Failed to render calendar page")
}

pub fn render_landing_page(config: &Config, calendar_title: &str) -> Result<String> {
    LandingPage {
        profile: &config.profile,
        calendar_title,
    }
    .render()
    .context("Failed to render landing page")
}

/// Plain text listing used by the `events` command.
pub fn event_lines(loaded: &LoadedCalendar) -> Vec<String> {
    if loaded.events.is_empty() {
        return vec!["No upcoming events found.".to_string()];
    }

    loaded
        .events
        .iter()
        .map(|event| {
            let mut line = format!("{}  {}", format_when(event, loaded.timezone), event.title);
            if let Some(location) = &event.location {
                line.push_str(&format!(" @ {}", location));
            }
            line
        })
        .collect()
}
