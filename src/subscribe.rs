use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use qrcode::QrCode;
use qrcode::render::svg;
use urlencoding::encode;

use crate::calendar::CalendarEvent;

pub const QR_DARK: &str = "#1f2937";
pub const QR_LIGHT: &str = "#ffffff";

/// One-click subscription targets for the common calendar apps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionLinks {
    pub apple: String,
    pub google: String,
    pub outlook: String,
}

impl SubscriptionLinks {
    pub fn new(http_url: &str, webcal_url: &str, calendar_name: &str) -> Self {
        Self {
            apple: webcal_url.to_string(),
            google: format!(
                "https://calendar.google.com/calendar/u/0/r/settings/addbyurl?cid={}",
                encode(http_url)
            ),
            outlook: format!(
                "https://outlook.live.com/calendar/0/addfromweb?url={}&name={}",
                encode(http_url),
                encode(calendar_name)
            ),
        }
    }
}

fn google_date(date: &DateTime<Utc>) -> String {
    date.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Google Calendar "create event" link prefilled from one event.
pub fn add_to_calendar_url(event: &CalendarEvent) -> String {
    let mut url = format!(
        "https://calendar.google.com/calendar/render?action=TEMPLATE&text={}&dates={}/{}",
        encode(&event.title),
        google_date(&event.start_date),
        google_date(&event.end_date)
    );
    if let Some(description) = &event.description {
        url.push_str(&format!("&details={}", encode(description)));
    }
    if let Some(location) = &event.location {
        url.push_str(&format!("&location={}", encode(location)));
    }
    url
}

/// Renders `data` as a standalone SVG QR code.
pub fn qr_code_svg(data: &str, size: u32) -> Result<String> {
    let code = QrCode::new(data.as_bytes())
        .with_context(|| format!("Failed to encode QR code for: {}", data))?;

    Ok(code
        .render::<svg::Color>()
        .min_dimensions(size, size)
        .dark_color(svg::Color(QR_DARK))
        .light_color(svg::Color(QR_LIGHT))
        .build())
}
