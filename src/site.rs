use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::calendar::LoadedCalendar;
use crate::config::Config;
use crate::error::FeedError;
use crate::render::{self, QR_FILE_NAME};
use crate::subscribe;

pub const LANDING_FILE_NAME: &str = "index.html";
pub const CALENDAR_FILE_NAME: &str = "calendar.html";

const QR_INLINE_SIZE: u32 = 150;

// The standalone file keeps its XML prolog; the inline copy must not.
fn inline_svg(svg: &str) -> String {
    svg.find("<svg")
        .map(|start| svg[start..].to_string())
        .unwrap_or_else(|| svg.to_string())
}

/// Renders both pages plus the QR download and writes them into `out_dir`.
pub fn write_site(
    out_dir: &Path,
    config: &Config,
    outcome: &Result<LoadedCalendar, FeedError>,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    let qr_svg = subscribe::qr_code_svg(&config.calendar_webcal_url, QR_INLINE_SIZE)?;

    let calendar_title = match outcome {
        Ok(loaded) => loaded.header_title(&config.calendar_name),
        Err(_) => config.calendar_name.as_str(),
    };

    let files = [
        (
            LANDING_FILE_NAME,
            render::render_landing_page(config, calendar_title)?,
        ),
        (
            CALENDAR_FILE_NAME,
            render::render_calendar_page(config, outcome, inline_svg(&qr_svg))?,
        ),
        (QR_FILE_NAME, qr_svg),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (name, contents) in files {
        let path = out_dir.join(name);
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {}", path.display());
        written.push(path);
    }

    Ok(written)
}
