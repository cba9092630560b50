use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;
use dotenv::dotenv;
use std::env;
use url::Url;

use crate::calendar::{DEFAULT_CALENDAR_DESCRIPTION, DEFAULT_CALENDAR_TITLE};
use crate::relay::FeedSource;

pub const DEFAULT_RELAY_URL: &str = "https://api.allorigins.win/get";
pub const DEFAULT_PAGE_BASE_URL: &str = "http://localhost:8000/";
pub const DEFAULT_LOCAL_FEED_PATH: &str = "example.ics";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedMode {
    Local,
    Remote,
}

#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub name: String,
    pub avatar: Option<String>,
    pub email: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub interest_form_action: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub calendar_http_url: String,
    pub calendar_webcal_url: String,
    pub calendar_name: String,
    pub calendar_description: String,
    pub timezone: Option<Tz>,
    pub mode: FeedMode,
    pub local_feed_url: Url,
    pub relay_url: Url,
    pub profile: Profile,
}

fn get_optional_bool(key: &str) -> Result<Option<bool>> {
    match env::var(key) {
        Ok(val_str) => {
            let value = val_str.trim().parse::<bool>().context(format!(
                "'{}' is invalid: could not parse '{}' as a boolean",
                key, val_str
            ))?;
            Ok(Some(value))
        }
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e).context(format!("'{}' contained invalid unicode", key)),
    }
}

fn get_optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_url(key: &str, value: &str) -> Result<Url> {
    Url::parse(value).with_context(|| format!("'{}' is not a valid URL: {}", key, value))
}

/// Swaps an http(s) feed URL to the `webcal://` scheme calendar apps subscribe to.
pub fn webcal_from_http(http_url: &str) -> String {
    http_url
        .strip_prefix("https://")
        .or_else(|| http_url.strip_prefix("http://"))
        .map(|rest| format!("webcal://{}", rest))
        .unwrap_or_else(|| http_url.to_string())
}

impl Config {
    // Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let calendar_http_url = env::var("CALENDAR_HTTP_URL")
            .context("CALENDAR_HTTP_URL environment variable not set")?;
        parse_url("CALENDAR_HTTP_URL", &calendar_http_url)?;

        let calendar_webcal_url = get_optional("CALENDAR_WEBCAL_URL")
            .unwrap_or_else(|| webcal_from_http(&calendar_http_url));

        let timezone = get_optional("CALENDAR_TIMEZONE")
            .map(|name| {
                name.parse::<Tz>()
                    .map_err(|e| anyhow!("'CALENDAR_TIMEZONE' is invalid: {}", e))
            })
            .transpose()?;

        let mode = match get_optional_bool("DEVELOPMENT_MODE")? {
            Some(true) => FeedMode::Local,
            _ => FeedMode::Remote,
        };

        let page_base_url = get_optional("PAGE_BASE_URL")
            .unwrap_or_else(|| DEFAULT_PAGE_BASE_URL.to_string());
        let local_feed_path = get_optional("LOCAL_FEED_PATH")
            .unwrap_or_else(|| DEFAULT_LOCAL_FEED_PATH.to_string());
        let local_feed_url = parse_url("PAGE_BASE_URL", &page_base_url)?
            .join(&local_feed_path)
            .with_context(|| format!("'LOCAL_FEED_PATH' is invalid: {}", local_feed_path))?;

        let relay_url = parse_url(
            "RELAY_URL",
            &get_optional("RELAY_URL").unwrap_or_else(|| DEFAULT_RELAY_URL.to_string()),
        )?;

        let profile = Profile {
            name: get_optional("PROFILE_NAME").unwrap_or_else(|| "Calendar Owner".to_string()),
            avatar: get_optional("PROFILE_AVATAR"),
            email: get_optional("PROFILE_EMAIL"),
            github: get_optional("SOCIAL_GITHUB"),
            linkedin: get_optional("SOCIAL_LINKEDIN"),
            twitter: get_optional("SOCIAL_TWITTER"),
            interest_form_action: get_optional("INTEREST_FORM_ACTION"),
        };

        Ok(Self {
            calendar_http_url,
            calendar_webcal_url,
            calendar_name: get_optional("CALENDAR_NAME")
                .unwrap_or_else(|| DEFAULT_CALENDAR_TITLE.to_string()),
            calendar_description: get_optional("CALENDAR_DESCRIPTION")
                .unwrap_or_else(|| DEFAULT_CALENDAR_DESCRIPTION.to_string()),
            timezone,
            mode,
            local_feed_url,
            relay_url,
            profile,
        })
    }

    pub fn feed_source(&self) -> FeedSource {
        match self.mode {
            FeedMode::Local => FeedSource::Local {
                url: self.local_feed_url.clone(),
            },
            FeedMode::Remote => FeedSource::Remote {
                relay: self.relay_url.clone(),
                target: self.calendar_http_url.clone(),
            },
        }
    }
}
