use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use log::{debug, error, info};
use reqwest::Client;

use ics_calendar_page::config::{Config, FeedMode};
use ics_calendar_page::subscribe::SubscriptionLinks;
use ics_calendar_page::{load_calendar, render, site};

#[derive(Parser)]
#[command(name = "ics-calendar-page")]
#[command(about = "Render a landing page and a calendar subscription page from an ICS feed")]
struct Cli {
    /// Load the local fixture instead of the published feed
    #[arg(long, global = true, conflicts_with = "remote")]
    local: bool,

    /// Load the published feed through the relay, even in development mode
    #[arg(long, global = true)]
    remote: bool,

    /// Reference instant for "upcoming" (RFC 3339), defaults to now
    #[arg(long, global = true)]
    now: Option<DateTime<Utc>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the feed and write the static pages
    Render {
        /// Directory the pages are written to
        #[arg(short, long, default_value = "site")]
        out_dir: PathBuf,
    },
    /// Fetch the feed and print upcoming events
    Events,
    /// Print the subscription links for the configured calendar
    Links,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    env_logger::init();

    if cli.local {
        config.mode = FeedMode::Local;
    } else if cli.remote {
        config.mode = FeedMode::Remote;
    }
    let now = cli.now.unwrap_or_else(Utc::now);
    debug!("Running in {:?} mode as of {}", config.mode, now);

    match cli.command {
        Commands::Links => {
            let links = SubscriptionLinks::new(
                &config.calendar_http_url,
                &config.calendar_webcal_url,
                &config.calendar_name,
            );
            println!("Apple:   {}", links.apple);
            println!("Google:  {}", links.google);
            println!("Outlook: {}", links.outlook);
            println!("URL:     {}", config.calendar_webcal_url);
        }
        Commands::Events => {
            let client = Client::new();
            let loaded = load_calendar(&client, &config.feed_source(), now, config.timezone)
                .await
                .context("Failed to load calendar events")?;

            println!("{}", loaded.metadata.title);
            for line in render::event_lines(&loaded) {
                println!("{}", line);
            }
        }
        Commands::Render { out_dir } => {
            let client = Client::new();
            let outcome = load_calendar(&client, &config.feed_source(), now, config.timezone).await;
            if let Err(err) = &outcome {
                error!("Error loading ICS calendar: {}", err);
            }

            let written = site::write_site(&out_dir, &config, &outcome)?;
            info!("Wrote {} files to {}", written.len(), out_dir.display());
        }
    }

    Ok(())
}
