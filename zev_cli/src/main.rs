use std::{env::current_dir, fs::write};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;
use zev_core::{event::EventListing, render, zebra_client, FilterMode, ZebraConfig};

#[derive(Debug, Parser)]
pub struct Arguments {
    /// how events are filtered, overriding ZEBRA_FILTER_MODE
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,
    /// the cutoff date for upcoming events, defaults to today
    #[arg(long)]
    pub today: Option<NaiveDate>,
    /// write events.html into the current directory instead of printing the events
    #[arg(long)]
    pub html: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Strict,
    Diagnostic,
}

impl From<Mode> for FilterMode {
    fn from(value: Mode) -> Self {
        match value {
            Mode::Strict => FilterMode::Strict,
            Mode::Diagnostic => FilterMode::Diagnostic,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Arguments::parse();
    let mut config = ZebraConfig::from_env().context("invalid CRM configuration")?;
    if let Some(mode) = args.mode {
        config.filter_mode = mode.into();
    }
    let today = args
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let listing = zebra_client::get(&config, today).await?;

    if args.html {
        let mut path = current_dir()?;
        path.push("events.html");
        write(&path, render::events_page(&listing)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), events = listing.events.len(), "wrote event page");
    } else {
        print!("{}", lines(&listing));
    }
    Ok(())
}

/// One line per event, followed by the counts.
fn lines(listing: &EventListing) -> String {
    let mut out: String = listing
        .events
        .iter()
        .map(|event| {
            format!(
                "{} | {} | {} | {} | {}\n",
                event.display_order, event.raw_date, event.hour, event.name, event.location
            )
        })
        .collect();
    if listing.is_empty() {
        out.push_str("no active upcoming events\n");
    }
    out.push_str(&format!(
        "{} shown, {} active, {} total\n",
        listing.events.len(),
        listing.active,
        listing.total
    ));
    out
}
