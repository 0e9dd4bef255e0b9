//! This client fetches event cards from the CRM and parses them into event records.

mod card;

use std::{borrow::Cow, sync::OnceLock};

use chrono::NaiveDate;
use regex::{Captures, Regex};
use reqwest::{header::CONTENT_TYPE, StatusCode};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use card::{Card, Element, FragmentError, FIELD_TAGS};

use crate::{
    config::{ConfigError, Credentials, ZebraConfig},
    event::{EventListing, EventRecord},
};

static CARD_PATTERN: &str = r"(?s)<CARD>(.*?)</CARD>";
static AMPERSAND_PATTERN: &str = r"&((?:amp|lt|gt|quot|apos);)?";

#[derive(Debug, Error)]
pub enum ZebraError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("the CRM could not be reached: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("the CRM answered with status {0}")]
    Status(StatusCode),
}

impl ZebraError {
    /// Whether the CRM did not answer within the configured timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(err) if err.is_timeout())
    }
}

/// Get the listing of events to display, as of `today`.
pub async fn get(config: &ZebraConfig, today: NaiveDate) -> Result<EventListing, ZebraError> {
    let body = fetch(config).await?;
    let records = parse(&body);
    let listing = EventListing::build(records, config.filter_mode, today);
    info!(
        total = listing.total,
        active = listing.active,
        shown = listing.events.len(),
        mode = ?listing.mode,
        "fetched events from the CRM"
    );
    Ok(listing)
}

/// Post the card request to the CRM and return the raw response body.
///
/// The credentials are checked before anything is sent.
pub async fn fetch(config: &ZebraConfig) -> Result<String, ZebraError> {
    let credentials = config.credentials()?;
    let client = reqwest::Client::builder().timeout(config.timeout).build()?;
    let response = client
        .post(&config.url)
        .header(CONTENT_TYPE, config.content_type.as_str())
        .body(request_xml(&credentials, &config.card_type_filter))
        .send()
        .await
        .map_err(|err| {
            warn!(url = %config.url, "request to the CRM failed: {err}");
            err
        })?;
    let status = response.status();
    if !status.is_success() {
        warn!(url = %config.url, %status, "the CRM rejected the request");
        return Err(ZebraError::Status(status));
    }
    Ok(response.text().await?)
}

/// Build the request document asking for all cards of `card_type_filter`.
///
/// Each requested field is sent empty, which the CRM reads as "no filter, return this field".
/// The credentials are embedded as they are, without escaping.
pub fn request_xml(credentials: &Credentials, card_type_filter: &str) -> String {
    let fields: String = FIELD_TAGS
        .iter()
        .map(|tag| format!("    <{tag}></{tag}>\n"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<ROOT>
  <PERMISSION>
    <USERNAME>{username}</USERNAME>
    <PASSWORD>{password}</PASSWORD>
  </PERMISSION>

  <CARD_TYPE_FILTER>{card_type_filter}</CARD_TYPE_FILTER>

  <FIELDS>
{fields}  </FIELDS>

  <ID></ID>
  <CARD_TYPE></CARD_TYPE>
</ROOT>
"#,
        username = credentials.username(),
        password = credentials.password(),
    )
}

/// Parse the CRM response into event records, in document order.
pub fn parse(body: &str) -> Vec<EventRecord> {
    extract_cards(body)
        .iter()
        .filter_map(|card| {
            let record = card.to_record();
            if record.is_none() {
                debug!("dropping card without FIELDS");
            }
            record
        })
        .collect()
}

/// Find every `<CARD>` fragment in `body` and parse the ones which are well-formed.
///
/// The response is never parsed as a whole, since a single bad card would hide all others.
/// Fragments are repaired with [`repair_ampersands`] first; fragments still failing to parse
/// are skipped.
pub fn extract_cards(body: &str) -> Vec<Card> {
    card_regex()
        .find_iter(body)
        .enumerate()
        .filter_map(
            |(index, fragment)| match Card::parse(&repair_ampersands(fragment.as_str())) {
                Ok(card) => Some(card),
                Err(err) => {
                    debug!(index, "dropping malformed card: {err}");
                    None
                }
            },
        )
        .collect()
}

/// Escape every `&` which does not start one of the five predefined entity references.
pub fn repair_ampersands(fragment: &str) -> Cow<'_, str> {
    ampersand_regex().replace_all(fragment, |captures: &Captures| {
        if captures.get(1).is_some() {
            captures[0].to_string()
        } else {
            String::from("&amp;")
        }
    })
}

fn card_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(CARD_PATTERN).unwrap())
}

fn ampersand_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(AMPERSAND_PATTERN).unwrap())
}
