//! Event records and the rules deciding which of them are displayed, and in which order.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::ConfigError;

/// Display order of events whose order field is missing or not a number.
pub const DEFAULT_DISPLAY_ORDER: i64 = 9999;

static DATE_FORMAT: &str = "%d/%m/%Y";
static ACTIVE_STATUS: &str = "1";

/// A single event card as read from the CRM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    pub id: Option<String>,
    pub name: String,
    /// The date as sent by the CRM, `DD/MM/YYYY`.
    pub raw_date: String,
    pub parsed_date: Option<NaiveDate>,
    pub hour: String,
    pub location: String,
    pub display_order: i64,
    pub status_flag: String,
}

impl EventRecord {
    /// Whether the CRM marks this event as active.
    pub fn is_active(&self) -> bool {
        self.status_flag == ACTIVE_STATUS
    }

    /// Whether the event has a known date which is `today` or later.
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.parsed_date.is_some_and(|date| date >= today)
    }
}

/// Parse a `DD/MM/YYYY` date, ignoring surrounding whitespace.
pub fn parse_date_ddmmyyyy(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    // chrono accepts signed and short years, the CRM always sends four digits
    let year = value.rsplit('/').next()?;
    if year.len() != 4 || !year.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Parse a display order, falling back to [`DEFAULT_DISPLAY_ORDER`].
pub fn parse_display_order(value: &str) -> i64 {
    value.trim().parse().unwrap_or(DEFAULT_DISPLAY_ORDER)
}

/// How the fetched events are narrowed down for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Active events dated today or later, sorted by display order and date.
    #[default]
    Strict,
    /// All active events in CRM order, regardless of their date.
    Diagnostic,
}

impl FromStr for FilterMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "diagnostic" => Ok(Self::Diagnostic),
            _ => Err(ConfigError::InvalidFilterMode(value.to_string())),
        }
    }
}

/// The events to display, together with the counts they were selected from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventListing {
    pub mode: FilterMode,
    /// Number of records extracted from the CRM response.
    pub total: usize,
    /// Number of active records, whatever their date.
    pub active: usize,
    pub events: Vec<EventRecord>,
}

impl EventListing {
    pub fn build(records: Vec<EventRecord>, mode: FilterMode, today: NaiveDate) -> Self {
        let total = records.len();
        let active = records.iter().filter(|record| record.is_active()).count();
        let events = match mode {
            FilterMode::Strict => {
                let mut events: Vec<EventRecord> = records
                    .into_iter()
                    .filter(|record| record.is_active() && record.is_upcoming(today))
                    .collect();
                // stable, so equal keys keep their CRM order
                events.sort_by_key(|record| (record.display_order, record.parsed_date));
                events
            }
            FilterMode::Diagnostic => records
                .into_iter()
                .filter(EventRecord::is_active)
                .collect(),
        };
        Self {
            mode,
            total,
            active,
            events,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::NaiveDate;

    use crate::event::{
        parse_date_ddmmyyyy, parse_display_order, EventListing, EventRecord, FilterMode,
        DEFAULT_DISPLAY_ORDER,
    };

    fn record(name: &str, raw_date: &str, order: &str, status: &str) -> EventRecord {
        EventRecord {
            id: None,
            name: name.to_string(),
            raw_date: raw_date.to_string(),
            parsed_date: parse_date_ddmmyyyy(raw_date),
            hour: String::new(),
            location: String::new(),
            display_order: parse_display_order(order),
            status_flag: status.to_string(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_str("2024-06-01").unwrap()
    }

    fn names(listing: &EventListing) -> Vec<&str> {
        listing
            .events
            .iter()
            .map(|event| event.name.as_str())
            .collect()
    }

    #[test]
    fn test_parse_date_ddmmyyyy() {
        assert_eq!(
            parse_date_ddmmyyyy(" 15/06/2024 "),
            Some(NaiveDate::from_str("2024-06-15").unwrap())
        );
        assert_eq!(parse_date_ddmmyyyy(""), None);
        assert_eq!(parse_date_ddmmyyyy("31-13-2024"), None);
        assert_eq!(parse_date_ddmmyyyy("31/02/2024"), None);
        assert_eq!(parse_date_ddmmyyyy("2024/06/15"), None);
        assert_eq!(parse_date_ddmmyyyy("01/06/+2024"), None);
        assert_eq!(parse_date_ddmmyyyy("01/06/-2024"), None);
        assert_eq!(parse_date_ddmmyyyy("01/06/24"), None);
        assert_eq!(parse_date_ddmmyyyy("01/06/02024"), None);
        assert_eq!(
            parse_date_ddmmyyyy("1/6/2024"),
            Some(NaiveDate::from_str("2024-06-01").unwrap())
        );
    }

    #[test]
    fn test_parse_display_order() {
        assert_eq!(parse_display_order(" 3 "), 3);
        assert_eq!(parse_display_order("-1"), -1);
        assert_eq!(parse_display_order("abc"), DEFAULT_DISPLAY_ORDER);
        assert_eq!(parse_display_order(""), DEFAULT_DISPLAY_ORDER);
    }

    #[test]
    fn test_filter_mode_from_str() {
        assert_eq!(FilterMode::from_str("strict").unwrap(), FilterMode::Strict);
        assert_eq!(
            FilterMode::from_str(" DIAGNOSTIC ").unwrap(),
            FilterMode::Diagnostic
        );
        assert!(FilterMode::from_str("pending").is_err());
    }

    #[test]
    fn test_strict_filters_status_and_date() {
        let records = vec![
            record("active", "01/06/2024", "1", "1"),
            record("inactive", "10/06/2024", "1", "0"),
            record("empty status", "10/06/2024", "1", ""),
            record("other status", "10/06/2024", "1", "2"),
            record("past", "31/05/2024", "1", "1"),
            record("undated", "31-13-2024", "1", "1"),
        ];
        let listing = EventListing::build(records, FilterMode::Strict, today());
        assert_eq!(names(&listing), vec!["active"]);
        assert_eq!(listing.total, 6);
        assert_eq!(listing.active, 3);
    }

    #[test]
    fn test_strict_drops_signed_year() {
        let records = vec![
            record("signed", "01/06/+2024", "1", "1"),
            record("plain", "01/06/2024", "1", "1"),
        ];
        let listing = EventListing::build(records, FilterMode::Strict, today());
        assert_eq!(names(&listing), vec!["plain"]);
    }

    #[test]
    fn test_strict_sorts_by_order_then_date() {
        let records = vec![
            record("a", "10/06/2024", "5", "1"),
            record("b", "20/06/2024", "1", "1"),
            record("c", "15/06/2024", "1", "1"),
        ];
        let listing = EventListing::build(records, FilterMode::Strict, today());
        assert_eq!(names(&listing), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_strict_unordered_events_sink() {
        let records = vec![
            record("unordered", "02/06/2024", "abc", "1"),
            record("late", "30/06/2024", "9998", "1"),
            record("first", "30/06/2024", "1", "1"),
            record("explicit sentinel", "01/06/2024", "9999", "1"),
        ];
        let listing = EventListing::build(records, FilterMode::Strict, today());
        assert_eq!(
            names(&listing),
            vec!["first", "late", "explicit sentinel", "unordered"]
        );
    }

    #[test]
    fn test_diagnostic_keeps_active_in_source_order() {
        let records = vec![
            record("future", "10/06/2024", "5", "1"),
            record("past", "01/01/2020", "1", "1"),
            record("inactive", "10/06/2024", "1", "0"),
            record("undated", "", "1", "1"),
        ];
        let listing = EventListing::build(records, FilterMode::Diagnostic, today());
        assert_eq!(names(&listing), vec!["future", "past", "undated"]);
        assert_eq!(listing.total, 4);
        assert_eq!(listing.active, 3);
    }

    #[test]
    fn test_empty_listing() {
        let listing = EventListing::build(vec![], FilterMode::Strict, today());
        assert!(listing.is_empty());
        assert_eq!(listing.total, 0);
        assert_eq!(listing.active, 0);
    }
}
