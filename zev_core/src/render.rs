//! HTML rendering of event listings and error states.

use minijinja::{context, Environment};

use crate::event::EventListing;

static BASE_TEMPLATE: &str = include_str!("../templates/base.html");
static EVENTS_TEMPLATE: &str = include_str!("../templates/events.html");
static ERROR_TEMPLATE: &str = include_str!("../templates/error.html");

/// The templates are named `*.html`, so every value is HTML escaped.
fn environment() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template("base.html", BASE_TEMPLATE)?;
    env.add_template("events.html", EVENTS_TEMPLATE)?;
    env.add_template("error.html", ERROR_TEMPLATE)?;
    Ok(env)
}

/// Render the page listing `listing`'s events, or the empty state if there are none.
pub fn events_page(listing: &EventListing) -> Result<String, minijinja::Error> {
    let env = environment()?;
    let tmpl = env.get_template("events.html")?;
    tmpl.render(context! {
        listing => listing
    })
}

/// Render an error page shown instead of the listing.
pub fn error_page(title: &str, message: &str) -> Result<String, minijinja::Error> {
    let env = environment()?;
    let tmpl = env.get_template("error.html")?;
    tmpl.render(context! {
        title => title,
        message => message
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::NaiveDate;

    use crate::{
        event::{EventListing, EventRecord, FilterMode},
        render::{error_page, events_page},
    };

    fn record(name: &str, status: &str) -> EventRecord {
        EventRecord {
            id: Some(String::from("1")),
            name: name.to_string(),
            raw_date: String::from("15/06/2024"),
            parsed_date: NaiveDate::from_str("2024-06-15").ok(),
            hour: String::from("18:00"),
            location: String::from("Café & Bar"),
            display_order: 1,
            status_flag: status.to_string(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_str("2024-06-01").unwrap()
    }

    #[test]
    fn test_events_page() {
        let listing = EventListing::build(
            vec![record("Summer <party>", "1")],
            FilterMode::Strict,
            today(),
        );
        let html = events_page(&listing).unwrap();
        assert!(html.contains("Summer &lt;party&gt;"));
        assert!(html.contains("Café &amp; Bar"));
        assert!(html.contains("18:00"));
        assert!(!html.contains("no active upcoming events"));
        assert!(!html.contains("Cards received"));
    }

    #[test]
    fn test_events_page_empty() {
        let listing = EventListing::build(vec![record("x", "0")], FilterMode::Strict, today());
        let html = events_page(&listing).unwrap();
        assert!(html.contains("There are no active upcoming events right now."));
    }

    #[test]
    fn test_events_page_diagnostic() {
        let listing = EventListing::build(
            vec![record("a", "1"), record("b", "0"), record("c", "1")],
            FilterMode::Diagnostic,
            today(),
        );
        let html = events_page(&listing).unwrap();
        assert!(html.contains("Cards received: 3 | active: 2"));
    }

    #[test]
    fn test_error_page() {
        let html = error_page("The CRM is unavailable", "status <502>").unwrap();
        assert!(html.contains("<title>The CRM is unavailable</title>"));
        assert!(html.contains("status &lt;502&gt;"));
    }
}
