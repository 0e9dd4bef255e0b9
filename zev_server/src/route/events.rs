use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;
use zev_core::{event::EventListing, render, zebra_client, ZebraConfig, ZebraError};

static RENDER_FAILED: &str = "<!doctype html><title>Error</title><p>The page could not be rendered.</p>";

/// Handle requests for the event page.
///
/// The events are fetched from the CRM on every request.
pub async fn handler(State(config): State<Arc<ZebraConfig>>) -> Response {
    let today = chrono::Local::now().date_naive();
    page(zebra_client::get(&config, today).await).into_response()
}

/// Render the outcome of a fetch, mapping each kind of failure to its own status.
fn page(result: Result<EventListing, ZebraError>) -> (StatusCode, Html<String>) {
    let (status, rendered) = match result {
        Ok(listing) => (StatusCode::OK, render::events_page(&listing)),
        Err(err) => {
            error!("could not load events: {err}");
            let (status, title) = failure(&err);
            (status, render::error_page(title, &err.to_string()))
        }
    };
    match rendered {
        Ok(html) => (status, Html(html)),
        Err(err) => {
            error!("could not render the page: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(String::from(RENDER_FAILED)),
            )
        }
    }
}

fn failure(err: &ZebraError) -> (StatusCode, &'static str) {
    match err {
        ZebraError::Config(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "The event service is not configured",
        ),
        _ if err.is_timeout() => (
            StatusCode::GATEWAY_TIMEOUT,
            "The CRM did not answer in time",
        ),
        ZebraError::Transport(_) | ZebraError::Status(_) => {
            (StatusCode::BAD_GATEWAY, "The CRM is unavailable")
        }
    }
}
