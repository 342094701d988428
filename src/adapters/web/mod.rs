//! Web server adapter.
//!
//! Axum server with an htmx-enhanced frontend for browsing and editing stock
//! records. Dashboard state lives in the query string, so every request is
//! self-contained.

mod error;
mod handlers;
pub mod params;
mod templates;

pub use error::WebError;
pub use handlers::*;

use std::sync::Arc;

use askama::Template;
use axum::{
    Router,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::domain::settings::Settings;
use crate::ports::stock_port::StockPort;

use templates::BasePage;

pub struct AppState {
    pub stocks: Arc<dyn StockPort>,
    pub settings: Settings,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::dashboard))
        .route(
            "/create-stock",
            get(handlers::create_form).post(handlers::create_stock),
        )
        .route("/stocks/{id}", post(handlers::update_stock))
        .route(
            "/stocks/{id}/delete",
            get(handlers::confirm_delete).post(handlers::delete_stock),
        )
        .nest_service("/static", ServeDir::new("static"))
        .fallback(handlers::not_found)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(Arc::new(state))
}

fn is_htmx_request(headers: &HeaderMap) -> bool {
    headers.get("HX-Request").is_some()
}

/// htmx requests get the bare fragment; everything else the full page.
fn render_page(
    status: StatusCode,
    title: &str,
    content: &impl Template,
    headers: &HeaderMap,
) -> Result<Response, WebError> {
    let fragment = content.render()?;
    if is_htmx_request(headers) {
        return Ok((status, Html(fragment)).into_response());
    }
    let page = BasePage {
        title,
        content: &fragment,
    }
    .render()?;
    Ok((status, Html(page)).into_response())
}
