//! HTTP error responses for the web adapter.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::domain::error::StockdashError;

use super::templates::{BasePage, ErrorTemplate};

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

pub fn status_from_error(err: &StockdashError) -> StatusCode {
    match err {
        StockdashError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        StockdashError::NotFound { .. } => StatusCode::NOT_FOUND,
        StockdashError::Transport { .. }
        | StockdashError::Server { .. }
        | StockdashError::Decode { .. } => StatusCode::BAD_GATEWAY,
        StockdashError::ConfigParse { .. } | StockdashError::ConfigInvalid { .. } => {
            StatusCode::BAD_REQUEST
        }
        StockdashError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<StockdashError> for WebError {
    fn from(err: StockdashError) -> Self {
        Self::new(status_from_error(&err), err.to_string())
    }
}

impl From<askama::Error> for WebError {
    fn from(err: askama::Error) -> Self {
        tracing::error!(error = %err, "template rendering failed");
        Self::internal("failed to render page")
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!(status = self.status.as_u16(), message = %self.message, "request failed");
        }
        let fragment = ErrorTemplate {
            message: &self.message,
            status: self.status.as_u16(),
        };
        let page = fragment.render().and_then(|content| {
            BasePage {
                title: "Error",
                content: &content,
            }
            .render()
        });
        match page {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(_) => (self.status, self.message).into_response(),
        }
    }
}
