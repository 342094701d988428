//! `StockPort` over the backend's REST API using reqwest.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::domain::error::StockdashError;
use crate::domain::record::{NewStockRecord, StockRecord};
use crate::domain::settings::Settings;
use crate::ports::stock_port::{StockPort, StockQuery};

#[derive(Debug, Clone)]
pub struct HttpStockGateway {
    http: Client,
    base_url: String,
}

impl HttpStockGateway {
    pub fn new(settings: &Settings) -> Result<Self, StockdashError> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("stockdash/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(transport)?;
        Ok(Self {
            http,
            base_url: settings.base_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, StockdashError> {
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), body = %body, "backend rejected request");
        Err(StockdashError::Server {
            status: status.as_u16(),
            message: server_message(status, &body),
        })
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, StockdashError> {
        let response = self.send(request).await?;
        response.json::<T>().await.map_err(|e| StockdashError::Decode {
            reason: e.to_string(),
        })
    }
}

/// FastAPI-style `{"detail": ...}` bodies are unwrapped; anything else is
/// passed through, falling back to the status reason.
fn server_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(detail) = value.get("detail") {
            return match detail.as_str() {
                Some(s) => s.to_string(),
                None => detail.to_string(),
            };
        }
    }
    let body = body.trim();
    if body.is_empty() {
        status.canonical_reason().unwrap_or("error").to_string()
    } else {
        body.to_string()
    }
}

fn transport(err: reqwest::Error) -> StockdashError {
    StockdashError::Transport {
        reason: err.to_string(),
    }
}

fn not_found_as(id: i64, err: StockdashError) -> StockdashError {
    match err {
        StockdashError::Server { status: 404, .. } => StockdashError::NotFound { id },
        other => other,
    }
}

#[async_trait]
impl StockPort for HttpStockGateway {
    async fn list_stocks(&self, query: &StockQuery) -> Result<Vec<StockRecord>, StockdashError> {
        tracing::debug!(?query, "GET /stocks");
        let mut params = vec![
            ("skip", query.skip.to_string()),
            ("limit", query.limit.to_string()),
        ];
        if let Some(code) = &query.trade_code {
            params.push(("trade_code", code.clone()));
        }
        self.json(self.http.get(self.url("/stocks")).query(&params))
            .await
    }

    async fn list_trade_codes(&self) -> Result<Vec<String>, StockdashError> {
        tracing::debug!("GET /stocks/trade-codes");
        self.json(self.http.get(self.url("/stocks/trade-codes"))).await
    }

    async fn get_stock(&self, id: i64) -> Result<StockRecord, StockdashError> {
        tracing::debug!(id, "GET /stocks/{{id}}");
        self.json(self.http.get(self.url(&format!("/stocks/{id}"))))
            .await
            .map_err(|e| not_found_as(id, e))
    }

    async fn create_stock(&self, stock: &NewStockRecord) -> Result<StockRecord, StockdashError> {
        tracing::debug!(trade_code = %stock.trade_code, date = %stock.date, "POST /stocks");
        self.json(self.http.post(self.url("/stocks")).json(stock)).await
    }

    async fn update_stock(&self, id: i64, stock: &StockRecord) -> Result<StockRecord, StockdashError> {
        tracing::debug!(id, "PUT /stocks/{{id}}");
        self.json(self.http.put(self.url(&format!("/stocks/{id}"))).json(stock))
            .await
            .map_err(|e| not_found_as(id, e))
    }

    async fn delete_stock(&self, id: i64) -> Result<(), StockdashError> {
        tracing::debug!(id, "DELETE /stocks/{{id}}");
        self.send(self.http.delete(self.url(&format!("/stocks/{id}"))))
            .await
            .map_err(|e| not_found_as(id, e))?;
        Ok(())
    }
}
