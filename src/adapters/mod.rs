//! Concrete adapter implementations for ports, plus presentation.

pub mod chart_svg;
pub mod file_config_adapter;
pub mod http_gateway;
pub mod query_cache;
pub mod session;
pub mod terminal;
#[cfg(feature = "web")]
pub mod web;

use std::sync::Arc;

use crate::domain::error::StockdashError;
use crate::domain::settings::Settings;
use crate::ports::stock_port::StockPort;

use self::http_gateway::HttpStockGateway;
use self::query_cache::CachedStockPort;

/// Backend gateway for `settings`, behind the query cache unless disabled.
pub fn connect(settings: &Settings) -> Result<Arc<dyn StockPort>, StockdashError> {
    let gateway: Arc<dyn StockPort> = Arc::new(HttpStockGateway::new(settings)?);
    if !settings.cache_enabled {
        tracing::debug!(base_url = %settings.base_url, "query cache disabled");
        return Ok(gateway);
    }
    Ok(Arc::new(CachedStockPort::from_settings(gateway, settings)))
}
