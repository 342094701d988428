//! Remote stock store port trait.

use async_trait::async_trait;

use crate::domain::error::StockdashError;
use crate::domain::record::{NewStockRecord, StockRecord};

/// Parameters of a list request. Also the cache key for list results.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StockQuery {
    pub skip: u32,
    pub limit: u32,
    pub trade_code: Option<String>,
}

impl Default for StockQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: 10,
            trade_code: None,
        }
    }
}

impl StockQuery {
    pub fn first(limit: u32, trade_code: Option<&str>) -> Self {
        Self {
            skip: 0,
            limit,
            trade_code: trade_code.map(str::to_string),
        }
    }
}

#[async_trait]
pub trait StockPort: Send + Sync {
    async fn list_stocks(&self, query: &StockQuery) -> Result<Vec<StockRecord>, StockdashError>;

    async fn list_trade_codes(&self) -> Result<Vec<String>, StockdashError>;

    async fn get_stock(&self, id: i64) -> Result<StockRecord, StockdashError>;

    async fn create_stock(&self, stock: &NewStockRecord) -> Result<StockRecord, StockdashError>;

    async fn update_stock(&self, id: i64, stock: &StockRecord) -> Result<StockRecord, StockdashError>;

    async fn delete_stock(&self, id: i64) -> Result<(), StockdashError>;
}
