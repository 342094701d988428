#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use stockdash::domain::error::StockdashError;
use stockdash::domain::record::{NewStockRecord, StockRecord};
use stockdash::ports::stock_port::{StockPort, StockQuery};

/// In-memory backend. Counts calls per operation and can be told to fail.
pub struct MockStockPort {
    pub records: Mutex<Vec<StockRecord>>,
    pub codes: Vec<String>,
    pub delay: Duration,
    /// Sleep after a list snapshot is taken, before it is returned.
    pub list_lag: Duration,
    pub failing: Mutex<HashSet<&'static str>>,
    pub list_calls: AtomicUsize,
    pub code_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub last_query: Mutex<Option<StockQuery>>,
}

impl MockStockPort {
    pub fn new(records: Vec<StockRecord>) -> Self {
        let mut codes: Vec<String> = records.iter().map(|r| r.trade_code.clone()).collect();
        codes.sort();
        codes.dedup();
        Self {
            records: Mutex::new(records),
            codes,
            delay: Duration::ZERO,
            list_lag: Duration::ZERO,
            failing: Mutex::new(HashSet::new()),
            list_calls: AtomicUsize::new(0),
            code_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_list_lag(mut self, lag: Duration) -> Self {
        self.list_lag = lag;
        self
    }

    /// Make `op` (`list`, `codes`, `get`, `create`, `update`, `delete`) fail.
    pub fn failing(self, op: &'static str) -> Self {
        self.failing.lock().unwrap().insert(op);
        self
    }

    pub fn recover(&self, op: &'static str) {
        self.failing.lock().unwrap().remove(op);
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    async fn enter(&self, op: &'static str, counter: &AtomicUsize) -> Result<(), StockdashError> {
        counter.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.lock().unwrap().contains(op) {
            return Err(StockdashError::Server {
                status: 500,
                message: format!("{op} failed"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StockPort for MockStockPort {
    async fn list_stocks(&self, query: &StockQuery) -> Result<Vec<StockRecord>, StockdashError> {
        self.enter("list", &self.list_calls).await?;
        *self.last_query.lock().unwrap() = Some(query.clone());
        let snapshot: Vec<StockRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| query.trade_code.as_deref().is_none_or(|c| r.trade_code == c))
            .skip(query.skip as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();
        if !self.list_lag.is_zero() {
            tokio::time::sleep(self.list_lag).await;
        }
        Ok(snapshot)
    }

    async fn list_trade_codes(&self) -> Result<Vec<String>, StockdashError> {
        self.enter("codes", &self.code_calls).await?;
        Ok(self.codes.clone())
    }

    async fn get_stock(&self, id: i64) -> Result<StockRecord, StockdashError> {
        self.enter("get", &self.get_calls).await?;
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StockdashError::NotFound { id })
    }

    async fn create_stock(&self, stock: &NewStockRecord) -> Result<StockRecord, StockdashError> {
        self.enter("create", &self.create_calls).await?;
        let mut records = self.records.lock().unwrap();
        let id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let created = StockRecord {
            id,
            date: stock.date.clone(),
            trade_code: stock.trade_code.clone(),
            high: stock.high.to_string(),
            low: stock.low.to_string(),
            open: stock.open.to_string(),
            close: stock.close.to_string(),
            volume: stock.volume.to_string(),
        };
        records.insert(0, created.clone());
        Ok(created)
    }

    async fn update_stock(&self, id: i64, stock: &StockRecord) -> Result<StockRecord, StockdashError> {
        self.enter("update", &self.update_calls).await?;
        let mut records = self.records.lock().unwrap();
        let slot = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StockdashError::NotFound { id })?;
        *slot = StockRecord { id, ..stock.clone() };
        Ok(slot.clone())
    }

    async fn delete_stock(&self, id: i64) -> Result<(), StockdashError> {
        self.enter("delete", &self.delete_calls).await?;
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(StockdashError::NotFound { id });
        }
        Ok(())
    }
}

pub fn make_record(id: i64, code: &str, date: &str, close: f64, volume: i64) -> StockRecord {
    StockRecord {
        id,
        date: date.to_string(),
        trade_code: code.to_string(),
        high: format!("{:.2}", close + 1.0),
        low: format!("{:.2}", close - 1.0),
        open: format!("{close:.2}"),
        close: format!("{close:.2}"),
        volume: volume.to_string(),
    }
}

/// `count` daily records for `code`, newest first, closes rising by 0.5.
pub fn generate_records(code: &str, first_id: i64, count: usize) -> Vec<StockRecord> {
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..count)
        .rev()
        .map(|i| {
            let date = start + chrono::Duration::days(i as i64);
            make_record(
                first_id + i as i64,
                code,
                &date.format("%Y-%m-%d").to_string(),
                10.0 + 0.5 * i as f64,
                1000 + 10 * i as i64,
            )
        })
        .collect()
}
