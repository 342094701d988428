//! Request-keyed cache in front of a `StockPort`, backed by moka.
//!
//! Concurrent reads of the same key share one upstream call: moka runs a
//! single initializer per key and hands its result to every waiter. Keys
//! carry the mutation epoch, so a successful mutation moves every later read
//! onto fresh keys. A read already in flight under the old epoch never joins
//! or feeds a newer one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use crate::domain::error::StockdashError;
use crate::domain::record::{NewStockRecord, StockRecord};
use crate::domain::settings::Settings;
use crate::ports::stock_port::{StockPort, StockQuery};

pub struct CachedStockPort {
    inner: Arc<dyn StockPort>,
    /// Bumped after every successful mutation.
    epoch: AtomicU64,
    lists: Cache<(u64, StockQuery), Arc<Vec<StockRecord>>>,
    codes: Cache<(), Arc<Vec<String>>>,
    records: Cache<(u64, i64), StockRecord>,
}

impl CachedStockPort {
    pub fn new(inner: Arc<dyn StockPort>, max_entries: u64, ttl: Duration) -> Self {
        Self {
            inner,
            epoch: AtomicU64::new(0),
            lists: Cache::builder()
                .max_capacity(max_entries)
                .time_to_live(ttl)
                .build(),
            codes: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
            records: Cache::builder()
                .max_capacity(max_entries)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn from_settings(inner: Arc<dyn StockPort>, settings: &Settings) -> Self {
        Self::new(inner, settings.cache_max_entries, settings.cache_ttl)
    }

    fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    async fn list_shared(
        &self,
        query: &StockQuery,
    ) -> Result<Arc<Vec<StockRecord>>, StockdashError> {
        let key = (self.current_epoch(), query.clone());
        let inner = Arc::clone(&self.inner);
        let upstream = query.clone();
        let list = self
            .lists
            .try_get_with(key.clone(), async move {
                tracing::debug!(query = ?upstream, "stock list cache miss");
                inner.list_stocks(&upstream).await.map(Arc::new)
            })
            .await
            .map_err(unshare)?;
        if self.superseded(key.0) {
            self.lists.invalidate(&key).await;
        }
        Ok(list)
    }

    /// An entry stored under an epoch that has since moved on is unreachable.
    fn superseded(&self, epoch: u64) -> bool {
        let stale = self.current_epoch() != epoch;
        if stale {
            tracing::trace!(epoch, "discarding read that raced a mutation");
        }
        stale
    }

    fn after_mutation(&self) {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(epoch, "invalidating cached stock lists and records");
        self.lists.invalidate_all();
        self.records.invalidate_all();
    }
}

fn unshare(err: Arc<StockdashError>) -> StockdashError {
    Arc::unwrap_or_clone(err)
}

#[async_trait]
impl StockPort for CachedStockPort {
    async fn list_stocks(&self, query: &StockQuery) -> Result<Vec<StockRecord>, StockdashError> {
        self.list_shared(query).await.map(|list| list.as_ref().clone())
    }

    async fn list_trade_codes(&self) -> Result<Vec<String>, StockdashError> {
        let inner = Arc::clone(&self.inner);
        self.codes
            .try_get_with((), async move { inner.list_trade_codes().await.map(Arc::new) })
            .await
            .map(|codes| codes.as_ref().clone())
            .map_err(unshare)
    }

    async fn get_stock(&self, id: i64) -> Result<StockRecord, StockdashError> {
        let key = (self.current_epoch(), id);
        let inner = Arc::clone(&self.inner);
        let record = self
            .records
            .try_get_with(key, async move { inner.get_stock(id).await })
            .await
            .map_err(unshare)?;
        if self.superseded(key.0) {
            self.records.invalidate(&key).await;
        }
        Ok(record)
    }

    async fn create_stock(&self, stock: &NewStockRecord) -> Result<StockRecord, StockdashError> {
        let created = self.inner.create_stock(stock).await?;
        self.after_mutation();
        Ok(created)
    }

    async fn update_stock(&self, id: i64, stock: &StockRecord) -> Result<StockRecord, StockdashError> {
        let updated = self.inner.update_stock(id, stock).await?;
        self.after_mutation();
        Ok(updated)
    }

    async fn delete_stock(&self, id: i64) -> Result<(), StockdashError> {
        self.inner.delete_stock(id).await?;
        self.after_mutation();
        Ok(())
    }
}
