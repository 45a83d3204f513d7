//! In-process sheet with the same row semantics as the remote one.
//!
//! Every call yields to the scheduler (plus an optional latency) before
//! touching the rows, so unsynchronized read-then-write sequences really do
//! interleave under concurrency.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::gateway::{GatewayError, SheetsGateway};
use crate::players::serializer::StoreId;

pub struct MemorySheet {
    store: StoreId,
    rows: Mutex<Vec<String>>,
    latency: Duration,
    offline: AtomicBool,
    stalled: AtomicBool,
    dropping_writes: AtomicBool,
    appends: AtomicUsize,
    deletes: AtomicUsize,
}

impl MemorySheet {
    pub fn new<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            store: StoreId::new("memory", "Players"),
            rows: Mutex::new(rows.into_iter().map(Into::into).collect()),
            latency: Duration::ZERO,
            offline: AtomicBool::new(false),
            stalled: AtomicBool::new(false),
            dropping_writes: AtomicBool::new(false),
            appends: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    pub fn with_store(mut self, store: StoreId) -> Self {
        self.store = store;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make every call fail as if the backend were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make every call hang forever.
    pub fn set_stalled(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }

    /// Acknowledge appends and deletes without applying them.
    pub fn set_dropping_writes(&self, dropping: bool) {
        self.dropping_writes.store(dropping, Ordering::SeqCst);
    }

    fn drops_writes(&self) -> bool {
        self.dropping_writes.load(Ordering::SeqCst)
    }

    pub fn rows(&self) -> Vec<String> {
        self.rows.lock().clone()
    }

    pub fn append_calls(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    async fn round_trip(&self) -> Result<(), GatewayError> {
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable(format!("{} is offline", self.store)));
        }
        Ok(())
    }
}

#[async_trait]
impl SheetsGateway for MemorySheet {
    fn store_id(&self) -> &StoreId { &self.store }

    async fn read_column(&self) -> Result<Vec<String>, GatewayError> {
        self.round_trip().await?;
        Ok(self.rows())
    }

    async fn append_row(&self, value: &str) -> Result<(), GatewayError> {
        self.round_trip().await?;
        self.appends.fetch_add(1, Ordering::SeqCst);
        if self.drops_writes() {
            return Ok(());
        }
        let mut rows = self.rows.lock();
        // append lands after the last non-empty row, like the remote API
        let end = rows.iter().rposition(|r| !r.trim().is_empty()).map_or(0, |i| i + 1);
        rows.truncate(end);
        rows.push(value.to_string());
        Ok(())
    }

    async fn delete_rows(&self, targets: &[u32]) -> Result<(), GatewayError> {
        self.round_trip().await?;
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.drops_writes() {
            return Ok(());
        }
        let mut rows = self.rows.lock();
        if let Some(bad) = targets.iter().find(|&&r| r == 0 || r as usize > rows.len()) {
            let body = format!("row {bad} out of range");
            return Err(GatewayError::Status { status: 400, body });
        }
        for &row in targets {
            rows.remove(row as usize - 1);
        }
        Ok(())
    }

    async fn clear_column(&self) -> Result<(), GatewayError> {
        self.round_trip().await?;
        self.rows.lock().clear();
        Ok(())
    }
}
