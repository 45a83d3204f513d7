//! Mutual exclusion for mutating operations on a backing sheet.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Identity of one backing store: a spreadsheet id plus a tab name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreId {
    pub sheet_id: String,
    pub tab: String,
}

impl StoreId {
    pub fn new(sheet_id: impl Into<String>, tab: impl Into<String>) -> Self {
        Self { sheet_id: sheet_id.into(), tab: tab.into() }
    }
}

impl std::fmt::Display for StoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.sheet_id, self.tab)
    }
}

/// Token held for the whole read-modify-write of one mutation.
///
/// Waiters are woken in FIFO order (tokio's mutex is fair). The token is
/// released when the guard drops, including on error paths.
#[derive(Clone, Default)]
pub struct WriteSerializer {
    token: Arc<Mutex<()>>,
}

pub struct WriteGuard {
    _held: OwnedMutexGuard<()>,
}

impl WriteSerializer {
    pub fn new() -> Self { Self::default() }

    pub async fn acquire(&self) -> WriteGuard {
        WriteGuard { _held: self.token.clone().lock_owned().await }
    }

    /// True while some mutation holds the token.
    pub fn is_held(&self) -> bool {
        self.token.try_lock().is_err()
    }
}

/// One serializer per backing store, shared by every registry that targets it.
#[derive(Clone, Default)]
pub struct WriteLocks {
    stores: Arc<DashMap<StoreId, WriteSerializer>>,
}

impl WriteLocks {
    pub fn new() -> Self { Self::default() }

    pub fn for_store(&self, id: &StoreId) -> WriteSerializer {
        self.stores.entry(id.clone()).or_default().clone()
    }
}
