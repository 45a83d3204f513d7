//! The players list as seen through the backing sheet.
//!
//! Nothing is cached: every operation reads the column fresh, and mutations
//! derive physical row numbers from a read taken while holding the store's
//! write token.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::normalize::{canonicalize, compare_key, is_header_sentinel};
use super::serializer::WriteSerializer;
use crate::sheets::{GatewayError, SheetsGateway};

pub type PlayersList = Vec<String>;

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("Missing name")]
    MissingName,
    #[error("\"{0}\" is reserved for the column header")]
    ReservedName(String),
    #[error(transparent)]
    Store(#[from] GatewayError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddOutcome {
    pub added: bool,
    pub players: PlayersList,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub deleted_count: usize,
    pub players: PlayersList,
}

/// Blank and header rows dropped, names canonicalized, first occurrence of
/// each comparison key kept.
pub fn players_from_rows(rows: &[String]) -> PlayersList {
    let mut seen = HashSet::new();
    rows.iter()
        .map(|raw| canonicalize(raw))
        .filter(|name| !name.is_empty() && !is_header_sentinel(name))
        .filter(|name| seen.insert(name.to_lowercase()))
        .collect()
}

/// 1-indexed rows whose key equals `key`, highest first.
pub fn matching_rows(rows: &[String], key: &str) -> Vec<u32> {
    let mut hits: Vec<u32> = rows
        .iter()
        .enumerate()
        .filter(|(_, cell)| !is_header_sentinel(cell) && compare_key(cell) == key)
        .map(|(i, _)| i as u32 + 1)
        .collect();
    hits.sort_unstable_by(|a, b| b.cmp(a));
    hits
}

pub struct PlayersRegistry {
    gateway: Arc<dyn SheetsGateway>,
    writes: WriteSerializer,
    call_timeout: Duration,
}

impl PlayersRegistry {
    pub fn new(
        gateway: Arc<dyn SheetsGateway>,
        writes: WriteSerializer,
        call_timeout: Duration,
    ) -> Self {
        Self { gateway, writes, call_timeout }
    }

    pub async fn list_all(&self) -> Result<PlayersList, RegistryError> {
        let rows = self.read_rows().await?;
        Ok(players_from_rows(&rows))
    }

    /// Append `raw_name` unless a player with the same key already exists.
    pub async fn add(&self, raw_name: &str) -> Result<AddOutcome, RegistryError> {
        let name = validated(raw_name)?;
        let key = name.to_lowercase();

        let _token = self.writes.acquire().await;
        let current = players_from_rows(&self.read_rows().await?);
        if current.iter().any(|p| p.to_lowercase() == key) {
            tracing::info!(store = %self.gateway.store_id(), %name, "player already listed");
            return Ok(AddOutcome { added: false, players: current });
        }

        self.bounded(self.gateway.append_row(&name)).await?;
        let players = players_from_rows(&self.read_rows().await?);
        if !players.iter().any(|p| p.to_lowercase() == key) {
            let why = format!("appended \"{name}\" but it is not visible on re-read");
            return Err(GatewayError::Unavailable(why).into());
        }
        let store = self.gateway.store_id();
        tracing::info!(%store, %name, count = players.len(), "player added");
        Ok(AddOutcome { added: true, players })
    }

    /// Delete every row whose key matches `raw_name`.
    pub async fn delete_all_matching(
        &self,
        raw_name: &str,
    ) -> Result<DeleteOutcome, RegistryError> {
        let name = canonicalize(raw_name);
        if name.is_empty() {
            return Err(RegistryError::MissingName);
        }
        let key = name.to_lowercase();

        let _token = self.writes.acquire().await;
        let rows = self.read_rows().await?;
        let targets = matching_rows(&rows, &key);
        if targets.is_empty() {
            return Ok(DeleteOutcome { deleted_count: 0, players: players_from_rows(&rows) });
        }

        self.bounded(self.gateway.delete_rows(&targets)).await?;
        let after = self.read_rows().await?;
        if !matching_rows(&after, &key).is_empty() {
            let why = format!("rows matching \"{name}\" still present after delete");
            return Err(GatewayError::Unavailable(why).into());
        }
        let store = self.gateway.store_id();
        tracing::info!(%store, %name, deleted = targets.len(), "players deleted");
        Ok(DeleteOutcome { deleted_count: targets.len(), players: players_from_rows(&after) })
    }

    async fn read_rows(&self) -> Result<Vec<String>, GatewayError> {
        self.bounded(self.gateway.read_column()).await
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, GatewayError>>,
    ) -> Result<T, GatewayError> {
        tokio::time::timeout(self.call_timeout, call)
            .await
            .map_err(|_| GatewayError::Timeout(self.call_timeout))?
    }
}

fn validated(raw: &str) -> Result<String, RegistryError> {
    let name = canonicalize(raw);
    if name.is_empty() {
        return Err(RegistryError::MissingName);
    }
    if is_header_sentinel(&name) {
        return Err(RegistryError::ReservedName(name));
    }
    Ok(name)
}
