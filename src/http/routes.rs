//! HTTP routes: random picks, players admin, health.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::{FromRequest, Query, Request, State};
use axum::http::header::{self, HeaderMap, HeaderName};
use axum::response::IntoResponse;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::catches::{self, CatchFeed, CatchMode, CsvFeed};
use crate::config::Config;
use crate::error::AppError;
use crate::images::{self, ImageKind, ImageLibrary};
use crate::players::{AddOutcome, DeleteOutcome, PlayersRegistry, StoreId, WriteLocks};
use crate::random::{self, DEFAULT_REWARD_RATE};
use crate::sheets::auth::TokenSource;
use crate::sheets::GoogleSheets;

/// A collaborator that may be absent from the configuration.
#[derive(Clone)]
pub enum Dependency<T> {
    Ready(T),
    Missing(String),
}

impl<T> Dependency<T> {
    fn get(&self) -> Result<&T, String> {
        match self {
            Dependency::Ready(v) => Ok(v),
            Dependency::Missing(why) => Err(why.clone()),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub players: Dependency<Arc<PlayersRegistry>>,
    pub catches: Dependency<Arc<dyn CatchFeed>>,
    pub images: ImageLibrary,
    pub static_dir: PathBuf,
    pub touchdown_rate: f64,
    pub write_locks: WriteLocks,
}

impl AppState {
    /// State with no players sheet and no catch feed wired in.
    pub fn new(static_dir: impl Into<PathBuf>) -> Self {
        let static_dir = static_dir.into();
        Self {
            players: Dependency::Missing("players sheet not configured".into()),
            catches: Dependency::Missing("catch feed not configured".into()),
            images: ImageLibrary::new(static_dir.join("images")),
            static_dir,
            touchdown_rate: DEFAULT_REWARD_RATE,
            write_locks: WriteLocks::new(),
        }
    }

    pub fn with_players(mut self, registry: Arc<PlayersRegistry>) -> Self {
        self.players = Dependency::Ready(registry);
        self
    }

    pub fn with_catches(mut self, feed: Arc<dyn CatchFeed>) -> Self {
        self.catches = Dependency::Ready(feed);
        self
    }

    pub fn with_touchdown_rate(mut self, rate: f64) -> Self {
        self.touchdown_rate = rate;
        self
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .user_agent(concat!("catch-roulette/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;

        let mut state = Self::new(&config.static_dir).with_touchdown_rate(config.touchdown_rate);

        match &config.players {
            Ok(sheet) => {
                let store = StoreId::new(&sheet.sheet_id, &sheet.tab);
                let auth = TokenSource::new(http.clone(), sheet.account.clone());
                let gateway = GoogleSheets::new(http.clone(), auth, store.clone());
                // one gateway call may chain token exchange, tab lookup and the request
                let call_timeout = config.upstream_timeout * 3;
                let writes = state.write_locks.for_store(&store);
                let registry = PlayersRegistry::new(Arc::new(gateway), writes, call_timeout);
                tracing::info!(%store, "players sheet configured");
                state = state.with_players(Arc::new(registry));
            }
            Err(e) => {
                tracing::warn!(error = %e, "players routes disabled");
                state.players = Dependency::Missing(e.to_string());
            }
        }

        match &config.catches {
            Ok(feed) => {
                tracing::info!(column = %feed.column, "catch feed configured");
                state = state.with_catches(Arc::new(CsvFeed::new(http, &feed.url, &feed.column)));
            }
            Err(e) => {
                tracing::warn!(error = %e, "catch route disabled");
                state.catches = Dependency::Missing(e.to_string());
            }
        }

        Ok(state)
    }

    fn registry(&self) -> Result<&Arc<PlayersRegistry>, AppError> {
        self.players.get().map_err(AppError::BackingStore)
    }
}

const NO_STORE: [(HeaderName, &str); 3] = [
    (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate, proxy-revalidate"),
    (header::PRAGMA, "no-cache"),
    (header::EXPIRES, "0"),
];

pub async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

pub async fn random_player(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let players = state.registry()?.list_all().await?;
    let name = random::uniform(&players)
        .map_err(|_| AppError::EmptySequence("No players found".into()))?;
    Ok((NO_STORE, Json(json!({ "name": name }))))
}

#[derive(Deserialize)]
pub struct CatchQuery {
    pub mode: Option<String>,
}

pub async fn random_catch(
    State(state): State<AppState>,
    Query(CatchQuery { mode }): Query<CatchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mode = CatchMode::parse(mode.as_deref()).ok_or_else(|| {
        let given = mode.as_deref().unwrap_or_default();
        AppError::InvalidInput(format!("Unknown mode: {given} (expected normal or sb)"))
    })?;
    let feed = state.catches.get().map_err(AppError::FeedUnavailable)?;
    let entries = feed.catches().await?;
    let pick = catches::pick_catch(&entries, mode, state.touchdown_rate)
        .map_err(|_| AppError::EmptySequence("No catches found".into()))?;
    tracing::debug!(?mode, pool = entries.len(), "catch picked");
    Ok((NO_STORE, Json(json!({ "catch": pick }))))
}

#[derive(Deserialize)]
pub struct ImageQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub n: Option<String>,
}

pub async fn random_image(
    State(state): State<AppState>,
    Query(q): Query<ImageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let url = state.images.pick_url(ImageKind::from_query(q.kind.as_deref())).await?;
    Ok((NO_STORE, Json(json!({ "url": url }))))
}

pub async fn random_image_batch(
    State(state): State<AppState>,
    Query(q): Query<ImageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let kind = ImageKind::from_query(q.kind.as_deref());
    let urls = state.images.pick_urls(kind, images::batch_size(q.n.as_deref())).await?;
    Ok((NO_STORE, Json(json!({ "urls": urls }))))
}

#[derive(Deserialize)]
struct NameBody {
    name: Option<String>,
}

fn has_form_body(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"))
}

/// `name` from a JSON or url-encoded body; anything unreadable counts as a
/// missing name.
async fn requested_name(req: Request) -> Result<String, AppError> {
    let body = if has_form_body(req.headers()) {
        Form::<NameBody>::from_request(req, &()).await.ok().map(|Form(b)| b)
    } else {
        Bytes::from_request(req, &())
            .await
            .ok()
            .and_then(|bytes| serde_json::from_slice::<NameBody>(&bytes).ok())
    };
    body.and_then(|b| b.name)
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("Missing name".into()))
}

#[derive(Serialize)]
pub struct AddResponse {
    ok: bool,
    #[serde(flatten)]
    outcome: AddOutcome,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    ok: bool,
    #[serde(flatten)]
    outcome: DeleteOutcome,
}

pub async fn list_players(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let players = state.registry()?.list_all().await?;
    Ok(Json(json!({ "players": players })))
}

pub async fn add_player(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<AddResponse>, AppError> {
    let name = requested_name(req).await?;
    let outcome = state.registry()?.add(&name).await?;
    Ok(Json(AddResponse { ok: true, outcome }))
}

pub async fn delete_player(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<DeleteResponse>, AppError> {
    let name = requested_name(req).await?;
    let outcome = state.registry()?.delete_all_matching(&name).await?;
    Ok(Json(DeleteResponse { ok: true, outcome }))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;

    async fn name_from(
        content_type: Option<&str>,
        body: &'static str,
    ) -> Result<String, AppError> {
        let mut req = Request::builder().method("POST").uri("/api/admin/receiver-players");
        if let Some(ct) = content_type {
            req = req.header(header::CONTENT_TYPE, ct);
        }
        requested_name(req.body(Body::from(body)).unwrap()).await
    }

    #[tokio::test]
    async fn name_from_json_body() {
        let json = Some("application/json");
        assert_eq!(name_from(json, r#"{"name":"Cole"}"#).await.unwrap(), "Cole");
        assert!(name_from(json, r#"{"name":"   "}"#).await.is_err());
        assert!(name_from(json, "{}").await.is_err());
        assert!(name_from(None, "").await.is_err());
    }

    #[tokio::test]
    async fn name_from_url_encoded_body() {
        let form = Some("application/x-www-form-urlencoded; charset=UTF-8");
        assert_eq!(name_from(form, "name=Amon-Ra+St.+Brown").await.unwrap(), "Amon-Ra St. Brown");
        assert!(name_from(form, "name=").await.is_err());
        assert!(name_from(form, "team=DET").await.is_err());
        // without the form content type the body is read as JSON
        assert!(name_from(None, "name=Cole").await.is_err());
    }

    #[tokio::test]
    async fn cloned_state_shares_its_write_locks() {
        let state = AppState::new("public");
        let store = StoreId::new("sheet", "Players");
        let _guard = state.write_locks.for_store(&store).acquire().await;
        assert!(state.clone().write_locks.for_store(&store).is_held());
        assert!(!AppState::new("public").write_locks.for_store(&store).is_held());
    }

    #[test]
    fn unconfigured_state_reports_why() {
        let state = AppState::new("public");
        let err = state.registry().err().unwrap();
        assert!(matches!(err, AppError::BackingStore(m) if m.contains("not configured")));
    }
}
