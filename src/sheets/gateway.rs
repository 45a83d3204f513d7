//! Range-addressed access to the single-column players tab.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;

use super::auth::TokenSource;
use crate::players::serializer::StoreId;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    #[error("spreadsheet request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("spreadsheet API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("tab not found: {0}")]
    TabNotFound(String),
    #[error("spreadsheet call timed out after {0:?}")]
    Timeout(Duration),
    #[error("backing store unavailable: {0}")]
    Unavailable(String),
}

/// Row operations on column A of one tab. Row numbers are 1-indexed.
#[async_trait]
pub trait SheetsGateway: Send + Sync {
    fn store_id(&self) -> &StoreId;

    /// Every row of the column, header included. Blank cells come back as
    /// empty strings so that `rows[i]` is row `i + 1`.
    async fn read_column(&self) -> Result<Vec<String>, GatewayError>;

    /// Append one row after the last non-empty row.
    async fn append_row(&self, value: &str) -> Result<(), GatewayError>;

    /// Delete whole rows, one at a time, in the order given. Each deletion
    /// shifts later rows up, so callers pass rows highest-first.
    async fn delete_rows(&self, rows: &[u32]) -> Result<(), GatewayError>;

    /// Blank every cell of the column, header included.
    async fn clear_column(&self) -> Result<(), GatewayError>;
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<Sheet>,
}

#[derive(Deserialize)]
struct Sheet {
    properties: SheetProperties,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

/// `batchUpdate` body removing each 1-indexed row in the order given.
fn delete_requests(tab_id: i64, rows: &[u32]) -> serde_json::Value {
    let requests: Vec<_> = rows
        .iter()
        .map(|&row| {
            json!({
                "deleteDimension": {
                    "range": {
                        "sheetId": tab_id,
                        "dimension": "ROWS",
                        "startIndex": row - 1,
                        "endIndex": row,
                    }
                }
            })
        })
        .collect();
    json!({ "requests": requests })
}

/// Google Sheets v4 implementation, authenticated with a service account.
pub struct GoogleSheets {
    http: reqwest::Client,
    auth: TokenSource,
    store: StoreId,
}

impl GoogleSheets {
    pub fn new(http: reqwest::Client, auth: TokenSource, store: StoreId) -> Self {
        Self { http, auth, store }
    }

    fn column_range(&self) -> String {
        format!("{}!A:A", self.store.tab)
    }

    fn url(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url =
            Url::parse(SHEETS_API).map_err(|e| GatewayError::Unavailable(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| GatewayError::Unavailable("sheets endpoint cannot be a base".into()))?
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, GatewayError> {
        let token = self.auth.access_token().await?;
        let resp = req.bearer_auth(token).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(GatewayError::Status { status: status.as_u16(), body })
    }

    async fn tab_id(&self) -> Result<i64, GatewayError> {
        let url = self.url(&[self.store.sheet_id.as_str()])?;
        let resp = self
            .send(self.http.get(url).query(&[("fields", "sheets.properties(sheetId,title)")]))
            .await?;
        let meta: Spreadsheet = resp.json().await?;
        meta.sheets
            .into_iter()
            .find(|s| s.properties.title == self.store.tab)
            .map(|s| s.properties.sheet_id)
            .ok_or_else(|| GatewayError::TabNotFound(self.store.tab.clone()))
    }
}

#[async_trait]
impl SheetsGateway for GoogleSheets {
    fn store_id(&self) -> &StoreId { &self.store }

    async fn read_column(&self) -> Result<Vec<String>, GatewayError> {
        let range = self.column_range();
        let url = self.url(&[self.store.sheet_id.as_str(), "values", range.as_str()])?;
        let resp = self.send(self.http.get(url).query(&[("majorDimension", "ROWS")])).await?;
        let body: ValueRange = resp.json().await?;
        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().next().unwrap_or_default())
            .collect())
    }

    async fn append_row(&self, value: &str) -> Result<(), GatewayError> {
        let target = format!("{}:append", self.column_range());
        let url = self.url(&[self.store.sheet_id.as_str(), "values", target.as_str()])?;
        let req = self
            .http
            .post(url)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&json!({ "values": [[value]] }));
        self.send(req).await?;
        Ok(())
    }

    async fn delete_rows(&self, rows: &[u32]) -> Result<(), GatewayError> {
        if rows.is_empty() {
            return Ok(());
        }
        let body = delete_requests(self.tab_id().await?, rows);
        let target = format!("{}:batchUpdate", self.store.sheet_id);
        let url = self.url(&[target.as_str()])?;
        self.send(self.http.post(url).json(&body)).await?;
        Ok(())
    }

    async fn clear_column(&self) -> Result<(), GatewayError> {
        let target = format!("{}:clear", self.column_range());
        let url = self.url(&[self.store.sheet_id.as_str(), "values", target.as_str()])?;
        self.send(self.http.post(url).json(&json!({}))).await?;
        Ok(())
    }
}
