//! Service-account credentials and OAuth access tokens for the Sheets API.

use base64::Engine;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::gateway::GatewayError;

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
// refresh a little before the upstream expiry
const EXPIRY_SLACK_SECS: i64 = 60;

#[derive(thiserror::Error, Debug)]
pub enum CredentialsError {
    #[error("service account JSON is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("service account JSON is not valid UTF-8")]
    Utf8,
    #[error("service account JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// The subset of a Google service-account key file the token exchange needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccount {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String { DEFAULT_TOKEN_URI.to_string() }

impl std::fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccount {
    /// Parse raw key-file JSON. Keys pasted into env vars often carry literal
    /// `\n` sequences; those are turned back into newlines.
    pub fn from_json(raw: &str) -> Result<Self, CredentialsError> {
        let mut account: ServiceAccount = serde_json::from_str(raw.trim())?;
        if account.private_key.contains("\\n") {
            account.private_key = account.private_key.replace("\\n", "\n");
        }
        Ok(account)
    }

    pub fn from_base64(encoded: &str) -> Result<Self, CredentialsError> {
        let bytes = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
        let text = String::from_utf8(bytes).map_err(|_| CredentialsError::Utf8)?;
        Self::from_json(&text)
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 { ASSERTION_LIFETIME_SECS }

struct CachedToken {
    value: String,
    expires_at: i64,
}

/// Exchanges signed assertions for bearer tokens and caches them until near expiry.
pub struct TokenSource {
    http: reqwest::Client,
    account: ServiceAccount,
    scope: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(http: reqwest::Client, account: ServiceAccount) -> Self {
        Self { http, account, scope: SHEETS_SCOPE.to_string(), cached: Mutex::new(None) }
    }

    pub async fn access_token(&self) -> Result<String, GatewayError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        if let Some(token) = self.cached.lock().as_ref() {
            if token.expires_at - EXPIRY_SLACK_SECS > now {
                return Ok(token.value.clone());
            }
        }

        let assertion = self.sign_assertion(now)?;
        let resp = self
            .http
            .post(&self.account.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Auth(format!("token exchange returned {status}: {body}")));
        }
        let token: TokenResponse = resp.json().await?;
        tracing::debug!(
            account = %self.account.client_email,
            expires_in = token.expires_in,
            "obtained sheets access token"
        );

        *self.cached.lock() = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: now + token.expires_in,
        });
        Ok(token.access_token)
    }

    fn sign_assertion(&self, now: i64) -> Result<String, GatewayError> {
        let claims = Claims {
            iss: &self.account.client_email,
            scope: &self.scope,
            aud: &self.account.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.account.private_key.as_bytes())
            .map_err(|e| GatewayError::Auth(format!("invalid private key: {e}")))?;
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| GatewayError::Auth(format!("failed to sign assertion: {e}")))
    }
}
