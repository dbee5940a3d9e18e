// Firebase Realtime Database service module
// Service-account auth plus push-style writes over the REST API

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use once_cell::sync::OnceCell;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared_types::{ScrapedRecord, ServiceAccountKey};
use tokio::sync::Mutex;
use url::Url;

use crate::error::{IngestError, Result};

const TOKEN_SCOPES: &str = concat!(
    "https://www.googleapis.com/auth/firebase.database ",
    "https://www.googleapis.com/auth/userinfo.email"
);
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;
/// Refresh this long before the server-side expiry
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

// ============================================================================
// Store seams
// ============================================================================

#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Append `record` as a new child of `path` and return the generated key.
    async fn push(&self, path: &str, record: &ScrapedRecord) -> Result<String>;
}

pub trait StoreConnector: Send + Sync {
    fn connect(&self) -> Result<Arc<dyn RecordSink>>;
}

/// Database handle that connects on first use and reuses the connection afterwards.
/// A failed connection attempt is not cached, so the next call tries again.
pub struct StoreHandle {
    connector: Box<dyn StoreConnector>,
    sink: OnceCell<Arc<dyn RecordSink>>,
}

impl StoreHandle {
    pub fn new(connector: impl StoreConnector + 'static) -> Self {
        Self {
            connector: Box::new(connector),
            sink: OnceCell::new(),
        }
    }

    pub fn initialize(&self) -> Result<Arc<dyn RecordSink>> {
        self.sink
            .get_or_try_init(|| {
                tracing::info!("initializing database connection");
                self.connector.connect()
            })
            .map(Arc::clone)
    }

    pub fn is_initialized(&self) -> bool {
        self.sink.get().is_some()
    }
}

// ============================================================================
// Firebase
// ============================================================================

pub struct FirebaseConnector {
    client: Client,
    credentials_path: PathBuf,
    database_url: String,
}

impl FirebaseConnector {
    pub fn new(client: Client, credentials_path: PathBuf, database_url: String) -> Self {
        Self {
            client,
            credentials_path,
            database_url,
        }
    }
}

impl StoreConnector for FirebaseConnector {
    fn connect(&self) -> Result<Arc<dyn RecordSink>> {
        let key = load_service_account(&self.credentials_path)?;
        tracing::debug!(
            client_email = %key.client_email,
            project_id = key.project_id.as_deref().unwrap_or("unknown"),
            "loaded service account"
        );
        let database = FirebaseDatabase::new(self.client.clone(), key, &self.database_url)?;
        Ok(Arc::new(database))
    }
}

pub fn load_service_account(path: &Path) -> Result<ServiceAccountKey> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        IngestError::Credentials(format!("cannot read {}: {}", path.display(), e))
    })?;
    parse_service_account(&contents)
}

pub fn parse_service_account(contents: &str) -> Result<ServiceAccountKey> {
    let key: ServiceAccountKey = serde_json::from_str(contents)
        .map_err(|e| IngestError::Credentials(format!("invalid service account file: {}", e)))?;

    if key.client_email.trim().is_empty() || key.private_key.trim().is_empty() {
        return Err(IngestError::Credentials(
            "service account is missing client_email or private_key".to_string(),
        ));
    }
    Ok(key)
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

pub struct FirebaseDatabase {
    client: Client,
    key: ServiceAccountKey,
    base_url: Url,
    token: Mutex<Option<CachedToken>>,
}

impl FirebaseDatabase {
    pub fn new(client: Client, key: ServiceAccountKey, database_url: &str) -> Result<Self> {
        let normalized = if database_url.ends_with('/') {
            database_url.to_string()
        } else {
            format!("{}/", database_url)
        };

        Ok(Self {
            client,
            key,
            base_url: Url::parse(&normalized)?,
            token: Mutex::new(None),
        })
    }

    /// REST location of `path`, e.g. `/cafe` -> `<database>/cafe.json`
    pub fn collection_url(&self, path: &str) -> Result<Url> {
        let trimmed = path.trim_matches('/');
        Ok(self.base_url.join(&format!("{}.json", trimmed))?)
    }

    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() {
                return Ok(token.value.clone());
            }
        }

        let token = self.fetch_access_token().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn fetch_access_token(&self) -> Result<CachedToken> {
        let now = Utc::now();
        let assertion = sign_assertion(&self.key, now)?;

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IngestError::from_response("Google OAuth", response).await);
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = token.expires_in.unwrap_or(TOKEN_LIFETIME_SECS) - TOKEN_EXPIRY_MARGIN_SECS;
        tracing::debug!(lifetime_secs = lifetime, "obtained database access token");

        Ok(CachedToken {
            value: token.access_token,
            expires_at: now + Duration::seconds(lifetime.max(0)),
        })
    }
}

pub fn sign_assertion(key: &ServiceAccountKey, now: DateTime<Utc>) -> Result<String> {
    let iat = now.timestamp();
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope: TOKEN_SCOPES,
        aud: &key.token_uri,
        iat,
        exp: iat + TOKEN_LIFETIME_SECS,
    };
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
    Ok(jsonwebtoken::encode(
        &Header::new(Algorithm::RS256),
        &claims,
        &encoding_key,
    )?)
}

#[async_trait]
impl RecordSink for FirebaseDatabase {
    async fn push(&self, path: &str, record: &ScrapedRecord) -> Result<String> {
        let url = self.collection_url(path)?;
        let token = self.access_token().await?;
        tracing::debug!(%url, "pushing record");

        let response = self
            .client
            .post(url)
            .query(&[("access_token", token.as_str())])
            .json(record)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IngestError::from_response("Firebase", response).await);
        }

        let pushed: PushResponse = response.json().await?;
        Ok(pushed.name)
    }
}
