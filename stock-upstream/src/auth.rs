//! Bearer credential issuance and caching
//!
//! The pricing service hands out short-lived bearer tokens from `/auth`.
//! [`CredentialCache`] keeps the current one and renews it a safety margin
//! before it expires. Concurrent callers that find the credential stale share
//! a single issuer call and its outcome, including a failure.

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stock_core::{StockError, StockResult};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument};

use crate::config::AuthIdentity;
use crate::types::{AuthRequest, AuthResponse};

/// Credentials are renewed this long before the issuer-reported expiry
pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::from_secs(60);

/// A freshly issued bearer credential
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedCredential {
    pub token: String,
    /// Lifetime reported by the issuer; `None` never expires
    pub expires_in: Option<Duration>,
}

/// Source of bearer credentials
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    async fn issue(&self) -> StockResult<IssuedCredential>;
}

/// Issuer backed by the pricing service's `/auth` endpoint
pub struct HttpCredentialIssuer {
    client: Client,
    auth_url: String,
    identity: AuthIdentity,
}

impl HttpCredentialIssuer {
    pub fn new(base_url: &str, identity: AuthIdentity, timeout: Duration) -> StockResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StockError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            auth_url: format!("{}/auth", base_url.trim_end_matches('/')),
            identity,
        })
    }
}

#[async_trait]
impl CredentialIssuer for HttpCredentialIssuer {
    #[instrument(skip(self))]
    async fn issue(&self) -> StockResult<IssuedCredential> {
        let body = AuthRequest {
            email: self.identity.email.clone(),
            name: self.identity.name.clone(),
            roll_no: self.identity.roll_no.clone(),
            access_code: self.identity.access_code.clone(),
            client_id: self.identity.client_id.clone(),
            client_secret: self.identity.client_secret.clone(),
        };

        debug!("Requesting credential from: {}", self.auth_url);

        let response = self
            .client
            .post(&self.auth_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| StockError::auth(format!("Credential request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Credential issuer rejected request: {} - {}", status, body);
            return Err(StockError::auth(format!(
                "Credential issuer error ({}): {}",
                status, body
            )));
        }

        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| StockError::auth(format!("Failed to parse credential response: {}", e)))?;

        info!(
            "Credential issued (type {}, expires in {}s)",
            auth.token_type.as_deref().unwrap_or("Bearer"),
            auth.expires_in
        );

        Ok(IssuedCredential {
            token: auth.access_token,
            expires_in: Some(Duration::from_secs(auth.expires_in)),
        })
    }
}

/// Issuer that always hands out the same pre-issued token
pub struct StaticIssuer {
    token: String,
}

impl StaticIssuer {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl CredentialIssuer for StaticIssuer {
    async fn issue(&self) -> StockResult<IssuedCredential> {
        Ok(IssuedCredential {
            token: self.token.clone(),
            expires_in: None,
        })
    }
}

/// Cached credential with its effective expiry (safety margin applied)
#[derive(Debug, Clone)]
struct Credential {
    token: String,
    expires_at: Option<Instant>,
}

impl Credential {
    fn is_valid(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Holds the current bearer credential and renews it on demand
pub struct CredentialCache {
    issuer: Arc<dyn CredentialIssuer>,
    current: RwLock<Option<Credential>>,
    /// Held for the duration of an issuer call so refreshes never overlap.
    /// Holds the error of the last refresh if it failed.
    refresh_gate: Mutex<Option<StockError>>,
    /// Number of finished issuer calls, successful or not
    refreshes: AtomicU64,
    safety_margin: Duration,
}

impl CredentialCache {
    pub fn new(issuer: Arc<dyn CredentialIssuer>) -> Self {
        Self::with_safety_margin(issuer, DEFAULT_SAFETY_MARGIN)
    }

    pub fn with_safety_margin(issuer: Arc<dyn CredentialIssuer>, safety_margin: Duration) -> Self {
        Self {
            issuer,
            current: RwLock::new(None),
            refresh_gate: Mutex::new(None),
            refreshes: AtomicU64::new(0),
            safety_margin,
        }
    }

    /// Return a credential that is valid right now, issuing one if needed
    pub async fn get_valid_credential(&self) -> StockResult<String> {
        if let Some(token) = self.cached_token() {
            debug!("Using cached credential");
            return Ok(token);
        }

        let seen = self.refreshes.load(Ordering::Acquire);
        let mut last_failure = self.refresh_gate.lock().await;

        // Another caller may have refreshed while we waited for the gate
        if let Some(token) = self.cached_token() {
            debug!("Using credential refreshed by concurrent caller");
            return Ok(token);
        }

        // A refresh finished while we waited and failed: share its error
        if self.refreshes.load(Ordering::Acquire) != seen {
            if let Some(err) = last_failure.as_ref() {
                debug!("Sharing failed refresh with waiting caller");
                return Err(err.clone());
            }
        }

        info!("Requesting new credential from issuer");
        let requested_at = Instant::now();

        let outcome = self.issuer.issue().await.map_err(|e| match e {
            StockError::Auth(_) => e,
            other => StockError::auth(other.to_string()),
        });
        *last_failure = outcome.as_ref().err().cloned();
        self.refreshes.fetch_add(1, Ordering::AcqRel);
        let issued = outcome?;

        let expires_at = issued.expires_in.map(|lifetime| {
            requested_at + lifetime.saturating_sub(self.safety_margin)
        });

        *self.current.write() = Some(Credential {
            token: issued.token.clone(),
            expires_at,
        });

        Ok(issued.token)
    }

    /// Drop the cached credential so the next caller re-issues
    pub fn invalidate(&self) {
        if self.current.write().take().is_some() {
            info!("Cached credential invalidated");
        }
    }

    fn cached_token(&self) -> Option<String> {
        let current = self.current.read();
        current
            .as_ref()
            .filter(|c| c.is_valid(Instant::now()))
            .map(|c| c.token.clone())
    }
}
