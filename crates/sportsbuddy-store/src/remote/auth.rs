//! Password sign-in, token refresh, and the persisted refresh token.

use super::RemoteStore;
use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Refresh this long before the id token actually expires.
const EXPIRY_SLACK_SECS: i64 = 60;

/// Tokens of the signed-in identity.
#[derive(Debug, Clone)]
pub(crate) struct AuthSession {
    pub uid: String,
    pub email: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_SLACK_SECS) >= self.expires_at
    }
}

/// What survives a restart: enough to mint a new id token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PersistedSession {
    pub uid: String,
    pub email: String,
    pub refresh_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordAuthResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

fn expires_at(expires_in: &str) -> DateTime<Utc> {
    let secs = expires_in.trim().parse::<i64>().unwrap_or(3600);
    Utc::now() + Duration::seconds(secs)
}

/// Maps an Identity Toolkit error message (e.g. `WEAK_PASSWORD : ...`) to a store error.
pub(crate) fn map_auth_error(message: &str) -> StoreError {
    let code = message.split([' ', ':']).next().unwrap_or(message);
    match code {
        "EMAIL_EXISTS" => StoreError::DuplicateIdentity,
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            StoreError::InvalidCredentials
        }
        _ => StoreError::BackendOperationFailed(format!("auth rejected: {}", message)),
    }
}

/// Pulls `error.message` out of a Google API error body.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

impl RemoteStore {
    /// Calls `accounts:signUp` or `accounts:signInWithPassword`.
    pub(super) async fn password_auth(
        &self,
        method: &str,
        email: &str,
        secret: &str,
    ) -> StoreResult<AuthSession> {
        let endpoint = format!("accounts:{}", method);
        let url = self.url_with(&self.auth_base, &["v1", endpoint.as_str()])?;
        let response = self
            .http
            .post(url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&json!({
                "email": email,
                "password": secret,
                "returnSecureToken": true,
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            debug!(%status, method, "auth request rejected");
            return Err(map_auth_error(&error_message(&body)));
        }
        let parsed: PasswordAuthResponse = serde_json::from_str(&body)
            .map_err(|e| StoreError::Decode(format!("auth response: {}", e)))?;

        Ok(AuthSession {
            uid: parsed.local_id,
            email: if parsed.email.is_empty() {
                email.to_string()
            } else {
                parsed.email
            },
            id_token: parsed.id_token,
            refresh_token: parsed.refresh_token,
            expires_at: expires_at(&parsed.expires_in),
        })
    }

    /// Exchanges a refresh token for a fresh id token.
    pub(super) async fn refresh(&self, email: &str, refresh_token: &str) -> StoreResult<AuthSession> {
        let url = self.url_with(&self.token_base, &["v1", "token"])?;
        let response = self
            .http
            .post(url)
            .query(&[("key", self.config.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(StoreError::BackendOperationFailed(format!(
                "token refresh rejected: {}",
                error_message(&body)
            )));
        }
        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| StoreError::Decode(format!("token response: {}", e)))?;

        Ok(AuthSession {
            uid: parsed.user_id,
            email: email.to_string(),
            id_token: parsed.id_token,
            refresh_token: parsed.refresh_token,
            expires_at: expires_at(&parsed.expires_in),
        })
    }

    /// Current id token, refreshed first if it is about to expire.
    pub(super) async fn id_token(&self) -> StoreResult<Option<String>> {
        let mut guard = self.auth.lock().await;
        let Some(session) = guard.as_ref() else {
            return Ok(None);
        };
        if session.needs_refresh(Utc::now()) {
            let fresh = self.refresh(&session.email, &session.refresh_token).await?;
            self.persist_session(&fresh);
            *guard = Some(fresh);
        }
        Ok(guard.as_ref().map(|s| s.id_token.clone()))
    }

    /// Installs a signed-in session and persists its refresh token.
    pub(super) async fn install_session(&self, session: AuthSession) {
        self.persist_session(&session);
        info!(uid = %session.uid, "remote session established");
        *self.auth.lock().await = Some(session);
    }

    /// Signs out locally: drops tokens and the persisted refresh token.
    pub(super) async fn drop_session(&self) {
        if self.auth.lock().await.take().is_some() {
            info!("remote session signed out");
        }
        if let Some(path) = &self.session_file {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), error = %e, "could not remove remote session file");
                }
            }
        }
    }

    /// Restores a persisted session, once, at readiness time.
    pub(super) async fn restore_session(&self) -> StoreResult<()> {
        if self.auth.lock().await.is_some() {
            return Ok(());
        }
        let Some(path) = &self.session_file else {
            return Ok(());
        };
        let persisted: PersistedSession = match std::fs::read(path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(p) => p,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring unreadable remote session file");
                    return Ok(());
                }
            },
            Err(_) => return Ok(()),
        };

        match self.refresh(&persisted.email, &persisted.refresh_token).await {
            Ok(session) => {
                debug!(uid = %session.uid, "remote session restored");
                self.install_session(session).await;
            }
            Err(e) => warn!(error = %e, "could not restore remote session"),
        }
        Ok(())
    }

    fn persist_session(&self, session: &AuthSession) {
        let Some(path) = &self.session_file else {
            return;
        };
        let persisted = PersistedSession {
            uid: session.uid.clone(),
            email: session.email.clone(),
            refresh_token: session.refresh_token.clone(),
        };
        let result = serde_json::to_vec(&persisted)
            .map_err(std::io::Error::from)
            .and_then(|bytes| {
                if let Some(dir) = path.parent() {
                    std::fs::create_dir_all(dir)?;
                }
                std::fs::write(path, bytes)
            });
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "could not persist remote session");
        }
    }
}
