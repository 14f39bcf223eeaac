//! Store configuration: remote credentials, local data directory, role policy.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use sportsbuddy_model::RolePolicy;
use std::path::{Path, PathBuf};

/// Default Identity Toolkit endpoint.
pub const DEFAULT_AUTH_ENDPOINT: &str = "https://identitytoolkit.googleapis.com";
/// Default Secure Token endpoint (refresh-token exchange).
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://securetoken.googleapis.com";
/// Default Firestore endpoint.
pub const DEFAULT_FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com";

/// Remote backend credentials.
///
/// The backend counts as configured only when every credential field is
/// non-blank. Endpoint overrides (for emulators) are optional and do not take
/// part in that check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteConfig {
    /// Web API key.
    pub api_key: String,
    /// Auth domain.
    pub auth_domain: String,
    /// Project id; names the Firestore database.
    pub project_id: String,
    /// Storage bucket.
    pub storage_bucket: String,
    /// Messaging sender id.
    pub messaging_sender_id: String,
    /// App id.
    pub app_id: String,
    /// Override for the Identity Toolkit base URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_endpoint: Option<String>,
    /// Override for the Secure Token base URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,
    /// Override for the Firestore base URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firestore_endpoint: Option<String>,
}

impl RemoteConfig {
    /// True iff every credential field is non-blank after trimming.
    pub fn is_configured(&self) -> bool {
        [
            &self.api_key,
            &self.auth_domain,
            &self.project_id,
            &self.storage_bucket,
            &self.messaging_sender_id,
            &self.app_id,
        ]
        .iter()
        .all(|v| !v.trim().is_empty())
    }

    /// Identity Toolkit base URL without trailing slash.
    pub fn auth_endpoint(&self) -> &str {
        endpoint(&self.auth_endpoint, DEFAULT_AUTH_ENDPOINT)
    }

    /// Secure Token base URL without trailing slash.
    pub fn token_endpoint(&self) -> &str {
        endpoint(&self.token_endpoint, DEFAULT_TOKEN_ENDPOINT)
    }

    /// Firestore base URL without trailing slash.
    pub fn firestore_endpoint(&self) -> &str {
        endpoint(&self.firestore_endpoint, DEFAULT_FIRESTORE_ENDPOINT)
    }
}

fn endpoint<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.trim_end_matches('/'),
        _ => default,
    }
}

/// Everything needed to select and open a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Remote credentials; incomplete credentials select the local backend.
    pub remote: RemoteConfig,
    /// Directory holding the local key/value file and the remote session.
    pub data_dir: PathBuf,
    /// Role assignment policy.
    pub role_policy: RolePolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::default(),
            data_dir: PathBuf::from(".sportsbuddy"),
            role_policy: RolePolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Reads a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| StoreError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Loads the optional file, then applies `SPORTSBUDDY_*` environment overrides.
    pub fn load(path: Option<&Path>) -> StoreResult<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env_from(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies overrides from `lookup` (an environment accessor).
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let remote = &mut self.remote;
        let fields: [(&str, &mut String); 6] = [
            ("SPORTSBUDDY_API_KEY", &mut remote.api_key),
            ("SPORTSBUDDY_AUTH_DOMAIN", &mut remote.auth_domain),
            ("SPORTSBUDDY_PROJECT_ID", &mut remote.project_id),
            ("SPORTSBUDDY_STORAGE_BUCKET", &mut remote.storage_bucket),
            ("SPORTSBUDDY_MESSAGING_SENDER_ID", &mut remote.messaging_sender_id),
            ("SPORTSBUDDY_APP_ID", &mut remote.app_id),
        ];
        for (key, slot) in fields {
            if let Some(value) = lookup(key) {
                *slot = value;
            }
        }
        if let Some(dir) = lookup("SPORTSBUDDY_DATA_DIR") {
            if !dir.trim().is_empty() {
                self.data_dir = PathBuf::from(dir);
            }
        }
    }

    /// Path of the local key/value file.
    pub fn local_file(&self) -> PathBuf {
        self.data_dir.join(crate::local::DATA_FILE)
    }

    /// Path where the remote backend persists its refresh token.
    pub fn remote_session_file(&self) -> PathBuf {
        self.data_dir.join(crate::remote::SESSION_FILE)
    }
}
