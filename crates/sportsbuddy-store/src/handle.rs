//! Backend selection and the facade handed to consumers.

use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::local::LocalStore;
use crate::remote::RemoteStore;
use crate::traits::{EventStore, IdentityProvider, Store, TaxonomyStore};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Which backend a handle was built on. For display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Remote authenticated document store.
    Remote,
    /// Local key/value file.
    Local,
}

impl BackendKind {
    /// Short label (`remote` / `local`).
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Remote => "remote",
            BackendKind::Local => "local",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The store facade: one backend, chosen once, shared by every consumer.
#[derive(Clone)]
pub struct StoreHandle {
    kind: BackendKind,
    store: Arc<dyn Store>,
    identity: Arc<dyn IdentityProvider>,
    taxonomy: Arc<dyn TaxonomyStore>,
    events: Arc<dyn EventStore>,
}

impl StoreHandle {
    /// Picks the remote backend when it is fully configured and its client
    /// initializes, the local backend otherwise.
    pub fn select(config: &StoreConfig) -> StoreResult<Self> {
        if config.remote.is_configured() {
            match RemoteStore::connect(
                &config.remote,
                config.role_policy.clone(),
                Some(config.remote_session_file()),
            ) {
                Ok(remote) => {
                    info!(project = %config.remote.project_id, "remote backend selected");
                    return Ok(Self::remote(remote));
                }
                Err(e) => warn!(error = %e, "remote backend unavailable; falling back to local"),
            }
        } else {
            info!("remote configuration incomplete; using local backend");
        }

        let local = LocalStore::open(&config.data_dir, config.role_policy.clone())?;
        Ok(Self::local(local))
    }

    /// Wraps an already opened local backend.
    pub fn local(store: LocalStore) -> Self {
        Self::from_backend(BackendKind::Local, Arc::new(store))
    }

    /// Wraps an already connected remote backend.
    pub fn remote(store: RemoteStore) -> Self {
        Self::from_backend(BackendKind::Remote, Arc::new(store))
    }

    fn from_backend<S: Store + 'static>(kind: BackendKind, backend: Arc<S>) -> Self {
        Self {
            kind,
            store: backend.clone(),
            identity: backend.clone(),
            taxonomy: backend.clone(),
            events: backend,
        }
    }

    /// The selected backend.
    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// The full backend.
    pub fn store(&self) -> Arc<dyn Store> {
        self.store.clone()
    }

    /// Identity and session operations.
    pub fn identity(&self) -> Arc<dyn IdentityProvider> {
        self.identity.clone()
    }

    /// Category and city operations.
    pub fn taxonomy(&self) -> Arc<dyn TaxonomyStore> {
        self.taxonomy.clone()
    }

    /// Event operations.
    pub fn events(&self) -> Arc<dyn EventStore> {
        self.events.clone()
    }
}
