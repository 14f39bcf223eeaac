//! Pluggable storage backends for Sports Buddy.
//!
//! This crate provides:
//! - The storage contract: [`IdentityProvider`], [`TaxonomyStore`], [`EventStore`]
//! - [`LocalStore`], backed by a key/value file from `sportsbuddy-kv`
//! - [`RemoteStore`], backed by Identity Toolkit and Firestore REST
//! - [`StoreHandle`], which selects one backend at startup and hands it out
//! - Event filters for owner, category, and place queries
//!
//! Both backends honour the same contract, so callers never branch on which
//! one is active.

#![deny(missing_docs)]

/// Store configuration.
pub mod config;
/// Error types for store operations.
pub mod error;
/// Event filtering API.
pub mod filter;
/// Backend selection and facade.
pub mod handle;
/// Local key/value backend.
pub mod local;
/// Remote document-store backend.
pub mod remote;
/// Storage contract traits.
pub mod traits;

pub use config::{RemoteConfig, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use filter::{
    filter_events, AndFilter, CategoryFilter, EventFilter, OwnerFilter, PlaceFilter,
};
pub use handle::{BackendKind, StoreHandle};
pub use local::LocalStore;
pub use remote::RemoteStore;
pub use traits::{EventStore, IdentityProvider, Store, TaxonomyStore};
