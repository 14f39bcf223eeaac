//! The storage contract shared by every backend.

use crate::error::StoreResult;
use async_trait::async_trait;
use sportsbuddy_model::{City, Event, EventDraft, EventId, EventPatch, Identity, IdentityId, Role};

/// Registration, login, and the current session.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Registers a new identity. The stored role comes from the backend's
    /// [`RolePolicy`](sportsbuddy_model::RolePolicy) applied to `requested_role`.
    async fn register(&self, email: &str, secret: &str, requested_role: Role)
        -> StoreResult<Identity>;

    /// Authenticates an existing identity.
    async fn login(&self, email: &str, secret: &str) -> StoreResult<Identity>;

    /// The active session, if any. Has no side effects.
    async fn current_session(&self) -> StoreResult<Option<Identity>>;

    /// Marks `identity` as the active session.
    async fn set_session(&self, identity: &Identity) -> StoreResult<()>;

    /// Ends the active session.
    async fn clear_session(&self) -> StoreResult<()>;
}

/// Categories and the city → areas hierarchy.
///
/// Mutations are idempotent and return nothing; observe them by listing.
#[async_trait]
pub trait TaxonomyStore: Send + Sync {
    /// All category names.
    async fn list_categories(&self) -> StoreResult<Vec<String>>;
    /// Adds a category unless blank or present.
    async fn add_category(&self, name: &str) -> StoreResult<()>;
    /// Removes a category if present.
    async fn remove_category(&self, name: &str) -> StoreResult<()>;
    /// All cities with their areas.
    async fn list_cities(&self) -> StoreResult<Vec<City>>;
    /// Adds a city with no areas unless blank or present.
    async fn add_city(&self, name: &str) -> StoreResult<()>;
    /// Removes a city and its areas.
    async fn remove_city(&self, name: &str) -> StoreResult<()>;
    /// Adds an area to an existing city unless blank or present.
    async fn add_area_to_city(&self, city: &str, area: &str) -> StoreResult<()>;
    /// Removes an area from a city if present.
    async fn remove_area_from_city(&self, city: &str, area: &str) -> StoreResult<()>;
}

/// Per-owner event records. List order is not guaranteed.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persists a new event and returns its fresh id.
    async fn create_event(&self, draft: EventDraft) -> StoreResult<EventId>;
    /// Merges `patch` into an existing event; missing ids are a no-op.
    async fn update_event(&self, id: &EventId, patch: EventPatch) -> StoreResult<()>;
    /// Deletes an event if present.
    async fn delete_event(&self, id: &EventId) -> StoreResult<()>;
    /// Events owned by `owner`.
    async fn list_events_by_owner(&self, owner: &IdentityId) -> StoreResult<Vec<Event>>;
    /// Every event.
    async fn list_all_events(&self) -> StoreResult<Vec<Event>>;
}

/// A complete backend: identity, taxonomy, and events.
pub trait Store: IdentityProvider + TaxonomyStore + EventStore {}

impl<T: IdentityProvider + TaxonomyStore + EventStore> Store for T {}
