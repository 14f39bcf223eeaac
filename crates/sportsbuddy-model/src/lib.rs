//! Data model primitives shared by every Sports Buddy storage backend.
//!
//! This crate provides:
//! - `Identity` and `Role`, plus the configurable `RolePolicy`
//! - Event records (`Event`, `EventDraft`, `EventPatch`) with merge semantics
//! - Taxonomy types (`City`) and the default seed taxonomy
//! - Id newtypes and email validation
//! - Salted secret digests for locally stored credentials
//! - Access rules deciding who may edit taxonomy and events
//!
#![deny(missing_docs)]

/// Access rules for taxonomy and event mutations.
pub mod access;
/// Salted secret digests.
pub mod digest;
/// Event records and partial updates.
pub mod events;
/// Identity, role, and role policy.
pub mod identity;
/// Id newtypes and validated email addresses.
pub mod identifiers;
/// Categories, cities, and the default seed taxonomy.
pub mod taxonomy;
/// Validation helpers used by model types.
pub mod validation;

pub use access::{can_delete_event, can_edit_event, can_manage_taxonomy};
pub use digest::SecretDigest;
pub use events::{Event, EventDraft, EventPatch};
pub use identifiers::{Email, EventId, IdentityId};
pub use identity::{Identity, Role, RolePolicy};
pub use taxonomy::{default_categories, default_cities, City};
pub use validation::{is_blank, ValidationError};
