//! Who may mutate what. The stores themselves do not enforce these; consumers do.

use crate::events::Event;
use crate::identity::Identity;

/// Only administrators manage categories, cities, and areas.
pub fn can_manage_taxonomy(identity: &Identity) -> bool {
    identity.is_admin()
}

/// Events are edited in place only by their owner.
pub fn can_edit_event(identity: &Identity, event: &Event) -> bool {
    identity.id == event.owner_id
}

/// Owners delete their own events; administrators delete any.
pub fn can_delete_event(identity: &Identity, event: &Event) -> bool {
    can_edit_event(identity, event) || identity.is_admin()
}
