use crate::identifiers::{EventId, IdentityId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user-owned event listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Store-assigned id.
    pub id: EventId,
    /// Id of the owning identity (not referentially checked).
    pub owner_id: IdentityId,
    /// Display label of the author, usually the owner's email.
    pub author_label: String,
    /// Event name.
    pub name: String,
    /// Category name.
    pub category: String,
    /// When the event takes place.
    pub when: DateTime<Utc>,
    /// City name.
    pub city: String,
    /// Area within the city.
    pub area: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// An event before the store has assigned its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    /// Id of the owning identity.
    pub owner_id: IdentityId,
    /// Display label of the author.
    pub author_label: String,
    /// Event name.
    pub name: String,
    /// Category name.
    pub category: String,
    /// When the event takes place.
    pub when: DateTime<Utc>,
    /// City name.
    pub city: String,
    /// Area within the city.
    pub area: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl EventDraft {
    /// Attaches the store-assigned id.
    pub fn into_event(self, id: EventId) -> Event {
        Event {
            id,
            owner_id: self.owner_id,
            author_label: self.author_label,
            name: self.name,
            category: self.category,
            when: self.when,
            city: self.city,
            area: self.area,
            description: self.description,
            created_at: self.created_at,
        }
    }
}

/// Partial update of an event. Present fields replace the stored ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    /// New owner id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<IdentityId>,
    /// New author label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_label: Option<String>,
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// New date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<DateTime<Utc>>,
    /// New city.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// New area.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New creation timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl EventPatch {
    /// Patch that only renames the event.
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// True if no field is set.
    pub fn is_empty(&self) -> bool {
        self.field_paths().is_empty()
    }

    /// Wire names of the fields this patch sets.
    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::new();
        if self.owner_id.is_some() {
            paths.push("ownerId");
        }
        if self.author_label.is_some() {
            paths.push("authorLabel");
        }
        if self.name.is_some() {
            paths.push("name");
        }
        if self.category.is_some() {
            paths.push("category");
        }
        if self.when.is_some() {
            paths.push("when");
        }
        if self.city.is_some() {
            paths.push("city");
        }
        if self.area.is_some() {
            paths.push("area");
        }
        if self.description.is_some() {
            paths.push("description");
        }
        if self.created_at.is_some() {
            paths.push("createdAt");
        }
        paths
    }

    /// Merges the set fields into `event`; the id is never touched.
    pub fn apply(&self, event: &mut Event) {
        if let Some(v) = &self.owner_id {
            event.owner_id = v.clone();
        }
        if let Some(v) = &self.author_label {
            event.author_label = v.clone();
        }
        if let Some(v) = &self.name {
            event.name = v.clone();
        }
        if let Some(v) = &self.category {
            event.category = v.clone();
        }
        if let Some(v) = self.when {
            event.when = v;
        }
        if let Some(v) = &self.city {
            event.city = v.clone();
        }
        if let Some(v) = &self.area {
            event.area = v.clone();
        }
        if let Some(v) = &self.description {
            event.description = v.clone();
        }
        if let Some(v) = self.created_at {
            event.created_at = v;
        }
    }
}

impl From<EventDraft> for EventPatch {
    fn from(draft: EventDraft) -> Self {
        Self {
            owner_id: Some(draft.owner_id),
            author_label: Some(draft.author_label),
            name: Some(draft.name),
            category: Some(draft.category),
            when: Some(draft.when),
            city: Some(draft.city),
            area: Some(draft.area),
            description: Some(draft.description),
            created_at: Some(draft.created_at),
        }
    }
}
