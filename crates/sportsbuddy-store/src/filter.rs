//! Event filtering for owner, category, and place queries.

use sportsbuddy_model::{Event, IdentityId};

/// Predicate over events.
pub trait EventFilter: Send + Sync {
    /// Returns true if the event matches the filter criteria.
    fn matches(&self, event: &Event) -> bool;
}

/// Filter by owner id.
#[derive(Debug, Clone)]
pub struct OwnerFilter {
    /// Owner to match.
    pub owner_id: IdentityId,
}

impl EventFilter for OwnerFilter {
    fn matches(&self, event: &Event) -> bool {
        event.owner_id == self.owner_id
    }
}

/// Filter by category name.
#[derive(Debug, Clone)]
pub struct CategoryFilter {
    /// Category to match.
    pub category: String,
}

impl EventFilter for CategoryFilter {
    fn matches(&self, event: &Event) -> bool {
        event.category == self.category
    }
}

/// Filter by city, and optionally area.
#[derive(Debug, Clone)]
pub struct PlaceFilter {
    /// City to match.
    pub city: String,
    /// Area to match within the city.
    pub area: Option<String>,
}

impl EventFilter for PlaceFilter {
    fn matches(&self, event: &Event) -> bool {
        event.city == self.city && self.area.as_ref().map_or(true, |a| &event.area == a)
    }
}

/// Composite filter: all filters must match (AND). Empty matches everything.
#[derive(Default)]
pub struct AndFilter {
    /// Filters to combine with AND logic.
    pub filters: Vec<Box<dyn EventFilter>>,
}

impl AndFilter {
    /// Adds a filter.
    pub fn with(mut self, filter: impl EventFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }
}

impl EventFilter for AndFilter {
    fn matches(&self, event: &Event) -> bool {
        self.filters.iter().all(|f| f.matches(event))
    }
}

/// Keeps the events matching `filter`, preserving order.
pub fn filter_events<F: EventFilter + ?Sized>(events: Vec<Event>, filter: &F) -> Vec<Event> {
    events.into_iter().filter(|e| filter.matches(e)).collect()
}
