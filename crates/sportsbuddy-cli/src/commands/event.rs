//! Event commands.

use super::{require_session, CliError};
use crate::output;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use sportsbuddy_model::{can_delete_event, can_edit_event, Event, EventDraft, EventId, EventPatch};
use sportsbuddy_store::{filter_events, AndFilter, CategoryFilter, PlaceFilter, StoreHandle};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Event fields as given on the command line. `None` means "not given".
pub struct EventFields {
    pub name: Option<String>,
    pub category: Option<String>,
    pub when: Option<String>,
    pub city: Option<String>,
    pub area: Option<String>,
    pub description: Option<String>,
}

/// Parses an RFC 3339 timestamp, or a naive `YYYY-MM-DD HH:MM` taken as UTC.
pub fn parse_when(input: &str) -> Result<DateTime<Utc>, CliError> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    Err(CliError::InvalidArgument {
        field: "when",
        reason: format!("'{}' is not RFC 3339 or YYYY-MM-DD HH:MM", input),
    })
}

fn required(value: Option<String>, field: &'static str) -> Result<String, CliError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(CliError::InvalidArgument {
            field,
            reason: "must not be blank".to_string(),
        }),
    }
}

async fn check_category(store: &StoreHandle, category: &str) -> Result<(), CliError> {
    if !store
        .taxonomy()
        .list_categories()
        .await?
        .iter()
        .any(|c| c == category)
    {
        return Err(CliError::InvalidArgument {
            field: "category",
            reason: format!("unknown category '{}'", category),
        });
    }
    Ok(())
}

/// Checks that `city` exists and `area` is one of its areas.
async fn check_place(store: &StoreHandle, city: &str, area: &str) -> Result<(), CliError> {
    let cities = store.taxonomy().list_cities().await?;
    let entry = cities
        .iter()
        .find(|c| c.name == city)
        .ok_or_else(|| CliError::InvalidArgument {
            field: "city",
            reason: format!("unknown city '{}'", city),
        })?;
    if !entry.has_area(area) {
        return Err(CliError::InvalidArgument {
            field: "area",
            reason: format!("'{}' is not an area of {}", area, city),
        });
    }
    Ok(())
}

async fn find_event(store: &StoreHandle, id: &EventId) -> Result<Event, CliError> {
    store
        .events()
        .list_all_events()
        .await?
        .into_iter()
        .find(|e| &e.id == id)
        .ok_or_else(|| CliError::EventNotFound(id.to_string()))
}

pub async fn create(store: &StoreHandle, fields: EventFields) -> CmdResult {
    let identity = require_session(store).await?;

    let name = required(fields.name, "name")?;
    let category = required(fields.category, "category")?;
    let when = parse_when(&required(fields.when, "when")?)?;
    let city = required(fields.city, "city")?;
    let area = required(fields.area, "area")?;
    check_category(store, &category).await?;
    check_place(store, &city, &area).await?;

    let draft = EventDraft {
        owner_id: identity.id.clone(),
        author_label: identity.email.clone(),
        name,
        category,
        when,
        city,
        area,
        description: fields.description.unwrap_or_default().trim().to_string(),
        created_at: Utc::now(),
    };
    let id = store.events().create_event(draft).await?;

    println!("Created event {}", id);
    Ok(())
}

pub async fn update(store: &StoreHandle, id: &str, fields: EventFields) -> CmdResult {
    let identity = require_session(store).await?;
    let id = EventId::new(id.trim());
    let current = find_event(store, &id).await?;
    if !can_edit_event(&identity, &current) {
        return Err(CliError::Forbidden("only the owner can edit an event").into());
    }

    let patch = EventPatch {
        name: fields.name.map(|s| required(Some(s), "name")).transpose()?,
        category: fields
            .category
            .map(|s| required(Some(s), "category"))
            .transpose()?,
        when: fields.when.map(|s| parse_when(&s)).transpose()?,
        city: fields.city.map(|s| required(Some(s), "city")).transpose()?,
        area: fields.area.map(|s| required(Some(s), "area")).transpose()?,
        description: fields.description.map(|s| s.trim().to_string()),
        ..EventPatch::default()
    };
    if patch.is_empty() {
        return Err(CliError::InvalidArgument {
            field: "update",
            reason: "no fields given".to_string(),
        }
        .into());
    }

    // fields the patch leaves alone are not re-validated
    if let Some(category) = &patch.category {
        check_category(store, category).await?;
    }
    if patch.city.is_some() || patch.area.is_some() {
        let city = patch.city.as_deref().unwrap_or(&current.city);
        let area = patch.area.as_deref().unwrap_or(&current.area);
        check_place(store, city, area).await?;
    }

    store.events().update_event(&id, patch).await?;
    println!("Updated event {}", id);
    Ok(())
}

pub async fn delete(store: &StoreHandle, id: &str) -> CmdResult {
    let identity = require_session(store).await?;
    let id = EventId::new(id.trim());
    let current = find_event(store, &id).await?;
    if !can_delete_event(&identity, &current) {
        return Err(CliError::Forbidden("only the owner or an admin can delete an event").into());
    }

    store.events().delete_event(&id).await?;
    println!("Deleted event {}", id);
    Ok(())
}

pub async fn list(
    store: &StoreHandle,
    all: bool,
    category: Option<String>,
    city: Option<String>,
    area: Option<String>,
    json: bool,
) -> CmdResult {
    let identity = require_session(store).await?;
    let events = if all {
        if !identity.is_admin() {
            return Err(CliError::Forbidden("listing every event requires an admin").into());
        }
        store.events().list_all_events().await?
    } else {
        store.events().list_events_by_owner(&identity.id).await?
    };

    let mut filter = AndFilter::default();
    if let Some(category) = category {
        filter = filter.with(CategoryFilter { category });
    }
    if let Some(city) = city {
        filter = filter.with(PlaceFilter { city, area });
    }
    let mut events = filter_events(events, &filter);
    events.sort_by(|a, b| a.when.cmp(&b.when).then_with(|| a.id.cmp(&b.id)));

    if !json {
        output::print_event_header();
    }
    for event in &events {
        if json {
            println!("{}", serde_json::to_string(event)?);
        } else {
            println!("{}", output::format_event_row(event));
        }
    }
    Ok(())
}
