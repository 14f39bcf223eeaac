//! Category, city, and area commands.

use super::{require_session, CliError};
use crate::output;
use sportsbuddy_model::can_manage_taxonomy;
use sportsbuddy_store::StoreHandle;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

async fn require_admin(store: &StoreHandle) -> Result<(), CliError> {
    let identity = require_session(store).await?;
    if !can_manage_taxonomy(&identity) {
        return Err(CliError::Forbidden("taxonomy changes require an admin"));
    }
    Ok(())
}

pub async fn list_categories(store: &StoreHandle, json: bool) -> CmdResult {
    let mut categories = store.taxonomy().list_categories().await?;
    categories.sort();

    for name in &categories {
        if json {
            println!("{}", serde_json::to_string(name)?);
        } else {
            println!("{}", name);
        }
    }
    Ok(())
}

pub async fn add_category(store: &StoreHandle, name: &str) -> CmdResult {
    require_admin(store).await?;
    store.taxonomy().add_category(name).await?;
    println!("Category '{}' saved", name.trim());
    Ok(())
}

pub async fn remove_category(store: &StoreHandle, name: &str) -> CmdResult {
    require_admin(store).await?;
    store.taxonomy().remove_category(name).await?;
    println!("Category '{}' removed", name.trim());
    Ok(())
}

pub async fn list_cities(store: &StoreHandle, json: bool) -> CmdResult {
    let mut cities = store.taxonomy().list_cities().await?;
    cities.sort_by(|a, b| a.name.cmp(&b.name));

    if !json {
        output::print_city_header();
    }
    for city in &cities {
        if json {
            println!("{}", serde_json::to_string(city)?);
        } else {
            println!("{}", output::format_city_row(city));
        }
    }
    Ok(())
}

pub async fn add_city(store: &StoreHandle, name: &str) -> CmdResult {
    require_admin(store).await?;
    store.taxonomy().add_city(name).await?;
    println!("City '{}' saved", name.trim());
    Ok(())
}

pub async fn remove_city(store: &StoreHandle, name: &str) -> CmdResult {
    require_admin(store).await?;
    store.taxonomy().remove_city(name).await?;
    println!("City '{}' removed", name.trim());
    Ok(())
}

pub async fn add_area(store: &StoreHandle, city: &str, area: &str) -> CmdResult {
    require_admin(store).await?;
    let exists = store
        .taxonomy()
        .list_cities()
        .await?
        .iter()
        .any(|c| c.name == city.trim());
    if !exists {
        return Err(CliError::InvalidArgument {
            field: "city",
            reason: format!("unknown city '{}'", city.trim()),
        }
        .into());
    }

    store.taxonomy().add_area_to_city(city, area).await?;
    println!("Area '{}' saved in {}", area.trim(), city.trim());
    Ok(())
}

pub async fn remove_area(store: &StoreHandle, city: &str, area: &str) -> CmdResult {
    require_admin(store).await?;
    store.taxonomy().remove_area_from_city(city, area).await?;
    println!("Area '{}' removed from {}", area.trim(), city.trim());
    Ok(())
}
