//! Account and session commands.

use super::require_session;
use sportsbuddy_model::Role;
use sportsbuddy_store::StoreHandle;

pub async fn register(
    store: &StoreHandle,
    email: &str,
    password: &str,
    role: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let requested: Role = role.parse()?;
    let identity = store.identity().register(email, password, requested).await?;
    store.identity().set_session(&identity).await?;

    println!(
        "Registered {} as {} ({})",
        identity.email, identity.role, identity.id
    );
    Ok(())
}

pub async fn login(
    store: &StoreHandle,
    email: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let identity = store.identity().login(email, password).await?;
    store.identity().set_session(&identity).await?;

    println!("Signed in as {} ({})", identity.email, identity.role);
    Ok(())
}

pub async fn logout(store: &StoreHandle) -> Result<(), Box<dyn std::error::Error>> {
    store.identity().clear_session().await?;
    println!("Signed out");
    Ok(())
}

pub async fn whoami(store: &StoreHandle) -> Result<(), Box<dyn std::error::Error>> {
    let identity = require_session(store).await?;
    println!("{}\t{}\t{}", identity.id, identity.email, identity.role);
    Ok(())
}
