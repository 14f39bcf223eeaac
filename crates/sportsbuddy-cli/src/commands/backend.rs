//! Backend command implementation.

use sportsbuddy_store::StoreHandle;

pub fn run(store: &StoreHandle) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", store.kind());
    Ok(())
}
