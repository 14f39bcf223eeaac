//! Output formatting utilities.

use sportsbuddy_model::{City, Event};

/// Formats an event as a table row.
pub fn format_event_row(event: &Event) -> String {
    format!(
        "{:<34} {:<17} {:<24} {:<13} {:<22} {}",
        event.id.as_str(),
        event.when.format("%Y-%m-%d %H:%M").to_string(),
        truncate(&event.name, 24),
        truncate(&event.category, 13),
        truncate(&format!("{} / {}", event.city, event.area), 22),
        event.author_label
    )
}

/// Prints the event table header.
#[allow(clippy::print_literal)]
pub fn print_event_header() {
    println!(
        "{:<34} {:<17} {:<24} {:<13} {:<22} {}",
        "EVENT_ID", "WHEN", "NAME", "CATEGORY", "PLACE", "AUTHOR"
    );
    println!("{}", "-".repeat(130));
}

/// Formats a city and its areas as a table row.
pub fn format_city_row(city: &City) -> String {
    format!("{:<20} {}", truncate(&city.name, 20), city.areas.join(", "))
}

/// Prints the city table header.
#[allow(clippy::print_literal)]
pub fn print_city_header() {
    println!("{:<20} {}", "CITY", "AREAS");
    println!("{}", "-".repeat(60));
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
