/// Standard output utilities for consistent command formatting
use colored::*;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color as TableColor, ContentArrangement, Table};

use tempora_core::config::ClockMode;
use tempora_core::Timestamp;

/// Display a section header
pub fn section_header(title: &str) {
    println!("\n{}", title.bold().cyan());
}

/// Display a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Display an info message
pub fn info(message: &str) {
    println!("{} {}", "●".blue(), message);
}

/// Display an empty/none indicator
pub fn empty(message: &str) {
    println!("{} {}", "◌".dimmed(), message);
}

/// Create a standard table with our preferred styling
pub fn create_standard_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Create a standard header cell
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .add_attribute(Attribute::Bold)
        .fg(TableColor::Cyan)
}

/// A cut as printed: wall-clock cuts also show the instant they stand for
pub fn format_cut(t: Timestamp, clock: ClockMode) -> String {
    if t.is_open() {
        return "open".to_string();
    }
    match clock {
        ClockMode::Logical => t.to_string(),
        ClockMode::Wall => match chrono::DateTime::from_timestamp_millis(t.value()) {
            Some(at) => format!("{} ({})", t, at.format("%Y-%m-%d %H:%M:%S%.3f UTC")),
            None => t.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cut() {
        assert_eq!(format_cut(Timestamp::new(3), ClockMode::Logical), "3");
        assert_eq!(format_cut(Timestamp::OPEN, ClockMode::Wall), "open");
        assert_eq!(
            format_cut(Timestamp::new(1_700_000_000_000), ClockMode::Wall),
            "1700000000000 (2023-11-14 22:13:20.000 UTC)"
        );
    }
}
