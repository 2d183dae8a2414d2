pub mod categories;
pub mod quote;
pub mod set;
pub mod setup;
pub mod ui;
pub mod watch;

use crate::core::pricing::UNSELECTED_CATEGORY;
use crate::core::settings::parse_leading_number;

/// Reads a price the way store values are read. Unreadable input prices
/// as `0`.
pub fn parse_price(input: &str) -> f64 {
    parse_leading_number(input).unwrap_or(0.0)
}

/// Maps the command-line category to the engine's selection.
pub fn parse_category(input: Option<&str>) -> Option<&str> {
    input
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != UNSELECTED_CATEGORY)
}
