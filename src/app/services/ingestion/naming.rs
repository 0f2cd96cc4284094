//! Resource names and descriptions derived from the ingestion window

use super::window::TimeWindow;
use crate::constants::DATE_FORMAT;
use crate::error::{IngestionError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};

/// Expand strftime fields of `pattern` with the window start.
///
/// Patterns chrono cannot parse are rejected rather than rendered partially.
pub fn resource_name(pattern: &str, after: DateTime<Utc>) -> Result<String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(IngestionError::configuration(format!(
            "Invalid resource name pattern '{}'",
            pattern
        )));
    }

    Ok(after.format_with_items(items.into_iter()).to_string())
}

/// Replace `%{after}` and `%{before}` with the window's dates
pub fn render_description(template: &str, window: &TimeWindow) -> String {
    template
        .replace("%{after}", &window.after.format(DATE_FORMAT).to_string())
        .replace("%{before}", &window.before.format(DATE_FORMAT).to_string())
}
