//! Tier List web shell
//!
//! Bridges a JavaScript rendering layer to the tier list editor: untyped
//! drop ids and key names coming from the DOM are turned into typed events
//! here, and the board is handed back as JSON.

use tierlist_core::{DropTarget, TierListConfig};

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{TierListApp, run_wasm};

/// Convert the ids reported under the pointer into drop targets.
pub fn drop_targets<S: AsRef<str>>(over_ids: &[S]) -> Vec<DropTarget> {
    over_ids
        .iter()
        .map(|id| DropTarget::from_raw_id(id.as_ref()))
        .collect()
}

/// Parse an optional JSON config, falling back to defaults when it is
/// absent or malformed.
pub fn parse_config(json: Option<&str>) -> TierListConfig {
    match json.map(TierListConfig::from_json) {
        Some(Ok(config)) => config,
        Some(Err(e)) => {
            log::warn!("Ignoring invalid config: {}", e);
            TierListConfig::default()
        }
        None => TierListConfig::default(),
    }
}
