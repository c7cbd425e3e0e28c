//! Editor configuration.

use crate::board::DEFAULT_COLOR_TAG;
use crate::storage::DEFAULT_AUTOSAVE_INTERVAL_SECS;
use serde::{Deserialize, Serialize};

/// Namespace tag prefixed to every stored image reference.
pub const DEFAULT_STORAGE_NAMESPACE: &str = "tierlist-image:";

/// Query parameter carrying a shared board.
pub const DEFAULT_SHARE_PARAM: &str = "board";

/// Image normalization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Edge length of the normalized square, in pixels.
    pub size: u32,
    /// JPEG quality (1-100).
    pub quality: u8,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            size: 100,
            quality: 80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierListConfig {
    pub image: ImageConfig,
    pub storage_namespace: String,
    pub share_param: String,
    pub default_color: String,
    pub autosave_interval_secs: u64,
}

impl Default for TierListConfig {
    fn default() -> Self {
        Self {
            image: ImageConfig::default(),
            storage_namespace: DEFAULT_STORAGE_NAMESPACE.to_string(),
            share_param: DEFAULT_SHARE_PARAM.to_string(),
            default_color: DEFAULT_COLOR_TAG.to_string(),
            autosave_interval_secs: DEFAULT_AUTOSAVE_INTERVAL_SECS,
        }
    }
}

impl TierListConfig {
    /// Parse a (possibly partial) JSON configuration; missing fields keep
    /// their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = TierListConfig::from_json(r#"{"image":{"size":64}}"#).unwrap();
        assert_eq!(config.image.size, 64);
        assert_eq!(config.image.quality, 80);
        assert_eq!(config.storage_namespace, DEFAULT_STORAGE_NAMESPACE);
        assert_eq!(config.share_param, "board");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(TierListConfig::from_json("{").is_err());
    }
}
