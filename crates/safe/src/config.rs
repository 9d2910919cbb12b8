//! Default encodings for the [`Safe`](crate::Safe) facade.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    encoding::{
        Encoding, KEY_ENCODINGS, LOCKED_SAFE_ENCODINGS, UNLOCKED_SAFE_ENCODINGS, validate_encoding,
    },
    error::Result,
};

/// Encodings used by [`Safe::lock`](crate::Safe::lock) and
/// [`Safe::unlock`](crate::Safe::unlock).
///
/// ```toml
/// locked_safe_encoding = "base64"
/// key_encoding = "hex"
/// unlocked_safe_encoding = "string"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SafeConfig {
    pub locked_safe_encoding: Encoding,
    pub key_encoding: Encoding,
    pub unlocked_safe_encoding: Encoding,
}

impl Default for SafeConfig {
    fn default() -> Self {
        Self {
            locked_safe_encoding: Encoding::Binary,
            key_encoding: Encoding::Binary,
            unlocked_safe_encoding: Encoding::Binary,
        }
    }
}

impl SafeConfig {
    /// Parse from TOML and validate.
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from JSON and validate.
    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check each default against the encodings its value allows.
    pub fn validate(&self) -> Result<()> {
        validate_encoding(
            self.locked_safe_encoding,
            LOCKED_SAFE_ENCODINGS,
            "locked_safe_encoding",
        )?;
        validate_encoding(self.key_encoding, KEY_ENCODINGS, "key_encoding")?;
        validate_encoding(
            self.unlocked_safe_encoding,
            UNLOCKED_SAFE_ENCODINGS,
            "unlocked_safe_encoding",
        )
    }
}

/// Load config from a `.toml` or `.json` file.
pub fn load_config(path: &Path) -> anyhow::Result<SafeConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let config = parse_config(&raw, path)?;

    #[cfg(feature = "tracing")]
    tracing::debug!(
        path = %path.display(),
        locked_safe_encoding = %config.locked_safe_encoding,
        key_encoding = %config.key_encoding,
        unlocked_safe_encoding = %config.unlocked_safe_encoding,
        "loaded safe config"
    );

    Ok(config)
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<SafeConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => SafeConfig::from_toml_str(raw),
        "json" => SafeConfig::from_json_str(raw),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
