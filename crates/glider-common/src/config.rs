use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Largest frame a 3-byte VarInt length prefix can describe.
pub const MAX_FRAME_SIZE: usize = 2_097_151;
/// Largest uncompressed body accepted from a compressed frame.
pub const MAX_UNCOMPRESSED_SIZE: usize = 8_388_608;
pub const DEFAULT_MAX_STRING_CHARS: usize = 32_767;
pub const DEFAULT_MAX_COLLECTION_SIZE: usize = 65_536;
pub const DEFAULT_MAX_NBT_DEPTH: usize = 512;

/// Limits and switches shared by the codecs, registries and chunk serializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Upper bound on decoded string length, in characters.
    pub max_string_chars: usize,
    /// Upper bound on VarInt-counted collections.
    pub max_collection_size: usize,
    pub max_nbt_depth: usize,
    /// Substitute the oldest table when a version has no packet registry of its own.
    pub registry_fallback: bool,
    /// Turn chunk length mismatches into errors instead of warnings.
    pub strict_length_checks: bool,
    /// zlib level for pre-1.8 chunk payloads and transport compression.
    pub compression_level: u32,
    /// Bodies at or above this size are compressed once compression is enabled.
    pub compression_threshold: Option<usize>,
    pub max_frame_size: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_string_chars: DEFAULT_MAX_STRING_CHARS,
            max_collection_size: DEFAULT_MAX_COLLECTION_SIZE,
            max_nbt_depth: DEFAULT_MAX_NBT_DEPTH,
            registry_fallback: false,
            strict_length_checks: cfg!(debug_assertions),
            compression_level: 6,
            compression_threshold: None,
            max_frame_size: MAX_FRAME_SIZE,
        }
    }
}

impl CodecConfig {
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        let config: CodecConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.compression_level > 9 {
            return Err(ConfigError::Invalid(format!(
                "compression_level must be 0-9, got {}",
                self.compression_level
            )));
        }
        if self.max_frame_size == 0 || self.max_frame_size > MAX_FRAME_SIZE {
            return Err(ConfigError::Invalid(format!(
                "max_frame_size must be 1-{}, got {}",
                MAX_FRAME_SIZE, self.max_frame_size
            )));
        }
        if self.max_string_chars == 0 {
            return Err(ConfigError::Invalid("max_string_chars must be positive".into()));
        }
        if self.max_nbt_depth == 0 {
            return Err(ConfigError::Invalid("max_nbt_depth must be positive".into()));
        }
        Ok(())
    }

    /// Byte bound implied by the character bound (three bytes per BMP char).
    pub fn max_string_bytes(&self) -> usize {
        self.max_string_chars.saturating_mul(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_defaults() {
        let config = CodecConfig::default();
        assert_eq!(config.max_string_chars, 32_767);
        assert_eq!(config.max_string_bytes(), 98_301);
        assert_eq!(config.max_frame_size, MAX_FRAME_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            CodecConfig::from_json(r#"{ "registry_fallback": true, "compression_threshold": 256 }"#)
                .unwrap();
        assert!(config.registry_fallback);
        assert_eq!(config.compression_threshold, Some(256));
        assert_eq!(config.max_collection_size, DEFAULT_MAX_COLLECTION_SIZE);
    }

    #[test]
    fn test_invalid_values() {
        assert_matches!(
            CodecConfig::from_json(r#"{ "compression_level": 12 }"#),
            Err(ConfigError::Invalid(_))
        );
        assert_matches!(
            CodecConfig::from_json(r#"{ "max_frame_size": 9000000 }"#),
            Err(ConfigError::Invalid(_))
        );
        assert_matches!(
            CodecConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        );
    }
}
