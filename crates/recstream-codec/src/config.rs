use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

/// What to do with a record whose category names no known variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCategoryPolicy {
    /// Fail the decode. Streams stop at the first such record.
    #[default]
    Reject,
    /// Keep the record verbatim as [`recstream_types::Record::Unknown`].
    Preserve,
}

/// Configuration for a [`crate::RecordCodec`].
///
/// Every key is optional in the TOML form:
///
/// ```toml
/// discriminator_field = "category"
/// unknown_category = "reject"
/// pretty = false
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecConfig {
    /// Field carrying the variant tag.
    pub discriminator_field: String,
    /// Handling of unrecognised tags.
    pub unknown_category: UnknownCategoryPolicy,
    /// Pretty-print each encoded record.
    pub pretty: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            discriminator_field: "category".into(),
            unknown_category: UnknownCategoryPolicy::Reject,
            pretty: false,
        }
    }
}

impl CodecConfig {
    /// Default configuration that keeps unknown records instead of failing.
    pub fn lenient() -> Self {
        Self {
            unknown_category: UnknownCategoryPolicy::Preserve,
            ..Default::default()
        }
    }

    pub fn from_toml_str(text: &str) -> CodecResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| CodecError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> CodecResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> CodecResult<()> {
        if self.discriminator_field.is_empty() {
            return Err(CodecError::Config("discriminator_field must not be empty".into()));
        }
        Ok(())
    }
}
