//!
//! Startup settings, read from TOML.
//!
//! ```toml
//! [cache]
//! policy = "never"
//!
//! [[indirection]]
//! model = "auth.group"
//! attribute = "user"
//! ```
//!
//! Parsing only checks shape. Whether the models exist is checked when the
//! settings are turned into an [`IndirectionRegistry`](crate::registry::IndirectionRegistry).

use std::path::Path;

use crate::error::{AccessError, Result};
use crate::resolver::CachePolicy;

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub indirection: Vec<IndirectionEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSettings {
    #[serde(default)]
    pub policy: CachePolicy,
}

/// One `(indirect model, membership attribute)` pair.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndirectionEntry {
    pub model: String,
    pub attribute: String,
}

impl Settings {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| AccessError::Config(format!("invalid settings: {e}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AccessError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    pub fn with_indirection(mut self, model: &str, attribute: &str) -> Self {
        self.indirection.push(IndirectionEntry {
            model: model.to_owned(),
            attribute: attribute.to_owned(),
        });
        self
    }
}
