use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::descriptor::{self, AlterationSpec};
use crate::error::ConfigError;
use crate::types::Descriptor;

/// Tombstone mitigation shipped with the tool: seven autoscale tables moved to
/// size-tiered compaction with a one hour grace period.
pub const DEFAULT_DESCRIPTOR: &str = include_str!("../defaults/otter.toml");

/// On-disk descriptor layout.
///
/// TOML:
/// ```toml
/// keyspace = "otter"
///
/// [[alteration]]
/// table = "locks"
/// compaction = "SizeTieredCompactionStrategy"
/// min_threshold = 2
/// gc_grace_seconds = 3600
/// ```
///
/// JSON files use the same keys, with `alterations` accepted for the list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptorFile {
    pub keyspace: String,
    #[serde(rename = "alteration", alias = "alterations", default)]
    pub alterations: Vec<AlterationSpec>,
}

/// Serialization format of a descriptor source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    /// `.json` files are JSON; everything else is TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

impl DescriptorFile {
    pub fn parse(content: &str, format: Format) -> Result<Self, ConfigError> {
        Ok(match format {
            Format::Toml => toml::from_str(content)?,
            Format::Json => serde_json::from_str(content)?,
        })
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file = Self::parse(&content, Format::from_path(path))?;
        tracing::info!(
            "Loaded descriptor from {} ({} alterations)",
            path.display(),
            file.alterations.len()
        );
        Ok(file)
    }

    pub fn embedded_default() -> Result<Self, ConfigError> {
        Self::parse(DEFAULT_DESCRIPTOR, Format::Toml)
    }

    /// Validate into a run descriptor. `keyspace_override` replaces the file's
    /// keyspace when set.
    pub fn into_descriptor(self, keyspace_override: Option<&str>) -> Result<Descriptor, ConfigError> {
        let keyspace = keyspace_override.unwrap_or(self.keyspace.as_str());
        Ok(descriptor::load(keyspace, &self.alterations)?)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Load and validate the descriptor at `path`, or the embedded default when
/// no path is given.
pub fn load_descriptor(
    path: Option<&Path>,
    keyspace_override: Option<&str>,
) -> Result<Descriptor, ConfigError> {
    let file = match path {
        Some(p) => DescriptorFile::read(p)?,
        None => {
            tracing::debug!("No descriptor given, using embedded default");
            DescriptorFile::embedded_default()?
        }
    };
    file.into_descriptor(keyspace_override)
}
