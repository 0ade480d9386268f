use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    DEFAULT_ACCEPTED_TYPES, DEFAULT_MAX_EVIDENCE_BYTES, DEFAULT_MAX_EVIDENCE_FILES,
    NAVIGATION_DELAY_MS,
};

/// Runtime knobs the shell may override with `Event::Configure`.
///
/// Every field has a default matching the public portal, so a partial JSON
/// object is a valid configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub max_files: usize,
    pub max_file_bytes: u64,
    /// Lower-case extensions including the leading dot.
    pub accepted_types: Vec<String>,
    pub navigation_delay_ms: u64,
    /// When set, identified (non-anonymous) reports must carry a contact
    /// name and email.
    pub require_contact_when_identified: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_EVIDENCE_FILES,
            max_file_bytes: DEFAULT_MAX_EVIDENCE_BYTES,
            accepted_types: DEFAULT_ACCEPTED_TYPES.iter().map(|t| (*t).to_string()).collect(),
            navigation_delay_ms: NAVIGATION_DELAY_MS,
            require_contact_when_identified: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max_files must be at least 1")]
    NoFilesAllowed,
    #[error("max_file_bytes must be at least 1")]
    ZeroFileSize,
    #[error("accepted type {0:?} must start with a dot")]
    BadExtension(String),
}

impl PortalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_files == 0 {
            return Err(ConfigError::NoFilesAllowed);
        }
        if self.max_file_bytes == 0 {
            return Err(ConfigError::ZeroFileSize);
        }
        if let Some(bad) = self
            .accepted_types
            .iter()
            .find(|t| !t.trim().starts_with('.') || t.trim().len() < 2)
        {
            return Err(ConfigError::BadExtension(bad.clone()));
        }
        Ok(())
    }

    #[must_use]
    pub fn staging_limits(&self) -> crate::staging::StagingLimits {
        crate::staging::StagingLimits {
            max_files: self.max_files,
            max_file_bytes: self.max_file_bytes,
            accepted_types: self
                .accepted_types
                .iter()
                .map(|t| t.trim().to_lowercase())
                .collect(),
        }
    }
}
