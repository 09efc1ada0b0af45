//! Client configuration.

use crate::logger::LicenseLogger;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Relative location of the license file, under the home directory when
/// one is known.
pub const DEFAULT_STORAGE_FILE: &str = ".license/license.dat";

/// Settings for a [`LicenseClient`](crate::LicenseClient).
///
/// Deserializes from JSON with every key optional; missing keys take the
/// [`Default`] values.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    /// When false, `init` does nothing.
    pub enabled: bool,
    /// PEM or bare base64 SubjectPublicKeyInfo of the vendor's RSA key.
    pub public_key: String,
    /// Where the activation code is persisted. Empty disables loading and
    /// makes activation fail to persist.
    pub storage_path: PathBuf,
    /// Load and check the persisted license during `init`.
    pub validate_on_startup: bool,
    /// Let `init` succeed when the persisted license is missing, invalid or
    /// expired.
    pub allow_start_when_expired: bool,
    /// Sink for user-facing log records. `None` discards them.
    #[serde(skip)]
    pub logger: Option<Arc<dyn LicenseLogger>>,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            public_key: String::new(),
            storage_path: default_storage_path(),
            validate_on_startup: false,
            allow_start_when_expired: true,
            logger: None,
        }
    }
}

impl LicenseConfig {
    /// Parses a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON or a key has the
    /// wrong type.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Sets the public key material.
    #[must_use]
    pub fn with_public_key(mut self, public_key: impl Into<String>) -> Self {
        self.public_key = public_key.into();
        self
    }

    /// Sets the license file location.
    #[must_use]
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    /// Enables or disables licensing.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Toggles startup validation.
    #[must_use]
    pub fn with_validate_on_startup(mut self, validate: bool) -> Self {
        self.validate_on_startup = validate;
        self
    }

    /// Toggles soft-failing startup validation.
    #[must_use]
    pub fn with_allow_start_when_expired(mut self, allow: bool) -> Self {
        self.allow_start_when_expired = allow;
        self
    }

    /// Installs a log sink.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn LicenseLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Returns the storage path, or `None` when it is empty.
    #[must_use]
    pub fn storage_path(&self) -> Option<&Path> {
        (!self.storage_path.as_os_str().is_empty()).then_some(self.storage_path.as_path())
    }
}

impl fmt::Debug for LicenseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicenseConfig")
            .field("enabled", &self.enabled)
            .field("public_key_len", &self.public_key.len())
            .field("storage_path", &self.storage_path)
            .field("validate_on_startup", &self.validate_on_startup)
            .field("allow_start_when_expired", &self.allow_start_when_expired)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

fn default_storage_path() -> PathBuf {
    dirs::home_dir()
        .filter(|home| !home.as_os_str().is_empty())
        .map(|home| home.join(DEFAULT_STORAGE_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_FILE))
}
