//! Runtime license status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of the cached license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseStatus {
    /// A license is cached and unexpired.
    Valid,
    /// A license is cached but past its expiry.
    Expired,
    /// No license has been loaded or activated.
    NotActivated,
}

impl LicenseStatus {
    /// Returns the stable string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Expired => "expired",
            Self::NotActivated => "not_activated",
        }
    }

    /// Returns true only for [`LicenseStatus::Valid`].
    #[must_use]
    pub const fn is_usable(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
