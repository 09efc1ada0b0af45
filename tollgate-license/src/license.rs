//! The license record carried inside an activation code.
//!
//! The signed data block is a JSON document whose keys match the field
//! names below. Missing keys take their zero value. Timestamps are RFC 3339
//! strings; `null`, `""` and the zero instant `0001-01-01T00:00:00Z` all
//! mean "not set".

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A verified license.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct License {
    /// Unique identifier of the issued license.
    pub license_code: String,
    /// Licensee identifier.
    pub customer_code: String,
    /// Licensee display name.
    pub customer_name: String,
    /// Licensed product identifier.
    pub product_code: String,
    /// Licensed product display name.
    pub product_name: String,
    /// Issuing authority identifier.
    pub issuer_code: String,
    /// Issuing authority display name.
    pub issuer_name: String,
    /// When the license was issued.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub issue_at: Option<DateTime<Utc>>,
    /// Expiry boundary, or `None` for a license that never expires.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub expire_at: Option<DateTime<Utc>>,
    /// Comma-separated module entitlements.
    pub modules: String,
    /// Seat cap. Informational only.
    pub max_instances: i64,
    /// Whether the license was unexpired when it was validated.
    pub valid: bool,
    /// Whole days between validation time and expiry. Negative once expired.
    pub days_left: i64,
}

impl License {
    /// Parses a license from the signed data block.
    ///
    /// `valid` and `days_left` are taken as-is from the document; call
    /// [`License::evaluated_at`] to recompute them.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a JSON license document.
    pub fn from_payload(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }

    /// Returns true if the license has an expiry and it lies before `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expire_at.is_some_and(|exp| exp < now)
    }

    /// Returns true if `module` appears as an exact token in `modules`.
    ///
    /// Tokens and the query are trimmed before comparison. An empty query
    /// never matches.
    #[must_use]
    pub fn has_module(&self, module: &str) -> bool {
        let module = module.trim();
        !module.is_empty() && self.module_list().any(|m| m == module)
    }

    /// Iterates over the trimmed, non-empty module tokens.
    pub fn module_list(&self) -> impl Iterator<Item = &str> {
        self.modules
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }

    /// Recomputes `valid` and `days_left` against `now`.
    ///
    /// `days_left` is the number of whole hours remaining divided by 24,
    /// truncated toward zero, so a license with a few hours left reports 0.
    /// It is left untouched when the license never expires.
    #[must_use]
    pub fn evaluated_at(mut self, now: DateTime<Utc>) -> Self {
        self.valid = !self.is_expired(now);
        if let Some(exp) = self.expire_at {
            self.days_left = (exp - now).num_hours() / 24;
        }
        self
    }
}

/// Accepts an RFC 3339 string, `null`, `""` or the zero instant.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };

    let parsed = DateTime::parse_from_rfc3339(raw.trim())
        .map_err(serde::de::Error::custom)?
        .with_timezone(&Utc);

    Ok((parsed != zero_instant()).then_some(parsed))
}

fn zero_instant() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
