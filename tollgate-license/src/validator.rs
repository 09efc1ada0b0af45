//! The activation code validation pipeline.
//!
//! Decode the envelope, load the key, verify the signature, then parse the
//! payload. The signature is always checked before the payload is parsed,
//! so payload errors only ever arise on authentic data.

use crate::envelope::Envelope;
use crate::error::LicenseResult;
use crate::key::PublicKey;
use crate::license::License;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Validates an activation code against a public key at the current time.
///
/// # Errors
///
/// Returns [`LicenseError::SignatureInvalid`](crate::LicenseError::SignatureInvalid)
/// if the signature does not verify, and
/// [`LicenseError::ValidationFailed`](crate::LicenseError::ValidationFailed)
/// for malformed codes, keys or payloads.
pub fn validate(public_key: &str, activation_code: &str) -> LicenseResult<License> {
    validate_at(public_key, activation_code, Utc::now())
}

/// Like [`validate`], with an explicit clock reading.
///
/// # Errors
///
/// See [`validate`].
pub fn validate_at(
    public_key: &str,
    activation_code: &str,
    now: DateTime<Utc>,
) -> LicenseResult<License> {
    let envelope = Envelope::decode(activation_code)?;
    let key = PublicKey::load(public_key)?;
    validate_envelope(&key, &envelope, now)
}

/// Verifies and parses an already-decoded envelope.
///
/// # Errors
///
/// See [`validate`].
pub fn validate_envelope(
    key: &PublicKey,
    envelope: &Envelope,
    now: DateTime<Utc>,
) -> LicenseResult<License> {
    key.verify(&envelope.data, &envelope.signature)?;

    let license = License::from_payload(&envelope.data)?.evaluated_at(now);
    debug!(
        license_code = %license.license_code,
        valid = license.valid,
        days_left = license.days_left,
        "Activation code verified"
    );
    Ok(license)
}
