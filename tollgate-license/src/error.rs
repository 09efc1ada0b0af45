//! Error types for the licensing module.

use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// No license has ever been loaded or activated.
    #[error("system not activated")]
    LicenseNotFound,

    /// A license is cached but its expiry has passed.
    #[error("license expired")]
    LicenseExpired,

    /// Signature verification failed. Carries no detail.
    #[error("signature verification failed")]
    SignatureInvalid,

    /// Envelope, public key or payload is malformed.
    #[error("license validation failed: {0}")]
    ValidationFailed(#[source] ValidationCause),

    /// The license is valid but does not grant the module.
    #[error("unauthorized module: {module}")]
    ModuleUnauthorized {
        /// The module that was requested.
        module: String,
    },

    /// Reading or writing the license file failed.
    #[error("{context}: {source}")]
    StorageFailure {
        /// What the client was doing.
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl LicenseError {
    pub(crate) fn storage(context: &'static str, source: std::io::Error) -> Self {
        Self::StorageFailure { context, source }
    }
}

/// Structural cause behind [`LicenseError::ValidationFailed`].
#[derive(Debug, Error)]
pub enum ValidationCause {
    /// The activation code could not be unpacked.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// The public key could not be loaded.
    #[error(transparent)]
    PublicKey(#[from] KeyError),

    /// The signed data block is not a license document.
    #[error("invalid license payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl From<ValidationCause> for LicenseError {
    fn from(cause: ValidationCause) -> Self {
        Self::ValidationFailed(cause)
    }
}

impl From<EnvelopeError> for LicenseError {
    fn from(err: EnvelopeError) -> Self {
        Self::ValidationFailed(err.into())
    }
}

impl From<KeyError> for LicenseError {
    fn from(err: KeyError) -> Self {
        Self::ValidationFailed(err.into())
    }
}

impl From<serde_json::Error> for LicenseError {
    fn from(err: serde_json::Error) -> Self {
        Self::ValidationFailed(err.into())
    }
}

/// Activation code decoding errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// Nothing left after stripping whitespace.
    #[error("empty activation code")]
    Empty,

    /// Neither base64url variant accepted the input.
    #[error("invalid activation code encoding: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// Fewer than 8 bytes after decoding.
    #[error("activation payload too short")]
    TooShort,

    /// The data length prefix runs past the end of the buffer.
    #[error("invalid data length")]
    InvalidDataLength,

    /// The signature length prefix runs past the end of the buffer.
    #[error("invalid signature length")]
    InvalidSignatureLength,
}

/// Public key loading errors.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The key string is blank.
    #[error("public key is empty")]
    Empty,

    /// The PEM armor could not be decoded.
    #[error("invalid PEM public key")]
    InvalidPem(#[source] pem::PemError),

    /// The bare key is not valid standard base64.
    #[error("invalid public key encoding: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// The bytes are not a SubjectPublicKeyInfo structure.
    #[error("invalid public key: {0}")]
    Malformed(String),

    /// The key uses an algorithm other than rsaEncryption.
    #[error("public key is not RSA")]
    NotRsa,
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
