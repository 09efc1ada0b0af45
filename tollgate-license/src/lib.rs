//! Offline license activation and enforcement.
//!
//! This crate handles:
//! - Activation code decoding (length-prefixed envelope in base64url)
//! - RSA public key loading from PEM or bare base64 DER
//! - PKCS#1 v1.5 / SHA-256 signature verification
//! - License expiry and module entitlement checks
//! - Persisting the activation code and re-validating it at startup
//!
//! # Typical flow
//!
//! 1. Build a [`LicenseClient`] from a [`LicenseConfig`].
//! 2. Call [`LicenseClient::init`] when the application starts.
//! 3. Call [`LicenseClient::activate`] once with the code issued to the
//!    customer. The code is persisted and re-validated on later starts.
//! 4. Guard features with [`LicenseClient::check_license`] or
//!    [`LicenseClient::check_module`].
//!
//! No network calls are made at any point.
//!
//! # Activation Code Format
//!
//! `base64url([u32 BE data_len][data][u32 BE sig_len][signature])`, where
//! `data` is a JSON license document and `signature` is RSASSA-PKCS1-v1_5
//! over its SHA-256 digest.

mod client;
mod config;
mod envelope;
mod error;
mod key;
mod license;
mod logger;
mod status;
mod validator;

pub use client::LicenseClient;
pub use config::{LicenseConfig, DEFAULT_STORAGE_FILE};
pub use envelope::Envelope;
pub use error::{EnvelopeError, KeyError, LicenseError, LicenseResult, ValidationCause};
pub use key::PublicKey;
pub use license::License;
pub use logger::{LicenseLogger, NoopLogger, TracingLogger};
pub use status::LicenseStatus;
pub use validator::{validate, validate_at, validate_envelope};
