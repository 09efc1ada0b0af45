//! Shared test helpers for license tests.

#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD, engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

/// An RSA key pair with its public half pre-encoded both ways.
pub struct TestKeys {
    pub private: RsaPrivateKey,
    pub public_pem: String,
    pub public_bare: String,
}

impl TestKeys {
    fn generate() -> Self {
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        let public = private.to_public_key();
        let public_pem = public.to_public_key_pem(LineEnding::LF).unwrap();
        let public_bare = STANDARD.encode(public.to_public_key_der().unwrap().as_bytes());
        Self {
            private,
            public_pem,
            public_bare,
        }
    }

    /// PKCS#1 v1.5 signature over the SHA-256 digest of `data`.
    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        let digest = Sha256::digest(data);
        self.private
            .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
            .unwrap()
    }

    /// Signs `data` and wraps it into an activation code.
    pub fn activation_code(&self, data: &[u8]) -> String {
        URL_SAFE_NO_PAD.encode(frame(data, &self.sign(data)))
    }
}

/// The vendor key pair shared by every test in a binary.
pub fn vendor_keys() -> &'static TestKeys {
    static KEYS: OnceLock<TestKeys> = OnceLock::new();
    KEYS.get_or_init(TestKeys::generate)
}

/// A second, unrelated key pair.
pub fn rogue_keys() -> &'static TestKeys {
    static KEYS: OnceLock<TestKeys> = OnceLock::new();
    KEYS.get_or_init(TestKeys::generate)
}

/// `[u32 BE len][data][u32 BE len][sig]`
pub fn frame(data: &[u8], sig: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(data);
    out.extend_from_slice(&(sig.len() as u32).to_be_bytes());
    out.extend_from_slice(sig);
    out
}

/// Full license document with the given expiry and modules.
pub fn license_json(expire_at: Option<DateTime<Utc>>, modules: &str) -> String {
    let expire = expire_at.map_or_else(|| "null".to_string(), |e| format!("\"{}\"", e.to_rfc3339()));
    format!(
        r#"{{
            "license_code": "LIC-0001",
            "customer_code": "CUST-42",
            "customer_name": "Acme Corp",
            "product_code": "PRD-7",
            "product_name": "Widget Studio",
            "issuer_code": "ISS-1",
            "issuer_name": "Widget Vendor",
            "issue_at": "2024-01-15T09:30:00Z",
            "expire_at": {expire},
            "modules": "{modules}",
            "max_instances": 5
        }}"#
    )
}

/// Vendor-signed code expiring `delta` from now.
pub fn code_expiring_in(delta: Duration) -> String {
    let json = license_json(Some(Utc::now() + delta), "m-a, m-b");
    vendor_keys().activation_code(json.as_bytes())
}

/// Vendor-signed code that never expires.
pub fn perpetual_code() -> String {
    let json = license_json(None, "m-a, m-b");
    vendor_keys().activation_code(json.as_bytes())
}
