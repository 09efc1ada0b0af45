//! Public key loading and RSA signature verification.
//!
//! Keys are X.509 SubjectPublicKeyInfo structures supplied either as a PEM
//! `PUBLIC KEY` block or as bare standard base64 of the DER bytes.
//! Signatures are RSASSA-PKCS1-v1_5 over the SHA-256 digest of the data
//! block.

use crate::error::{KeyError, LicenseError, LicenseResult};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rsa::pkcs8::{ObjectIdentifier, SubjectPublicKeyInfoRef};
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest, Sha256};

/// rsaEncryption (PKCS #1).
const RSA_ENCRYPTION_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

const PEM_MARKER: &str = "BEGIN PUBLIC KEY";
const PEM_HEADER: &str = "-----BEGIN PUBLIC KEY-----";
const PEM_FOOTER: &str = "-----END PUBLIC KEY-----";

/// RSA public key used to verify activation codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey(RsaPublicKey);

impl PublicKey {
    /// Loads a key from PEM or bare base64 DER.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is blank, cannot be decoded, is not a
    /// SubjectPublicKeyInfo, or holds a non-RSA key.
    pub fn load(material: &str) -> Result<Self, KeyError> {
        let trimmed = material.trim();
        if trimmed.is_empty() {
            return Err(KeyError::Empty);
        }

        let der = if trimmed.contains(PEM_MARKER) {
            pem::parse(trimmed)
                .map_err(KeyError::InvalidPem)?
                .contents()
                .to_vec()
        } else {
            BASE64.decode(strip_armor(trimmed))?
        };

        Self::from_der(&der)
    }

    /// Parses DER-encoded SubjectPublicKeyInfo bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are malformed or the key is not RSA.
    pub fn from_der(der: &[u8]) -> Result<Self, KeyError> {
        let spki = SubjectPublicKeyInfoRef::try_from(der)
            .map_err(|e| KeyError::Malformed(e.to_string()))?;

        if spki.algorithm.oid != RSA_ENCRYPTION_OID {
            return Err(KeyError::NotRsa);
        }

        RsaPublicKey::try_from(spki)
            .map(Self)
            .map_err(|e| KeyError::Malformed(e.to_string()))
    }

    /// Verifies a PKCS#1 v1.5 SHA-256 signature over `data`.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::SignatureInvalid`] on any failure. The
    /// underlying cause is not exposed.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> LicenseResult<()> {
        let digest = Sha256::digest(data);
        self.0
            .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
            .map_err(|_| LicenseError::SignatureInvalid)
    }

    /// Returns the underlying RSA key.
    #[must_use]
    pub fn as_rsa(&self) -> &RsaPublicKey {
        &self.0
    }
}

impl From<RsaPublicKey> for PublicKey {
    fn from(key: RsaPublicKey) -> Self {
        Self(key)
    }
}

/// Removes leftover armor lines and whitespace from a bare key.
fn strip_armor(material: &str) -> String {
    material
        .replace(PEM_HEADER, "")
        .replace(PEM_FOOTER, "")
        .replace(['\n', '\r', ' '], "")
}
