//! Activation code envelope decoding.
//!
//! An activation code is `base64url(envelope)` where the envelope is:
//!
//! ```text
//! [u32 BE data_len][data][u32 BE sig_len][signature]
//! ```
//!
//! Codes are often line-wrapped for display, so spaces, tabs and line
//! breaks are stripped before decoding. Bytes after the signature block
//! are ignored.

use crate::error::EnvelopeError;
use base64::{
    alphabet,
    engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD},
    engine::DecodePaddingMode,
    Engine,
};

const LEN_PREFIX: usize = 4;

const URL_SAFE_LENIENT_NO_PAD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone)
        .with_decode_allow_trailing_bits(true),
);

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::RequireCanonical)
        .with_decode_allow_trailing_bits(true),
);

/// The signed data block and its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// The signed license document.
    pub data: Vec<u8>,
    /// Signature over `data`.
    pub signature: Vec<u8>,
}

impl Envelope {
    /// Decodes an activation code string into its data and signature.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is empty, is not base64url, or its
    /// length prefixes run past the end of the decoded bytes.
    pub fn decode(activation_code: &str) -> Result<Self, EnvelopeError> {
        let cleaned = strip_whitespace(activation_code);
        let bytes = decode_base64url(&cleaned)?;
        Self::from_bytes(&bytes)
    }

    /// Splits an already-decoded envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is shorter than two length prefixes
    /// or either prefix overruns it.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        if bytes.len() < 2 * LEN_PREFIX {
            return Err(EnvelopeError::TooShort);
        }

        let data_len = read_len(bytes, 0).ok_or(EnvelopeError::InvalidDataLength)?;
        let sig_len_offset = LEN_PREFIX
            .checked_add(data_len)
            .filter(|offset| offset.saturating_add(LEN_PREFIX) <= bytes.len())
            .ok_or(EnvelopeError::InvalidDataLength)?;
        let data = &bytes[LEN_PREFIX..sig_len_offset];

        let sig_len =
            read_len(bytes, sig_len_offset).ok_or(EnvelopeError::InvalidSignatureLength)?;
        let sig_start = sig_len_offset + LEN_PREFIX;
        let sig_end = sig_start
            .checked_add(sig_len)
            .filter(|end| *end <= bytes.len())
            .ok_or(EnvelopeError::InvalidSignatureLength)?;

        Ok(Self {
            data: data.to_vec(),
            signature: bytes[sig_start..sig_end].to_vec(),
        })
    }

    /// Frames `data` and `signature` into envelope bytes.
    ///
    /// Inverse of [`Envelope::from_bytes`].
    ///
    /// # Errors
    ///
    /// Returns a length error if either section is longer than `u32::MAX`
    /// bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        let data_len = frame_len(self.data.len(), EnvelopeError::InvalidDataLength)?;
        let sig_len = frame_len(self.signature.len(), EnvelopeError::InvalidSignatureLength)?;

        let mut out = Vec::with_capacity(2 * LEN_PREFIX + self.data.len() + self.signature.len());
        out.extend_from_slice(&data_len);
        out.extend_from_slice(&self.data);
        out.extend_from_slice(&sig_len);
        out.extend_from_slice(&self.signature);
        Ok(out)
    }

    /// Encodes the envelope as an unpadded base64url activation code.
    ///
    /// # Errors
    ///
    /// Fails like [`Envelope::to_bytes`].
    pub fn encode(&self) -> Result<String, EnvelopeError> {
        Ok(URL_SAFE_NO_PAD.encode(self.to_bytes()?))
    }
}

fn frame_len(len: usize, err: EnvelopeError) -> Result<[u8; LEN_PREFIX], EnvelopeError> {
    u32::try_from(len).map(u32::to_be_bytes).map_err(|_| err)
}

fn strip_whitespace(code: &str) -> String {
    code.chars()
        .filter(|c| !matches!(c, ' ' | '\t' | '\n' | '\r'))
        .collect()
}

/// Unpadded first, padded second. The first success wins.
///
/// Non-zero bits in the final character are tolerated, as most base64url
/// encoders in the wild accept them.
fn decode_base64url(cleaned: &str) -> Result<Vec<u8>, EnvelopeError> {
    if cleaned.is_empty() {
        return Err(EnvelopeError::Empty);
    }
    match URL_SAFE_LENIENT_NO_PAD.decode(cleaned) {
        Ok(bytes) => Ok(bytes),
        Err(_) => Ok(URL_SAFE_LENIENT.decode(cleaned)?),
    }
}

fn read_len(bytes: &[u8], offset: usize) -> Option<usize> {
    let end = offset.checked_add(LEN_PREFIX)?;
    let prefix: [u8; LEN_PREFIX] = bytes.get(offset..end)?.try_into().ok()?;
    usize::try_from(u32::from_be_bytes(prefix)).ok()
}
