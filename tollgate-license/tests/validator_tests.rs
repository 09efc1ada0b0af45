mod common;

use base64::{engine::general_purpose::URL_SAFE, engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use common::{frame, license_json, perpetual_code, rogue_keys, vendor_keys};
use pretty_assertions::assert_eq;
use tollgate_license::{
    validate, validate_at, EnvelopeError, KeyError, License, LicenseError, ValidationCause,
};

fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

// ── Happy path ───────────────────────────────────────────────────

#[test]
fn validate_returns_signed_fields() {
    let keys = vendor_keys();
    let expire = ts("2040-03-01T00:00:00Z");
    let code = keys.activation_code(license_json(Some(expire), "m-a, m-b").as_bytes());

    let now = ts("2040-02-20T12:00:00Z");
    let license = validate_at(&keys.public_pem, &code, now).unwrap();

    let expected = License {
        license_code: "LIC-0001".into(),
        customer_code: "CUST-42".into(),
        customer_name: "Acme Corp".into(),
        product_code: "PRD-7".into(),
        product_name: "Widget Studio".into(),
        issuer_code: "ISS-1".into(),
        issuer_name: "Widget Vendor".into(),
        issue_at: Some(ts("2024-01-15T09:30:00Z")),
        expire_at: Some(expire),
        modules: "m-a, m-b".into(),
        max_instances: 5,
        valid: true,
        // 228 hours
        days_left: 9,
    };
    assert_eq!(license, expected);
}

#[test]
fn validate_with_bare_key() {
    let keys = vendor_keys();
    assert!(validate(&keys.public_bare, &perpetual_code()).is_ok());
}

#[test]
fn validate_accepts_wrapped_code() {
    let keys = vendor_keys();
    let code = perpetual_code();
    let wrapped = code
        .as_bytes()
        .chunks(60)
        .map(|c| std::str::from_utf8(c).unwrap())
        .collect::<Vec<_>>()
        .join("\r\n\t ");
    assert!(validate(&keys.public_pem, &wrapped).is_ok());
}

#[test]
fn validate_accepts_padded_code() {
    let keys = vendor_keys();
    let data = license_json(None, "m-a");
    let bytes = frame(data.as_bytes(), &keys.sign(data.as_bytes()));
    let padded = URL_SAFE.encode(&bytes);
    assert!(validate(&keys.public_pem, &padded).is_ok());
}

#[test]
fn validate_tolerates_trailing_bytes() {
    let keys = vendor_keys();
    let data = license_json(None, "m-a");
    let mut bytes = frame(data.as_bytes(), &keys.sign(data.as_bytes()));
    bytes.extend_from_slice(b"trailing garbage");
    let code = URL_SAFE_NO_PAD.encode(&bytes);
    assert!(validate(&keys.public_pem, &code).is_ok());
}

#[test]
fn missing_fields_take_zero_values() {
    let keys = vendor_keys();
    let code = keys.activation_code(br#"{"customer_name":"Solo"}"#);
    let license = validate(&keys.public_pem, &code).unwrap();
    assert_eq!(license.customer_name, "Solo");
    assert_eq!(license.license_code, "");
    assert_eq!(license.max_instances, 0);
    assert!(license.issue_at.is_none());
    assert!(license.expire_at.is_none());
    assert!(license.valid);
    assert_eq!(license.days_left, 0);
}

#[test]
fn payload_valid_flag_is_recomputed() {
    let keys = vendor_keys();
    let code = keys.activation_code(
        br#"{"expire_at":"2000-01-01T00:00:00Z","valid":true,"days_left":99}"#,
    );
    let license = validate(&keys.public_pem, &code).unwrap();
    assert!(!license.valid);
    assert!(license.days_left < 0);
}

// ── days_left ────────────────────────────────────────────────────

#[test]
fn days_left_ten_days() {
    let keys = vendor_keys();
    let now = Utc::now();
    let code = keys.activation_code(license_json(Some(now + Duration::days(10)), "").as_bytes());
    let license = validate_at(&keys.public_pem, &code, now).unwrap();
    assert_eq!(license.days_left, 10);
}

#[test]
fn days_left_truncates_sub_day_remainder() {
    let keys = vendor_keys();
    let now = ts("2040-01-01T00:00:00Z");
    let code = keys.activation_code(
        license_json(Some(now + Duration::hours(23) + Duration::minutes(59)), "").as_bytes(),
    );
    let license = validate_at(&keys.public_pem, &code, now).unwrap();
    assert!(license.valid);
    assert_eq!(license.days_left, 0);
}

#[test]
fn days_left_negative_when_expired() {
    let keys = vendor_keys();
    let now = ts("2040-01-10T00:00:00Z");
    let code = keys.activation_code(license_json(Some(ts("2040-01-07T00:00:00Z")), "").as_bytes());
    let license = validate_at(&keys.public_pem, &code, now).unwrap();
    assert!(!license.valid);
    assert_eq!(license.days_left, -3);
}

// ── Signature failures ───────────────────────────────────────────

#[test]
fn every_flipped_signature_byte_is_rejected() {
    let keys = vendor_keys();
    let data = license_json(None, "m-a");
    let sig = keys.sign(data.as_bytes());

    for i in 0..sig.len() {
        let mut bad = sig.clone();
        bad[i] ^= 0x01;
        let code = URL_SAFE_NO_PAD.encode(frame(data.as_bytes(), &bad));
        let result = validate(&keys.public_pem, &code);
        assert!(
            matches!(result, Err(LicenseError::SignatureInvalid)),
            "byte {i} flipped: {result:?}"
        );
    }
}

#[test]
fn tampered_payload_is_rejected() {
    let keys = vendor_keys();
    let data = license_json(None, "m-a");
    let sig = keys.sign(data.as_bytes());
    let forged = data.replace("m-a", "m-z");
    let code = URL_SAFE_NO_PAD.encode(frame(forged.as_bytes(), &sig));
    assert!(matches!(
        validate(&keys.public_pem, &code),
        Err(LicenseError::SignatureInvalid)
    ));
}

#[test]
fn other_signer_is_rejected() {
    let code = rogue_keys().activation_code(license_json(None, "m-a").as_bytes());
    assert!(matches!(
        validate(&vendor_keys().public_pem, &code),
        Err(LicenseError::SignatureInvalid)
    ));
}

#[test]
fn signature_is_checked_before_payload() {
    // Unsigned garbage payload must surface as a signature failure.
    let code = URL_SAFE_NO_PAD.encode(frame(b"not json", &[0u8; 256]));
    assert!(matches!(
        validate(&vendor_keys().public_pem, &code),
        Err(LicenseError::SignatureInvalid)
    ));
}

// ── Structural failures ──────────────────────────────────────────

#[test]
fn signed_non_json_payload_fails_validation() {
    let keys = vendor_keys();
    let code = keys.activation_code(b"not json");
    let err = validate(&keys.public_pem, &code).unwrap_err();
    assert!(matches!(
        err,
        LicenseError::ValidationFailed(ValidationCause::Payload(_))
    ));
    assert!(err.to_string().starts_with("license validation failed"));
}

#[test]
fn empty_code_fails_validation() {
    assert!(matches!(
        validate(&vendor_keys().public_pem, "  \n "),
        Err(LicenseError::ValidationFailed(ValidationCause::Envelope(
            EnvelopeError::Empty
        )))
    ));
}

#[test]
fn short_code_fails_validation() {
    let code = URL_SAFE_NO_PAD.encode([0u8, 0, 0, 1]);
    assert!(matches!(
        validate(&vendor_keys().public_pem, &code),
        Err(LicenseError::ValidationFailed(ValidationCause::Envelope(
            EnvelopeError::TooShort
        )))
    ));
}

#[test]
fn oversized_lengths_fail_validation() {
    let keys = vendor_keys();
    let data_overrun = URL_SAFE_NO_PAD.encode([0xff, 0xff, 0xff, 0xff, 1, 2, 3, 4, 5]);
    assert!(matches!(
        validate(&keys.public_pem, &data_overrun),
        Err(LicenseError::ValidationFailed(ValidationCause::Envelope(
            EnvelopeError::InvalidDataLength
        )))
    ));

    let sig_overrun = URL_SAFE_NO_PAD.encode([0, 0, 0, 1, b'x', 0x7f, 0xff, 0xff, 0xff, 1]);
    assert!(matches!(
        validate(&keys.public_pem, &sig_overrun),
        Err(LicenseError::ValidationFailed(ValidationCause::Envelope(
            EnvelopeError::InvalidSignatureLength
        )))
    ));
}

#[test]
fn bad_key_fails_validation() {
    let err = validate("", &perpetual_code()).unwrap_err();
    assert!(matches!(
        err,
        LicenseError::ValidationFailed(ValidationCause::PublicKey(KeyError::Empty))
    ));
    assert_eq!(err.to_string(), "license validation failed: public key is empty");
}

#[test]
fn envelope_is_checked_before_key() {
    assert!(matches!(
        validate("", "!!!"),
        Err(LicenseError::ValidationFailed(ValidationCause::Envelope(_)))
    ));
}
