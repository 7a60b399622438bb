//! License codec tests: round-trip, tamper sensitivity, uniqueness,
//! secret sensitivity, and the exact key grammar.

use chrono::{TimeZone, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use viberyt::license::{KeyError, LicenseCodec, LicenseType, Quota};

const SECRET: &str = "test-secret";

fn codec() -> LicenseCodec {
    LicenseCodec::new(SECRET)
}

/// Recomputes a checksum the way the codec does, for forging test keys
/// that pass the checksum but fail later stages.
fn checksum_for(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    hasher.update(b"_");
    hasher.update(SECRET.as_bytes());
    hex::encode(hasher.finalize())[0..4].to_uppercase()
}

fn fixed_parts() -> (Uuid, chrono::DateTime<Utc>) {
    let id = Uuid::parse_str("0a4edd22-1111-4222-8333-444455556666").unwrap();
    let at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
    (id, at)
}

// ── Round-trip ───────────────────────────────────────────────────

#[test]
fn round_trip_trial() {
    let generated = codec().generate(LicenseType::Trial, 7, "Alice", "a@x.com");
    let info = codec().validate(&generated.key).unwrap();
    assert_eq!(info.license_type, LicenseType::Trial);
    assert_eq!(info.type_name, "TRIAL");
    assert_eq!(info.days, 7);
    assert!(!info.is_lifetime);
    assert_eq!(info.key, generated.key);
}

#[test]
fn round_trip_lifetime_forces_negative_days() {
    // Caller-supplied days are ignored for lifetime keys.
    let generated = codec().generate(LicenseType::Lifetime, 365, "Bob", "b@x.com");
    assert_eq!(generated.metadata.days, -1);
    let info = codec().validate(&generated.key).unwrap();
    assert_eq!(info.license_type, LicenseType::Lifetime);
    assert_eq!(info.days, -1);
    assert!(info.is_lifetime);
}

#[test]
fn round_trip_demo() {
    let generated = codec().generate(LicenseType::Demo, 5, "", "");
    let info = codec().validate(&generated.key).unwrap();
    assert_eq!(info.license_type, LicenseType::Demo);
    assert_eq!(info.days, 5);
    assert!(!info.is_lifetime);
}

#[test]
fn round_trip_large_day_count() {
    let generated = codec().generate(LicenseType::Trial, 12345, "", "");
    let info = codec().validate(&generated.key).unwrap();
    assert_eq!(info.days, 12345);
}

// ── Format invariants ────────────────────────────────────────────

#[test]
fn generated_keys_match_grammar() {
    let c = codec();
    for (t, days) in [
        (LicenseType::Trial, 7),
        (LicenseType::Lifetime, -1),
        (LicenseType::Demo, 5),
    ] {
        let key = c.generate(t, days, "Carol", "c@x.com").key;
        assert!(key.starts_with("VIBE-"), "bad prefix: {key}");

        let parts: Vec<&str> = key.split('-').collect();
        assert_eq!(parts.len(), 6, "bad field count: {key}");
        assert!(
            matches!(parts[1].chars().next(), Some('T' | 'L' | 'D')),
            "bad type code: {key}"
        );
        for hash_field in &parts[2..6] {
            assert_eq!(hash_field.len(), 4);
            assert!(
                hash_field
                    .chars()
                    .all(|ch| ch.is_ascii_hexdigit() && !ch.is_ascii_lowercase()),
                "hash field not uppercase hex: {key}"
            );
        }
    }
}

#[test]
fn trial_key_encodes_padded_duration() {
    let key = codec().generate_trial("Bob", "b@x.com").key;
    let parts: Vec<&str> = key.split('-').collect();
    assert_eq!(parts[1], "T0007");

    let info = codec().validate(&key).unwrap();
    assert_eq!(info.license_type, LicenseType::Trial);
    assert_eq!(info.days, 7);
    assert!(!info.is_lifetime);
}

#[test]
fn lifetime_key_encodes_life_marker() {
    let key = codec().generate_lifetime("Bob", "b@x.com").key;
    let parts: Vec<&str> = key.split('-').collect();
    assert_eq!(parts[1], "LLIFE");

    let info = codec().validate(&key).unwrap();
    assert_eq!(info.license_type, LicenseType::Lifetime);
    assert_eq!(info.days, -1);
    assert!(info.is_lifetime);
}

#[test]
fn demo_key_encodes_recording_budget() {
    let key = codec().generate_demo(5, "", "").key;
    let parts: Vec<&str> = key.split('-').collect();
    assert_eq!(parts[1], "D0005");
}

// ── Determinism and uniqueness ───────────────────────────────────

#[test]
fn injected_parts_pin_the_key() {
    let (id, at) = fixed_parts();
    let c = codec();
    let a = c.generate_with_parts(LicenseType::Trial, 7, "Alice", "a@x.com", id, at);
    let b = c.generate_with_parts(LicenseType::Trial, 7, "Alice", "a@x.com", id, at);
    assert_eq!(a.key, b.key);
}

#[test]
fn fresh_generations_differ_even_for_identical_customers() {
    let c = codec();
    let a = c.generate(LicenseType::Trial, 7, "Alice", "a@x.com").key;
    let b = c.generate(LicenseType::Trial, 7, "Alice", "a@x.com").key;
    assert_ne!(a, b);
}

#[test]
fn unique_id_changes_hash_segments_but_not_visible_fields() {
    let (_, at) = fixed_parts();
    let c = codec();
    let a = c.generate_with_parts(LicenseType::Trial, 7, "A", "a@x", Uuid::new_v4(), at);
    let b = c.generate_with_parts(LicenseType::Trial, 7, "A", "a@x", Uuid::new_v4(), at);
    assert_ne!(a.key, b.key);
    assert_eq!(a.key.split('-').nth(1), b.key.split('-').nth(1));
}

// ── Tamper sensitivity ───────────────────────────────────────────

#[test]
fn tampering_type_field_invalidates() {
    let (id, at) = fixed_parts();
    let key = codec()
        .generate_with_parts(LicenseType::Trial, 7, "Bob", "b@x.com", id, at)
        .key;
    // T -> L in the type position.
    let tampered = key.replacen("-T", "-L", 1);
    assert_ne!(key, tampered);
    assert!(codec().validate(&tampered).is_err());
}

#[test]
fn tampering_duration_digit_invalidates() {
    let (id, at) = fixed_parts();
    let key = codec()
        .generate_with_parts(LicenseType::Trial, 7, "Bob", "b@x.com", id, at)
        .key;
    let tampered = key.replacen("T0007", "T0008", 1);
    assert_ne!(key, tampered);
    assert_eq!(
        codec().validate(&tampered).unwrap_err(),
        KeyError::InvalidChecksum
    );
}

#[test]
fn tampering_hash_segment_invalidates() {
    let (id, at) = fixed_parts();
    let key = codec()
        .generate_with_parts(LicenseType::Trial, 7, "Bob", "b@x.com", id, at)
        .key;
    // Byte 11 is the first character of the H1 segment.
    let mut bytes = key.clone().into_bytes();
    bytes[11] = if bytes[11] == b'0' { b'1' } else { b'0' };
    let tampered = String::from_utf8(bytes).unwrap();
    assert_ne!(key, tampered);
    assert!(codec().validate(&tampered).is_err());
}

#[test]
fn tampering_checksum_invalidates() {
    let (id, at) = fixed_parts();
    let key = codec()
        .generate_with_parts(LicenseType::Trial, 7, "Bob", "b@x.com", id, at)
        .key;
    let mut bytes = key.clone().into_bytes();
    let last = bytes.len() - 1;
    bytes[last] = if bytes[last] == b'0' { b'1' } else { b'0' };
    let tampered = String::from_utf8(bytes).unwrap();
    assert_eq!(
        codec().validate(&tampered).unwrap_err(),
        KeyError::InvalidChecksum
    );
}

// ── Secret sensitivity ───────────────────────────────────────────

#[test]
fn key_fails_validation_under_different_secret() {
    let key = codec().generate_trial("Alice", "a@x.com").key;
    let other = LicenseCodec::new("another-secret");
    assert_eq!(other.validate(&key).unwrap_err(), KeyError::InvalidChecksum);
    // And still validates under the issuing secret.
    assert!(codec().validate(&key).is_ok());
}

// ── Rejections ───────────────────────────────────────────────────

#[test]
fn rejects_wrong_prefix() {
    assert_eq!(
        codec().validate("WIBE-T0007-AAAA-BBBB-CCCC-DDDD").unwrap_err(),
        KeyError::InvalidPrefix
    );
}

#[test]
fn rejects_wrong_field_count() {
    assert_eq!(
        codec().validate("VIBE-T0007-AAAA").unwrap_err(),
        KeyError::InvalidFormat
    );
    assert_eq!(
        codec()
            .validate("VIBE-T0007-AAAA-BBBB-CCCC-DDDD-EEEE")
            .unwrap_err(),
        KeyError::InvalidFormat
    );
}

#[test]
fn rejects_bogus_checksum() {
    assert_eq!(
        codec().validate("VIBE-T0007-AAAA-BBBB-CCCC-0000").unwrap_err(),
        KeyError::InvalidChecksum
    );
}

#[test]
fn rejects_unknown_type_code() {
    // Checksum is verified before the type code, so forge a key whose
    // checksum is correct for the X-typed body.
    let body = "VIBE-X0000-AAAA-BBBB-CCCC";
    let forged = format!("{body}-{}", checksum_for(body));
    assert_eq!(
        codec().validate(&forged).unwrap_err(),
        KeyError::UnknownType
    );
}

#[test]
fn rejects_unparseable_duration() {
    let body = "VIBE-TXYZW-AAAA-BBBB-CCCC";
    let forged = format!("{body}-{}", checksum_for(body));
    assert_eq!(
        codec().validate(&forged).unwrap_err(),
        KeyError::InvalidDuration
    );
}

#[test]
fn rejects_empty_and_garbage_input() {
    assert!(codec().validate("").is_err());
    assert!(codec().validate("not a key at all").is_err());
}

#[test]
fn generate_from_code_rejects_unknown_codes() {
    let c = codec();
    assert_eq!(
        c.generate_from_code("X", 7, "", "").unwrap_err(),
        KeyError::InvalidType
    );
    assert_eq!(
        c.generate_from_code("TL", 7, "", "").unwrap_err(),
        KeyError::InvalidType
    );
    assert!(c.generate_from_code("T", 7, "", "").is_ok());
}

// ── Quota duality ────────────────────────────────────────────────

#[test]
fn quota_names_the_days_overload() {
    let c = codec();
    let trial = c.validate(&c.generate_trial("", "").key).unwrap();
    assert_eq!(trial.quota(), Quota::Days(7));

    let demo = c.validate(&c.generate_demo(5, "", "").key).unwrap();
    assert_eq!(demo.quota(), Quota::Recordings(5));

    let lifetime = c.validate(&c.generate_lifetime("", "").key).unwrap();
    assert_eq!(lifetime.quota(), Quota::Unlimited);
}

// ── Batch generation ─────────────────────────────────────────────

#[test]
fn batch_generates_distinct_valid_keys_with_synthetic_customers() {
    let c = codec();
    let batch = c.generate_batch(LicenseType::Trial, 7, 10);
    assert_eq!(batch.len(), 10);
    assert_eq!(batch[0].customer_id, "CUSTOMER_0001");
    assert_eq!(batch[9].customer_id, "CUSTOMER_0010");

    let mut keys: Vec<&str> = batch.iter().map(|b| b.key.as_str()).collect();
    keys.sort_unstable();
    keys.dedup();
    assert_eq!(keys.len(), 10, "batch keys must be unique");

    for entry in &batch {
        let info = c.validate(&entry.key).unwrap();
        assert_eq!(info.days, 7);
        assert_eq!(entry.metadata.customer_name, entry.customer_id);
    }
}

// ── Metadata is one-way ──────────────────────────────────────────

#[test]
fn customer_fields_never_appear_in_the_key() {
    let generated = codec().generate(LicenseType::Trial, 7, "SENTINELNAME", "sentinel@x.com");
    assert!(!generated.key.contains("SENTINEL"));
    assert!(!generated.key.contains(&generated.metadata.unique_id.to_string()));
}
