//! License key generation and verification.
//!
//! Keys use the format: `VIBE-<TYPE><DURATION>-<H1>-<H2>-<H3>-<CHK>`
//!
//! - `TYPE` is `T` (trial), `L` (lifetime) or `D` (demo)
//! - `DURATION` is `LIFE` for lifetime keys, otherwise a zero-padded
//!   4-digit day count (`0007` = 7 days)
//! - `H1`..`H3` are 4-hex-char slices of SHA-256(metadata JSON + `_` + secret)
//! - `CHK` is the first 4 hex chars of SHA-256(body + `_` + secret)
//!
//! The hash segments bake the customer, timestamp and a random unique id
//! into the key so two keys for the same type and duration never collide;
//! none of that metadata is recoverable from the key string. Validation
//! recovers only what the visible segments carry: type and duration.
//!
//! The codec holds no state besides the secret and performs no I/O.
//! Rotating the secret invalidates every previously issued key.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

/// Literal prefix every key starts with.
pub const KEY_PREFIX: &str = "VIBE";

/// Default trial length in days.
pub const TRIAL_DAYS: i64 = 7;

/// Default demo recording budget.
pub const DEMO_RECORDINGS: i64 = 5;

/// The three license variants, identified by their single-character code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LicenseType {
    #[serde(rename = "T")]
    Trial,
    #[serde(rename = "L")]
    Lifetime,
    #[serde(rename = "D")]
    Demo,
}

impl LicenseType {
    /// Returns the single-character type code embedded in the key.
    #[must_use]
    pub fn code(&self) -> char {
        match self {
            Self::Trial => 'T',
            Self::Lifetime => 'L',
            Self::Demo => 'D',
        }
    }

    /// Returns the human-readable type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Trial => "TRIAL",
            Self::Lifetime => "LIFETIME",
            Self::Demo => "DEMO",
        }
    }

    /// Parses a type code character.
    pub fn from_code(code: char) -> Result<Self, KeyError> {
        match code {
            'T' => Ok(Self::Trial),
            'L' => Ok(Self::Lifetime),
            'D' => Ok(Self::Demo),
            _ => Err(KeyError::UnknownType),
        }
    }
}

impl std::fmt::Display for LicenseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Reasons a key string can be rejected, or key generation can fail.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum KeyError {
    /// Generation was asked for a type code outside T/L/D.
    #[error("Invalid license type. Must be one of: T, L, D")]
    InvalidType,
    /// Key does not start with `VIBE-`.
    #[error("Invalid prefix")]
    InvalidPrefix,
    /// Key does not split into exactly 6 dash-delimited fields.
    #[error("Invalid format")]
    InvalidFormat,
    /// Trailing checksum segment does not match the recomputed value.
    #[error("Invalid checksum")]
    InvalidChecksum,
    /// Type code in the second field is not T/L/D.
    #[error("Unknown license type")]
    UnknownType,
    /// Duration is neither `LIFE` nor a parseable integer.
    #[error("Invalid duration format")]
    InvalidDuration,
}

/// Metadata folded into the first key digest.
///
/// Serialized field names and order must stay exactly as declared: the
/// compact JSON rendering is the digest input, and changing it would make
/// freshly generated keys diverge from every key already issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseMetadata {
    #[serde(rename = "type")]
    pub license_type: LicenseType,
    /// Validity in days; `-1` means never expires. For demo keys this
    /// field carries the recording budget instead of a day count.
    pub days: i64,
    pub customer_name: String,
    pub customer_email: String,
    /// ISO-8601 creation timestamp with millisecond precision.
    pub generated_date: String,
    /// Random v4 UUID; never recoverable from the key string.
    pub unique_id: Uuid,
}

/// What a validated key entitles the holder to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quota {
    /// Trial: full access for this many days.
    Days(i64),
    /// Demo: this many recordings, independent of wall time.
    Recordings(i64),
    /// Lifetime: no limit.
    Unlimited,
}

/// Information recovered from a valid key string.
///
/// Only the visible segments are recoverable; customer fields, timestamp
/// and unique id are one-way hashed into the key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseInfo {
    #[serde(rename = "type")]
    pub license_type: LicenseType,
    pub type_name: String,
    /// Day count, or `-1` for lifetime. Doubles as the recording budget
    /// for demo keys; see [`LicenseInfo::quota`].
    pub days: i64,
    pub is_lifetime: bool,
    pub key: String,
}

impl LicenseInfo {
    /// Resolves the `days` field overload into a named quota.
    #[must_use]
    pub fn quota(&self) -> Quota {
        match self.license_type {
            LicenseType::Trial => Quota::Days(self.days),
            LicenseType::Demo => Quota::Recordings(self.days),
            LicenseType::Lifetime => Quota::Unlimited,
        }
    }
}

/// A freshly generated key plus the metadata that was hashed into it.
///
/// The metadata is for server-side storage and logging only; handing it
/// to a customer defeats the one-way construction.
#[derive(Debug, Clone)]
pub struct GeneratedLicense {
    pub key: String,
    pub metadata: LicenseMetadata,
}

/// A key generated as part of a batch, with its synthetic customer id.
#[derive(Debug, Clone)]
pub struct BatchLicense {
    pub customer_id: String,
    pub key: String,
    pub metadata: LicenseMetadata,
}

/// Stateless license key generator and validator.
///
/// The secret is injected at construction so tests can run with distinct
/// secrets; generation and validation must share the same secret or every
/// validation fails.
#[derive(Clone)]
pub struct LicenseCodec {
    secret: String,
}

impl std::fmt::Debug for LicenseCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseCodec")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl LicenseCodec {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Generates a key with a fresh unique id and the current timestamp.
    ///
    /// `days` is ignored for lifetime keys (forced to `-1` in the
    /// metadata). For demo keys it is the recording budget.
    pub fn generate(
        &self,
        license_type: LicenseType,
        days: i64,
        customer_name: &str,
        customer_email: &str,
    ) -> GeneratedLicense {
        self.generate_with_parts(
            license_type,
            days,
            customer_name,
            customer_email,
            Uuid::new_v4(),
            Utc::now(),
        )
    }

    /// Generates a key from a string type code, rejecting unknown codes
    /// before any hashing.
    pub fn generate_from_code(
        &self,
        code: &str,
        days: i64,
        customer_name: &str,
        customer_email: &str,
    ) -> Result<GeneratedLicense, KeyError> {
        let mut chars = code.chars();
        let license_type = match (chars.next(), chars.next()) {
            (Some(c), None) => LicenseType::from_code(c).map_err(|_| KeyError::InvalidType)?,
            _ => return Err(KeyError::InvalidType),
        };
        Ok(self.generate(license_type, days, customer_name, customer_email))
    }

    /// Generates a key from caller-supplied unique id and timestamp.
    ///
    /// With identical inputs and secret the output is identical; this is
    /// the hook tests use to pin exact key strings.
    pub fn generate_with_parts(
        &self,
        license_type: LicenseType,
        days: i64,
        customer_name: &str,
        customer_email: &str,
        unique_id: Uuid,
        generated_at: DateTime<Utc>,
    ) -> GeneratedLicense {
        let metadata = LicenseMetadata {
            license_type,
            days: if license_type == LicenseType::Lifetime {
                -1
            } else {
                days
            },
            customer_name: customer_name.to_string(),
            customer_email: customer_email.to_string(),
            generated_date: generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            unique_id,
        };

        // Serialization cannot fail for this struct.
        let metadata_json =
            serde_json::to_string(&metadata).unwrap_or_default();
        let digest = self.hex_digest(&metadata_json);

        let seg1 = license_type.code();
        let seg2 = if license_type == LicenseType::Lifetime {
            "LIFE".to_string()
        } else {
            format!("{days:04}")
        };
        let h1 = digest[0..4].to_uppercase();
        let h2 = digest[4..8].to_uppercase();
        let h3 = digest[8..12].to_uppercase();

        let body = format!("{KEY_PREFIX}-{seg1}{seg2}-{h1}-{h2}-{h3}");
        let checksum = self.checksum(&body);
        let key = format!("{body}-{checksum}");

        GeneratedLicense { key, metadata }
    }

    /// Parses and verifies a key string, recovering the embedded type and
    /// duration. Pure: no network, no storage, deterministic per secret.
    pub fn validate(&self, key: &str) -> Result<LicenseInfo, KeyError> {
        if !key.starts_with("VIBE-") {
            return Err(KeyError::InvalidPrefix);
        }

        let parts: Vec<&str> = key.split('-').collect();
        if parts.len() != 6 {
            return Err(KeyError::InvalidFormat);
        }

        // Checksum first: tampering anywhere in the first five fields is
        // caught before the fields are interpreted.
        let body = parts[..5].join("-");
        if self.checksum(&body) != parts[5] {
            return Err(KeyError::InvalidChecksum);
        }

        let type_duration = parts[1];
        let mut chars = type_duration.chars();
        let license_type = chars
            .next()
            .ok_or(KeyError::UnknownType)
            .and_then(LicenseType::from_code)?;

        let duration: &str = chars.as_str();
        let days = if duration == "LIFE" {
            -1
        } else {
            duration
                .parse::<i64>()
                .map_err(|_| KeyError::InvalidDuration)?
        };

        Ok(LicenseInfo {
            license_type,
            type_name: license_type.name().to_string(),
            days,
            is_lifetime: license_type == LicenseType::Lifetime,
            key: key.to_string(),
        })
    }

    /// Trial preset: 7 days.
    pub fn generate_trial(&self, customer_name: &str, customer_email: &str) -> GeneratedLicense {
        self.generate(LicenseType::Trial, TRIAL_DAYS, customer_name, customer_email)
    }

    /// Lifetime preset: never expires.
    pub fn generate_lifetime(&self, customer_name: &str, customer_email: &str) -> GeneratedLicense {
        self.generate(LicenseType::Lifetime, -1, customer_name, customer_email)
    }

    /// Demo preset: `recordings` is a recording budget, not a day count.
    pub fn generate_demo(
        &self,
        recordings: i64,
        customer_name: &str,
        customer_email: &str,
    ) -> GeneratedLicense {
        self.generate(LicenseType::Demo, recordings, customer_name, customer_email)
    }

    /// Generates `count` keys with synthetic `CUSTOMER_NNNN` identifiers.
    /// Iterations are independent; callers may parallelize freely.
    pub fn generate_batch(
        &self,
        license_type: LicenseType,
        days: i64,
        count: usize,
    ) -> Vec<BatchLicense> {
        (1..=count)
            .map(|i| {
                let customer_id = format!("CUSTOMER_{i:04}");
                let generated = self.generate(license_type, days, &customer_id, "");
                BatchLicense {
                    customer_id,
                    key: generated.key,
                    metadata: generated.metadata,
                }
            })
            .collect()
    }

    fn hex_digest(&self, input: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(input.as_bytes());
        hasher.update(b"_");
        hasher.update(self.secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn checksum(&self, body: &str) -> String {
        self.hex_digest(body)[0..4].to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_codes_round_trip() {
        for t in [LicenseType::Trial, LicenseType::Lifetime, LicenseType::Demo] {
            assert_eq!(LicenseType::from_code(t.code()).unwrap(), t);
        }
        assert_eq!(LicenseType::from_code('X'), Err(KeyError::UnknownType));
    }

    #[test]
    fn metadata_json_shape_is_pinned() {
        let metadata = LicenseMetadata {
            license_type: LicenseType::Trial,
            days: 7,
            customer_name: "Alice".into(),
            customer_email: "a@x.com".into(),
            generated_date: "2025-01-01T00:00:00.000Z".into(),
            unique_id: Uuid::nil(),
        };
        assert_eq!(
            serde_json::to_string(&metadata).unwrap(),
            r#"{"type":"T","days":7,"customerName":"Alice","customerEmail":"a@x.com","generatedDate":"2025-01-01T00:00:00.000Z","uniqueId":"00000000-0000-0000-0000-000000000000"}"#
        );
    }

    #[test]
    fn duration_segment_is_zero_padded() {
        let codec = LicenseCodec::new("s");
        let key = codec.generate(LicenseType::Trial, 7, "", "").key;
        assert_eq!(&key.split('-').nth(1).unwrap()[1..], "0007");
        let key = codec.generate(LicenseType::Demo, 12345, "", "").key;
        assert_eq!(&key.split('-').nth(1).unwrap()[1..], "12345");
    }
}
