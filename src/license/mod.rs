//! License key codec: generation, validation, and presets.

mod codec;

pub use codec::{
    BatchLicense, GeneratedLicense, KeyError, LicenseCodec, LicenseInfo, LicenseMetadata,
    LicenseType, Quota, DEMO_RECORDINGS, KEY_PREFIX, TRIAL_DAYS,
};
