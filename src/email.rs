//! License key email delivery.
//!
//! Delivery is intentionally stubbed: the key is logged and the call
//! succeeds. The dashboard and (in dev mode) the claim response surface
//! the key in the meantime.
//
// TODO: deliver via the Resend API (POST https://api.resend.com/emails
// with a RESEND_API_KEY from config) instead of logging.

use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct EmailService;

impl EmailService {
    pub fn new() -> Self {
        Self
    }

    /// Records that a license key should be emailed to the user.
    pub fn send_license_key(&self, to_email: &str, key: &str, kind: &str) -> Result<()> {
        tracing::info!(
            to = %to_email,
            kind = %kind,
            key = %key,
            "email delivery stubbed, license key not sent"
        );
        Ok(())
    }
}
