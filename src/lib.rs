//! Viberyt account-management and license-issuance service.
//!
//! The core of the crate is the [`license`] codec: a pure, stateless
//! generator/validator for the `VIBE-` license key format the desktop app
//! checks offline. Everything else is orchestration around it: trial
//! claims, Polar checkout + webhook reconciliation, a dashboard endpoint,
//! and the installer download, backed by an identity provider and a
//! SQLite record store.

pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod identity;
pub mod license;
pub mod models;
pub mod payments;
pub mod util;
