//! HTTP client for the alpha simulation platform.
//!
//! [`BrainPlatform`] implements [`alphaq_core::Platform`]: one cookie-carrying
//! `reqwest::Client` per session, simulations submitted and polled to completion,
//! tags attached and the expression recorded in the completion ledger.

mod config;
pub use config::{BrainConfig, Credentials, DEFAULT_BASE_URL, DEFAULT_POLL_INTERVAL};

mod errors;
pub use errors::BrainError;

mod status;

mod platform;
pub use platform::{BrainPlatform, BrainSession};
