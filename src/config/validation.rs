//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation of the device section (serde handles syntactic)
//! - Check required fields in a fixed order
//! - Warn about URL and external address forms the device may reject
//!
//! # Design Decisions
//! - Fail fast: the first failing check determines the error
//! - Only missing fields are errors; odd-looking values are logged with
//!   `event = "suspicious-config"` and accepted
//! - Validation is pure function: BigIpConfig → Result<(), ValidationError>
//! - Runs before a router is constructed

use std::net::IpAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::BigIpConfig;

/// A failed static configuration check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("bigip.url is required")]
    MissingUrl,

    #[error("bigip.user is required")]
    MissingUser,

    #[error("bigip.pass is required")]
    MissingPassword,

    #[error("bigip.partitions must name at least one partition")]
    MissingPartitions,

    #[error("bigip.partitions contains an empty partition name")]
    EmptyPartition,

    #[error("bigip.external_addr is required")]
    MissingExternalAddr,
}

/// Validate the device section of the static configuration.
pub fn validate_bigip(config: &BigIpConfig) -> Result<(), ValidationError> {
    if config.url.is_empty() {
        return Err(ValidationError::MissingUrl);
    }
    if config.user.is_empty() {
        return Err(ValidationError::MissingUser);
    }
    if config.pass.is_empty() {
        return Err(ValidationError::MissingPassword);
    }
    if config.partitions.is_empty() {
        return Err(ValidationError::MissingPartitions);
    }
    if config.partitions.iter().any(|p| p.is_empty()) {
        return Err(ValidationError::EmptyPartition);
    }
    if config.external_addr.is_empty() {
        return Err(ValidationError::MissingExternalAddr);
    }

    warn_on_unusual_values(config);
    Ok(())
}

/// Log device settings that pass validation but look wrong.
///
/// Returns the number of warnings emitted.
fn warn_on_unusual_values(config: &BigIpConfig) -> usize {
    let mut warnings = 0;
    if Url::parse(&config.url).is_err() {
        tracing::warn!(
            event = "suspicious-config",
            field = "bigip.url",
            value = %config.url,
            "URL is not absolute"
        );
        warnings += 1;
    }
    if config.external_addr.parse::<IpAddr>().is_err() {
        tracing::warn!(
            event = "suspicious-config",
            field = "bigip.external_addr",
            value = %config.external_addr,
            "External address is not an IP address"
        );
        warnings += 1;
    }
    warnings
}
