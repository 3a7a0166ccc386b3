//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and required fields
//! - Render the policy tables once to catch malformed directives
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::AppConfig;
use crate::security::headers::{referrer_policy_value, ContentSecurityPolicy, PolicyError};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("database.uri must be set")]
    MissingDatabaseUri,

    #[error("database.uri is not a valid URI: {0}")]
    MalformedDatabaseUri(String),

    #[error("database.max_connections must be greater than zero")]
    ZeroDatabaseConnections,

    #[error("http.host must not be empty")]
    EmptyHttpHost,

    #[error("rpc.bind_address {0:?} must have the form host:port")]
    InvalidRpcAddress(String),

    #[error("body.json_limit_bytes must be greater than zero")]
    ZeroJsonLimit,

    #[error("access_log.{0} must not be empty when features.logs is enabled")]
    EmptyAccessLogSetting(&'static str),

    #[error("policies: {0}")]
    Policy(#[from] PolicyError),
}

/// Check the configuration, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let uri = config.database.uri.trim();
    if uri.is_empty() {
        errors.push(ValidationError::MissingDatabaseUri);
    } else if let Err(e) = Url::parse(uri) {
        errors.push(ValidationError::MalformedDatabaseUri(e.to_string()));
    }
    if config.database.max_connections == 0 {
        errors.push(ValidationError::ZeroDatabaseConnections);
    }

    if config.http.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHttpHost);
    }

    if !is_host_port(&config.rpc.bind_address) {
        errors.push(ValidationError::InvalidRpcAddress(
            config.rpc.bind_address.clone(),
        ));
    }

    if config.body.json_limit_bytes == 0 {
        errors.push(ValidationError::ZeroJsonLimit);
    }

    if config.features.logs {
        if config.access_log.directory.as_os_str().is_empty() {
            errors.push(ValidationError::EmptyAccessLogSetting("directory"));
        }
        if config.access_log.file_name.trim().is_empty() {
            errors.push(ValidationError::EmptyAccessLogSetting("file_name"));
        }
    }

    // Disabled tables are never rendered, so they are not checked either.
    if config.features.content_security {
        if let Err(e) = ContentSecurityPolicy::from_config(&config.policies.content_security) {
            errors.push(e.into());
        }
    }
    if config.features.referrers {
        if let Err(e) = referrer_policy_value(&config.policies.referrers) {
            errors.push(e.into());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_host_port(address: &str) -> bool {
    match address.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ReferrerPolicy;

    fn valid() -> AppConfig {
        let mut config = AppConfig::default();
        config.database.uri = "postgres://coins@localhost/coins".to_string();
        config
    }

    #[test]
    fn accepts_valid_config() {
        assert_eq!(validate_config(&valid()), Ok(()));
    }

    #[test]
    fn reports_every_error() {
        let mut config = AppConfig::default();
        config.database.max_connections = 0;
        config.rpc.bind_address = "localhost".to_string();
        config.body.json_limit_bytes = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::MissingDatabaseUri,
                ValidationError::ZeroDatabaseConnections,
                ValidationError::InvalidRpcAddress("localhost".to_string()),
                ValidationError::ZeroJsonLimit,
            ]
        );
    }

    #[test]
    fn malformed_database_uri() {
        let mut config = valid();
        config.database.uri = "not a uri".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::MalformedDatabaseUri(_)));
    }

    #[test]
    fn policies_checked_only_when_enabled() {
        let mut config = valid();
        config.policies.referrers = vec![ReferrerPolicy::Origin, ReferrerPolicy::Origin];
        assert_eq!(validate_config(&config), Ok(()));

        config.features.referrers = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::Policy(PolicyError::DuplicateReferrerPolicy(
                "origin"
            ))]
        );
    }

    #[test]
    fn access_log_settings_required_when_logging() {
        let mut config = valid();
        config.access_log.file_name = String::new();
        assert_eq!(validate_config(&config), Ok(()));

        config.features.logs = true;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::EmptyAccessLogSetting("file_name")])
        );
    }
}
