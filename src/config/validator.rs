//! Configuration validation rules.
//!
//! - `remote.batch_size` and `remote.timeout_secs` must be positive
//! - `remote.endpoint` must be an http(s) URL
//! - `remote.auth_token_env` must name a variable when present

use crate::config::schema::TaskSyncConfig;
use crate::error::{Result, TaskSyncError};

/// Validation error with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
}

impl ValidationError {
    fn new(rule: &str, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            message: message.into(),
        }
    }
}

/// Validate a configuration and return all errors.
pub fn validate_config(config: &TaskSyncConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let remote = &config.remote;

    if remote.batch_size == 0 {
        errors.push(ValidationError::new(
            "batch-size",
            "remote.batch_size must be at least 1",
        ));
    }

    if remote.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "timeout",
            "remote.timeout_secs must be at least 1",
        ));
    }

    if let Some(endpoint) = &remote.endpoint {
        let lower = endpoint.to_ascii_lowercase();
        let has_host = lower
            .strip_prefix("https://")
            .or_else(|| lower.strip_prefix("http://"))
            .is_some_and(|rest| !rest.is_empty());
        if !has_host {
            errors.push(ValidationError::new(
                "endpoint-scheme",
                format!(
                    "remote.endpoint '{}' must be an http:// or https:// URL",
                    endpoint
                ),
            ));
        }
    }

    if let Some(var) = &remote.auth_token_env {
        if var.trim().is_empty() {
            errors.push(ValidationError::new(
                "auth-token-env",
                "remote.auth_token_env must name an environment variable",
            ));
        }
    }

    errors
}

/// Validate and return Result (for convenience).
///
/// # Errors
///
/// Returns `ConfigValidationError` if any validation rules fail.
pub fn validate(config: &TaskSyncConfig) -> Result<()> {
    let errors = validate_config(config);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(TaskSyncError::ConfigValidationError {
            message: messages.join("; "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&TaskSyncConfig::default()).is_ok());
    }

    #[test]
    fn rejects_zero_batch_size_and_timeout() {
        let mut config = TaskSyncConfig::default();
        config.remote.batch_size = 0;
        config.remote.timeout_secs = 0;

        let rules: Vec<_> = validate_config(&config)
            .into_iter()
            .map(|e| e.rule)
            .collect();
        assert_eq!(rules, vec!["batch-size", "timeout"]);
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let mut config = TaskSyncConfig::default();
        config.remote.endpoint = Some("ftp://example.com".to_string());

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, "endpoint-scheme");
    }

    #[test]
    fn rejects_scheme_without_host() {
        let mut config = TaskSyncConfig::default();
        config.remote.endpoint = Some("https://".to_string());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn accepts_http_and_https() {
        let mut config = TaskSyncConfig::default();
        config.remote.endpoint = Some("http://localhost:8080".to_string());
        assert!(validate(&config).is_ok());

        config.remote.endpoint = Some("HTTPS://sync.example.com/api".to_string());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn rejects_blank_token_variable() {
        let mut config = TaskSyncConfig::default();
        config.remote.auth_token_env = Some(" ".to_string());
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("auth_token_env"));
    }
}
