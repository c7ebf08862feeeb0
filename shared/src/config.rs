//! Configuration management for Lambda functions.

use std::env;

use crate::{Error, Result};

/// Region used when neither the environment nor the SDK chain provides one.
pub const DEFAULT_REGION: &str = "us-east-2";

/// Retry bound applied when the store endpoint is overridden (local DynamoDB).
pub const OVERRIDE_MAX_RETRIES: u32 = 1;

/// Store client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// AWS region
    pub aws_region: String,
    /// Alternate DynamoDB endpoint, used for test isolation
    pub endpoint_override: Option<String>,
    /// Retry bound for store calls; `None` keeps the SDK default
    pub max_retries: Option<u32>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint_override = lookup("ENDPOINT_OVERRIDE").filter(|v| !v.is_empty());

        let max_retries = match lookup("MAX_RETRIES") {
            Some(raw) => {
                let retries = raw.parse::<u32>().map_err(|e| {
                    Error::Config(format!("MAX_RETRIES must be a non-negative integer: {}", e))
                })?;
                // Attempts are retries plus the first call
                retries
                    .checked_add(1)
                    .ok_or_else(|| Error::Config(format!("MAX_RETRIES is too large: {}", raw)))?;
                Some(retries)
            }
            None if endpoint_override.is_some() => Some(OVERRIDE_MAX_RETRIES),
            None => None,
        };

        Ok(Self {
            aws_region: lookup("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            endpoint_override,
            max_retries,
        })
    }
}

/// Read a required table name from the environment.
pub fn table_name(var: &str) -> Result<String> {
    match env::var(var) {
        Ok(name) if !name.is_empty() => Ok(name),
        _ => Err(Error::Config(format!("{} not set", var))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.aws_region, "us-east-2");
        assert_eq!(config.endpoint_override, None);
        assert_eq!(config.max_retries, None);
    }

    #[test]
    fn test_endpoint_override_bounds_retries() {
        let config =
            Config::from_lookup(lookup(&[("ENDPOINT_OVERRIDE", "http://localhost:8000")])).unwrap();
        assert_eq!(config.endpoint_override.as_deref(), Some("http://localhost:8000"));
        assert_eq!(config.max_retries, Some(1));
    }

    #[test]
    fn test_explicit_max_retries_wins() {
        let config = Config::from_lookup(lookup(&[
            ("ENDPOINT_OVERRIDE", "http://localhost:8000"),
            ("MAX_RETRIES", "4"),
        ]))
        .unwrap();
        assert_eq!(config.max_retries, Some(4));
    }

    #[test]
    fn test_bad_max_retries() {
        let err = Config::from_lookup(lookup(&[("MAX_RETRIES", "lots")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_max_retries_leaves_room_for_first_attempt() {
        let err = Config::from_lookup(lookup(&[("MAX_RETRIES", "4294967295")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let config = Config::from_lookup(lookup(&[("MAX_RETRIES", "4294967294")])).unwrap();
        assert_eq!(config.max_retries, Some(u32::MAX - 1));
    }
}
