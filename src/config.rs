//! Share link configuration.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Environment variable overriding [`ShareConfig::base_path`].
pub const BASE_PATH_ENV: &str = "MORTGAGE_SHARE_BASE_PATH";

fn default_base_path() -> String {
    "/share".to_string()
}

/// Where share links are mounted on the host site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Path prefix placed before the token segment, e.g. `/share` or
    /// `https://calc.example.com/mortgage/share`.
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
        }
    }
}

impl FromStr for ShareConfig {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: ShareConfig = serde_json::from_str(s)?;
        Ok(config.normalized())
    }
}

impl ShareConfig {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
        }
        .normalized()
    }

    /// Defaults, with the base path taken from `MORTGAGE_SHARE_BASE_PATH` when set.
    pub fn from_env() -> Self {
        Self::from_base_path_var(env::var(BASE_PATH_ENV).ok())
    }

    fn from_base_path_var(value: Option<String>) -> Self {
        match value {
            Some(path) if !path.trim().is_empty() => Self::new(path.trim()),
            _ => Self::default(),
        }
    }

    fn normalized(mut self) -> Self {
        let trimmed = self.base_path.trim_end_matches('/');
        self.base_path = trimmed.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_path() {
        assert_eq!(ShareConfig::default().base_path, "/share");
    }

    #[test]
    fn test_from_str_fills_defaults_and_trims() {
        let empty: ShareConfig = "{}".parse().unwrap();
        assert_eq!(empty, ShareConfig::default());

        let custom: ShareConfig = r#"{"base_path": "https://calc.example.com/s/"}"#.parse().unwrap();
        assert_eq!(custom.base_path, "https://calc.example.com/s");
    }

    #[test]
    fn test_base_path_from_env_value() {
        assert_eq!(
            ShareConfig::from_base_path_var(Some("  /calc/share/ ".to_string())).base_path,
            "/calc/share"
        );
        assert_eq!(
            ShareConfig::from_base_path_var(Some("   ".to_string())),
            ShareConfig::default()
        );
        assert_eq!(ShareConfig::from_base_path_var(None), ShareConfig::default());
    }

    #[test]
    fn test_from_env_reads_the_variable() {
        assert_eq!(
            ShareConfig::from_env(),
            ShareConfig::from_base_path_var(env::var(BASE_PATH_ENV).ok())
        );
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        assert!("base_path=/x".parse::<ShareConfig>().is_err());
    }
}
