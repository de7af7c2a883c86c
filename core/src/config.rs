//! Binding configuration.
//!
//! Controls how names are resolved and how the root command is presented.
//! A [`Config`] is plain data and can be serialized alongside a dumped
//! [`CommandSpec`](crate::CommandSpec).
//!
//! # Examples
//!
//! ```
//! use decli_core::{Config, NamingPolicy};
//!
//! let config = Config::new()
//!     .with_name("hello")
//!     .with_version("1.2.3")
//!     .with_env_prefix("HELLO_")
//!     .with_naming(NamingPolicy::Explicit);
//! assert_eq!(config.name.as_deref(), Some("hello"));
//! assert_eq!(config.naming, NamingPolicy::Explicit);
//! ```

use serde::{Deserialize, Serialize};

/// How flag and subcommand names are resolved for fields without a `name`
/// tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingPolicy {
    /// Kebab-case of the field identifier (the default).
    #[default]
    Derived,
    /// Every field must carry an explicit `name`; missing names are
    /// configuration errors.
    Explicit,
}

/// Settings applied while extracting and binding a command tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Name resolution policy.
    #[serde(default)]
    pub naming: NamingPolicy,
    /// Prefix prepended to derived environment variable names. Explicit
    /// `envVars` lists are used verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_prefix: Option<String>,
    /// Root command name. Defaults to the file name of `argv[0]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Version reported by `--version`. No version flag without it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Root command description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
}

impl Config {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name resolution policy.
    pub fn with_naming(mut self, naming: NamingPolicy) -> Self {
        self.naming = naming;
        self
    }

    /// Sets the prefix for derived environment variable names.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Sets the root command name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the version reported by `--version`.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the root command description.
    pub fn with_about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    /// Names that must not be used as flags or aliases because the parser
    /// claims them.
    pub fn reserved_flags(&self) -> Vec<&'static str> {
        let mut reserved = vec!["help", "h"];
        if self.version.is_some() {
            reserved.extend(["version", "V"]);
        }
        reserved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.naming, NamingPolicy::Derived);
        assert_eq!(config.env_prefix, None);
        assert_eq!(config.reserved_flags(), vec!["help", "h"]);
    }

    #[test]
    fn test_version_reserves_version_flags() {
        let config = Config::new().with_version("0.1.0");
        assert!(config.reserved_flags().contains(&"V"));
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = Config::new().with_env_prefix("APP_");
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"naming":"derived","env_prefix":"APP_"}"#);
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
