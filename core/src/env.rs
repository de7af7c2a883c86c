//! Environment variable sources consulted when a flag is absent from argv.

use std::collections::BTreeMap;

/// Read access to environment variables.
///
/// Empty values are treated as unset by the implementations in this crate.
pub trait EnvSource {
    /// Returns the value of `name`, or `None` when it is unset or empty.
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|value| !value.is_empty())
    }
}

/// A fixed set of variables, independent of the process environment.
///
/// # Examples
///
/// ```
/// use decli_core::{EnvSource, MapEnv};
///
/// let env = MapEnv::new().with("SOME_FLOAT64", "12.3").with("EMPTY", "");
/// assert_eq!(env.var("SOME_FLOAT64").as_deref(), Some("12.3"));
/// assert_eq!(env.var("EMPTY"), None);
/// assert_eq!(env.var("MISSING"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapEnv {
    vars: BTreeMap<String, String>,
}

impl MapEnv {
    /// Creates an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a variable, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }
}

impl<K, V> FromIterator<(K, V)> for MapEnv
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvSource for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).filter(|value| !value.is_empty()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_env_from_iter() {
        let env: MapEnv = [("A", "1"), ("B", "2")].into_iter().collect();
        assert_eq!(env.var("A").as_deref(), Some("1"));
        assert_eq!(env.var("B").as_deref(), Some("2"));
    }

    #[test]
    fn test_map_env_set_replaces() {
        let mut env = MapEnv::new().with("A", "1");
        env.set("A", "2");
        assert_eq!(env.var("A").as_deref(), Some("2"));
    }

    #[test]
    fn test_process_env_missing_variable() {
        assert!(ProcessEnv.var("DECLI_TEST_SURELY_UNSET_VARIABLE").is_none());
    }
}
