use crate::error::{Result, RouteError};
use serde::{Deserialize, Serialize};
use std::env;

const CASE_SENSITIVE: &str = "DECOROUTE_CASE_SENSITIVE";
const STRICT: &str = "DECOROUTE_STRICT";

/// Matching options of the [`Dispatcher`](crate::dispatch::Dispatcher)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchOptions {
    /// `/Foo` and `/foo` are different paths.
    pub case_sensitive: bool,
    /// `/foo` and `/foo/` are different paths.
    pub strict: bool,
}

impl DispatchOptions {
    /// Read `DECOROUTE_CASE_SENSITIVE` and `DECOROUTE_STRICT` from the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read options through `lookup`; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut options = Self::default();
        if let Some(value) = lookup(CASE_SENSITIVE) {
            options.case_sensitive = parse_flag(CASE_SENSITIVE, &value)?;
        }
        if let Some(value) = lookup(STRICT) {
            options.strict = parse_flag(STRICT, &value)?;
        }
        Ok(options)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RouteError::InvalidConfig {
            key: "json".to_string(),
            value: e.to_string(),
        })
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(RouteError::InvalidConfig {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_lenient() {
        let options = DispatchOptions::from_lookup(lookup(&[])).unwrap();
        assert_eq!(options, DispatchOptions::default());
        assert!(!options.case_sensitive);
        assert!(!options.strict);
    }

    #[test]
    fn test_flags_are_read() {
        let options = DispatchOptions::from_lookup(lookup(&[
            ("DECOROUTE_CASE_SENSITIVE", "yes"),
            ("DECOROUTE_STRICT", "1"),
        ]))
        .unwrap();
        assert!(options.case_sensitive);
        assert!(options.strict);
    }

    #[test]
    fn test_invalid_flag_is_rejected() {
        let err = DispatchOptions::from_lookup(lookup(&[("DECOROUTE_STRICT", "maybe")])).unwrap_err();
        assert!(matches!(err, RouteError::InvalidConfig { ref key, .. } if key == "DECOROUTE_STRICT"));
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let options = DispatchOptions::from_json(r#"{ "strict": true }"#).unwrap();
        assert!(options.strict);
        assert!(!options.case_sensitive);
        assert!(DispatchOptions::from_json("{ nope").is_err());
    }
}
