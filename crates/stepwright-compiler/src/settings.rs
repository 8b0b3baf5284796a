//! Translation of plugin settings into environment variables.
//!
//! Each setting `some.key-name` becomes `PLUGIN_SOME_KEY_NAME`. Scalars are
//! rendered as text, scalar lists are comma-joined, and anything else is
//! JSON-encoded. A `{ "from_secret": "name" }` value is replaced by the value
//! of that secret.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

const ENV_PREFIX: &str = "PLUGIN_";
const FROM_SECRET: &str = "from_secret";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("secret {0:?} not found or not allowed to be used")]
    SecretNotFound(String),

    #[error("failed to encode setting {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Write `settings` into `env` in key order.
///
/// Stops at the first failure; entries written before it are kept.
pub fn settings_to_env(
    settings: &BTreeMap<String, Value>,
    env: &mut HashMap<String, String>,
    secrets: &HashMap<String, String>,
) -> Result<(), SettingsError> {
    for (key, value) in settings {
        if key.is_empty() || value.is_null() {
            continue;
        }
        let rendered = render_value(key, value, secrets)?;
        env.insert(env_key(key), rendered);
    }
    Ok(())
}

fn env_key(key: &str) -> String {
    format!("{}{}", ENV_PREFIX, key.replace(['.', '-'], "_").to_uppercase())
}

fn render_value(
    key: &str,
    value: &Value,
    secrets: &HashMap<String, String>,
) -> Result<String, SettingsError> {
    let resolved = resolve_secrets(value, secrets)?;
    match &resolved {
        Value::Array(items) if items.iter().all(is_scalar) => Ok(items
            .iter()
            .map(scalar_to_string)
            .collect::<Vec<_>>()
            .join(",")),
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string(&resolved).map_err(|source| SettingsError::Encode {
                key: key.to_string(),
                source,
            })
        }
        scalar => Ok(scalar_to_string(scalar)),
    }
}

/// Replace every `from_secret` reference inside `value` with the secret value.
fn resolve_secrets(
    value: &Value,
    secrets: &HashMap<String, String>,
) -> Result<Value, SettingsError> {
    match value {
        Value::Object(map) => {
            if let Some(name) = secret_reference(map) {
                return secrets
                    .get(&name.to_lowercase())
                    .map(|v| Value::String(v.clone()))
                    .ok_or_else(|| SettingsError::SecretNotFound(name.to_string()));
            }
            map.iter()
                .map(|(k, v)| Ok((k.clone(), resolve_secrets(v, secrets)?)))
                .collect::<Result<Map<String, Value>, SettingsError>>()
                .map(Value::Object)
        }
        Value::Array(items) => items
            .iter()
            .map(|v| resolve_secrets(v, secrets))
            .collect::<Result<Vec<Value>, SettingsError>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

fn secret_reference(map: &Map<String, Value>) -> Option<&str> {
    if map.len() != 1 {
        return None;
    }
    map.get(FROM_SECRET).and_then(Value::as_str)
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(value: Value) -> BTreeMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    fn secrets() -> HashMap<String, String> {
        HashMap::from([("docker_password".to_string(), "hunter2".to_string())])
    }

    #[test]
    fn test_scalars_and_key_sanitizing() {
        let mut env = HashMap::new();
        settings_to_env(
            &settings(json!({
                "repo": "org/app",
                "dry-run": true,
                "cache.max": 3,
                "skipped": null,
            })),
            &mut env,
            &secrets(),
        )
        .unwrap();

        assert_eq!(env.get("PLUGIN_REPO").unwrap(), "org/app");
        assert_eq!(env.get("PLUGIN_DRY_RUN").unwrap(), "true");
        assert_eq!(env.get("PLUGIN_CACHE_MAX").unwrap(), "3");
        assert!(!env.contains_key("PLUGIN_SKIPPED"));
    }

    #[test]
    fn test_lists_and_maps() {
        let mut env = HashMap::new();
        settings_to_env(
            &settings(json!({
                "tags": ["latest", "1.0", 2],
                "build_args": {"A": "1"},
                "matrix": [{"os": "linux"}],
            })),
            &mut env,
            &secrets(),
        )
        .unwrap();

        assert_eq!(env.get("PLUGIN_TAGS").unwrap(), "latest,1.0,2");
        assert_eq!(env.get("PLUGIN_BUILD_ARGS").unwrap(), r#"{"A":"1"}"#);
        assert_eq!(env.get("PLUGIN_MATRIX").unwrap(), r#"[{"os":"linux"}]"#);
    }

    #[test]
    fn test_from_secret_resolution() {
        let mut env = HashMap::new();
        settings_to_env(
            &settings(json!({
                "password": {"from_secret": "Docker_Password"},
                "auth": {"user": "bot", "pass": {"from_secret": "docker_password"}},
                "creds": [{"from_secret": "docker_password"}, "plain"],
            })),
            &mut env,
            &secrets(),
        )
        .unwrap();

        assert_eq!(env.get("PLUGIN_PASSWORD").unwrap(), "hunter2");
        assert_eq!(
            env.get("PLUGIN_AUTH").unwrap(),
            r#"{"pass":"hunter2","user":"bot"}"#
        );
        assert_eq!(env.get("PLUGIN_CREDS").unwrap(), "hunter2,plain");
    }

    #[test]
    fn test_missing_secret_keeps_earlier_entries() {
        let mut env = HashMap::new();
        let result = settings_to_env(
            &settings(json!({
                "a_first": "kept",
                "b_token": {"from_secret": "unknown"},
                "c_last": "never written",
            })),
            &mut env,
            &secrets(),
        );

        assert!(matches!(result, Err(SettingsError::SecretNotFound(name)) if name == "unknown"));
        assert_eq!(env.get("PLUGIN_A_FIRST").unwrap(), "kept");
        assert!(!env.contains_key("PLUGIN_B_TOKEN"));
        assert!(!env.contains_key("PLUGIN_C_LAST"));
    }
}
