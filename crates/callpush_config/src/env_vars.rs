//! Environment variable handling for secrets.
//!
//! Config files may carry the marker string `"secret_from_env"` instead of a
//! real value (typically for the APNs signing key). The marker is replaced at
//! load time with the value of an environment variable derived from the
//! marker's path in the config tree.

use std::env;
use tracing::warn;

/// The prefix for secret environment variables
pub const SECRET_PREFIX: &str = "CALLPUSH_SECRET";

/// The separator for secret environment variables
pub const SECRET_SEPARATOR: &str = "_";

/// The marker value that requests injection from the environment
pub const SECRET_MARKER: &str = "secret_from_env";

/// Convert a secret path to an environment variable name
///
/// # Arguments
///
/// * `path` - The secret path (e.g., "apns.private_key")
///
/// # Returns
///
/// The environment variable name (e.g., "CALLPUSH_SECRET_APNS_PRIVATE_KEY")
pub fn secret_path_to_env_var(path: &str) -> String {
    let path = path.replace('.', SECRET_SEPARATOR);
    format!("{}{}{}", SECRET_PREFIX, SECRET_SEPARATOR, path).to_uppercase()
}

/// Convert a secret path to its legacy, unprefixed environment variable name
///
/// # Arguments
///
/// * `path` - The secret path (e.g., "apns.private_key")
///
/// # Returns
///
/// The environment variable name (e.g., "APNS_PRIVATE_KEY")
pub fn legacy_secret_path_to_env_var(path: &str) -> String {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.len() < 2 {
        return path.to_uppercase();
    }

    let service = parts[0];
    let key = parts[1..].join(SECRET_SEPARATOR);
    format!("{}_{}", service, key).to_uppercase()
}

/// Get an environment variable for a secret path
///
/// Tries the prefixed name first and falls back to the legacy name.
pub fn get_secret_env_var(path: &str) -> Option<String> {
    if let Ok(value) = env::var(secret_path_to_env_var(path)) {
        return Some(value);
    }

    env::var(legacy_secret_path_to_env_var(path)).ok()
}

/// Inject environment variables into a JSON value
///
/// Recursively replaces every `"secret_from_env"` string with the matching
/// environment variable. Markers without a variable are left in place and
/// reported with a warning.
///
/// # Returns
///
/// `true` if any values were replaced, `false` otherwise
pub fn inject_env_vars(value: &mut serde_json::Value) -> bool {
    use serde_json::Value;

    fn walk(path: Vec<String>, obj: &mut Value) -> bool {
        let mut replaced = false;

        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    let mut new_path = path.clone();
                    new_path.push(k.to_string());
                    replaced |= walk(new_path, v);
                }
            }
            Value::Array(arr) => {
                for (i, v) in arr.iter_mut().enumerate() {
                    let mut new_path = path.clone();
                    new_path.push(i.to_string());
                    replaced |= walk(new_path, v);
                }
            }
            Value::String(s) if s == SECRET_MARKER => {
                let path_str = path.join(".");
                if let Some(env_val) = get_secret_env_var(&path_str) {
                    *s = env_val;
                    replaced = true;
                } else {
                    warn!("env var for {} not found", path_str);
                }
            }
            _ => {}
        }

        replaced
    }

    walk(vec![], value)
}
