//! Persisted provider-config overrides
//!
//! A single JSON object file holding operator-saved credentials and
//! defaults. Only allow-listed keys are ever read or written, and values
//! are masked before leaving the process.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::Result;

/// Keys the provider-config store accepts. `ADMIN_API_TOKEN` is deliberately
/// absent: it resolves from the environment only.
pub const ALLOWED_PROVIDER_CONFIG_KEYS: &[&str] = &[
    "RENDER_API_KEY",
    "RENDER_SERVICE_REPO",
    "RENDER_OWNER_ID",
    "RENDER_OWNER_SLUG",
    "RENDER_OWNER_NAME",
    "RENDER_SERVICE_BRANCH",
    "RENDER_SERVICE_REGION",
    "RENDER_BUILD_COMMAND",
    "RENDER_START_COMMAND",
    "DYNADOT_API_KEY",
    "DYNADOT_AUTO_REGISTER",
    "DYNADOT_REGISTRATION_YEARS",
    "SUPABASE_ACCESS_TOKEN",
    "SUPABASE_ORG_ID",
    "SUPABASE_DB_PASS",
    "SUPABASE_REGION",
    "NEON_API_KEY",
    "NEON_ORG_ID",
    "NEON_REGION_ID",
    "NEON_PG_VERSION",
    "DEFAULT_REGION",
    "DEFAULT_DB_PASSWORD",
];

pub fn is_allowed_key(key: &str) -> bool {
    ALLOWED_PROVIDER_CONFIG_KEYS.contains(&key)
}

/// Mask a secret for display: length <= 4 becomes all asterisks, longer
/// values keep exactly the last 4 characters.
pub fn mask_secret(value: &str) -> String {
    let cleaned = value.trim();
    if cleaned.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = cleaned.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}

/// Backing store for the override file. The memory variant serves tests and
/// snapshot-injected resolvers.
#[derive(Debug, Clone)]
pub enum OverrideStore {
    File(PathBuf),
    Memory(Arc<RwLock<HashMap<String, String>>>),
}

impl OverrideStore {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn memory() -> Self {
        Self::Memory(Arc::new(RwLock::new(HashMap::new())))
    }

    pub fn memory_with(values: HashMap<String, String>) -> Self {
        Self::Memory(Arc::new(RwLock::new(values)))
    }

    /// Current overrides, filtered to the allow-list with values trimmed.
    /// A missing or malformed file reads as empty.
    pub fn load(&self) -> HashMap<String, String> {
        let raw = match self {
            Self::File(path) => match std::fs::read_to_string(path) {
                Ok(content) => match serde_json::from_str::<serde_json::Value>(&content) {
                    Ok(serde_json::Value::Object(map)) => map
                        .into_iter()
                        .map(|(key, value)| (key, value_text(&value)))
                        .collect(),
                    Ok(_) => {
                        tracing::debug!(path = %path.display(), "provider config is not an object, treating as empty");
                        HashMap::new()
                    }
                    Err(error) => {
                        tracing::debug!(path = %path.display(), %error, "unreadable provider config, treating as empty");
                        HashMap::new()
                    }
                },
                Err(_) => HashMap::new(),
            },
            Self::Memory(map) => map.read().unwrap().clone(),
        };

        raw.into_iter()
            .filter(|(key, _)| is_allowed_key(key))
            .map(|(key, value)| (key, value.trim().to_string()))
            .filter(|(_, value)| !value.is_empty())
            .collect()
    }

    /// Merge operator-supplied values into the stored overrides. Keys off
    /// the allow-list are ignored; a trimmed-empty value deletes the key.
    /// Returns the stored state after the merge.
    pub fn apply(&self, values: &HashMap<String, String>) -> Result<HashMap<String, String>> {
        let mut updated = self.load();
        for (key, value) in values {
            if !is_allowed_key(key) {
                continue;
            }
            let cleaned = value.trim();
            if cleaned.is_empty() {
                updated.remove(key);
            } else {
                updated.insert(key.clone(), cleaned.to_string());
            }
        }
        self.save(&updated)?;
        Ok(updated)
    }

    /// Stored overrides with every value masked, keyed in sorted order.
    pub fn masked(&self) -> BTreeMap<String, String> {
        self.load()
            .into_iter()
            .map(|(key, value)| (key, mask_secret(&value)))
            .collect()
    }

    fn save(&self, values: &HashMap<String, String>) -> Result<()> {
        match self {
            Self::File(path) => {
                let sorted: BTreeMap<&String, &String> = values.iter().collect();
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, serde_json::to_string_pretty(&sorted)?)?;
                Ok(())
            }
            Self::Memory(map) => {
                *map.write().unwrap() = values.clone();
                Ok(())
            }
        }
    }
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Number(number) => number.to_string(),
        serde_json::Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_short_secrets_entirely() {
        assert_eq!(mask_secret("abcd"), "****");
        assert_eq!(mask_secret("x"), "*");
        assert_eq!(mask_secret("  "), "");
    }

    #[test]
    fn masks_long_secrets_keeping_last_four() {
        assert_eq!(mask_secret("rnd_live_12345678"), "*************5678");
        assert_eq!(mask_secret("abcde"), "*bcde");
    }

    #[test]
    fn apply_filters_trims_and_deletes() {
        let store = OverrideStore::memory();
        let mut values = HashMap::new();
        values.insert("DYNADOT_API_KEY".to_string(), "  key-123  ".to_string());
        values.insert("NOT_ALLOWED".to_string(), "x".to_string());
        let saved = store.apply(&values).unwrap();
        assert_eq!(saved.get("DYNADOT_API_KEY").map(String::as_str), Some("key-123"));
        assert!(!saved.contains_key("NOT_ALLOWED"));

        let mut deletion = HashMap::new();
        deletion.insert("DYNADOT_API_KEY".to_string(), "   ".to_string());
        let saved = store.apply(&deletion).unwrap();
        assert!(saved.is_empty());
    }

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = OverrideStore::file(dir.path().join("provider-config.json"));
        let mut values = HashMap::new();
        values.insert("NEON_API_KEY".to_string(), "neon-secret-key".to_string());
        store.apply(&values).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.get("NEON_API_KEY").map(String::as_str), Some("neon-secret-key"));

        let masked = store.masked();
        assert_eq!(masked.get("NEON_API_KEY").map(String::as_str), Some("***********-key"));
    }

    #[test]
    fn malformed_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("provider-config.json");
        std::fs::write(&path, "not json at all").unwrap();
        let store = OverrideStore::file(path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn non_allowed_keys_in_file_are_ignored_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("provider-config.json");
        std::fs::write(
            &path,
            r#"{"DYNADOT_API_KEY": "abc12345", "ADMIN_API_TOKEN": "nope"}"#,
        )
        .unwrap();
        let store = OverrideStore::file(path);
        let loaded = store.load();
        assert!(loaded.contains_key("DYNADOT_API_KEY"));
        assert!(!loaded.contains_key("ADMIN_API_TOKEN"));
    }
}
