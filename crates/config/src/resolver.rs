//! Provider-settings resolution chain
//!
//! `resolve(name)` walks: environment variable, then the persisted override
//! file, then the caller's default. Empty or whitespace-only values count as
//! unset at every step. The chain is re-evaluated on every call so operator
//! edits to the override file take effect without a restart.

use std::collections::HashMap;
use std::sync::Arc;

use crate::OverrideStore;

#[derive(Debug, Clone)]
enum EnvSource {
    Process,
    Snapshot(Arc<HashMap<String, String>>),
}

impl EnvSource {
    fn get(&self, name: &str) -> String {
        match self {
            Self::Process => std::env::var(name).unwrap_or_default(),
            Self::Snapshot(vars) => vars.get(name).cloned().unwrap_or_default(),
        }
    }
}

/// Resolves provider settings without any hidden process-wide cache.
/// Components receive a resolver at construction; tests inject a fixed
/// snapshot instead of the process environment.
#[derive(Debug, Clone)]
pub struct SettingsResolver {
    env: EnvSource,
    overrides: OverrideStore,
}

impl SettingsResolver {
    /// Resolve against the live process environment.
    pub fn from_env(overrides: OverrideStore) -> Self {
        Self {
            env: EnvSource::Process,
            overrides,
        }
    }

    /// Resolve against a fixed variable snapshot.
    pub fn with_snapshot(vars: HashMap<String, String>, overrides: OverrideStore) -> Self {
        Self {
            env: EnvSource::Snapshot(Arc::new(vars)),
            overrides,
        }
    }

    /// The resolved value, or the empty string when unset everywhere.
    pub fn resolve(&self, name: &str) -> String {
        let env_value = self.env.get(name);
        let env_value = env_value.trim();
        if !env_value.is_empty() {
            return env_value.to_string();
        }
        if let Some(saved) = self.overrides.load().get(name) {
            let saved = saved.trim();
            if !saved.is_empty() {
                return saved.to_string();
            }
        }
        String::new()
    }

    pub fn resolve_or(&self, name: &str, default: &str) -> String {
        let value = self.resolve(name);
        if value.is_empty() {
            default.trim().to_string()
        } else {
            value
        }
    }

    pub fn is_set(&self, name: &str) -> bool {
        !self.resolve(name).is_empty()
    }

    /// Boolean settings accept `1`, `true`, `yes`, `y`, `on` (any case).
    pub fn resolve_bool(&self, name: &str, default: bool) -> bool {
        let value = self.resolve(name);
        if value.is_empty() {
            return default;
        }
        matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "y" | "on")
    }

    /// Integer settings fall back to the default when unset or unparsable.
    pub fn resolve_u32(&self, name: &str, default: u32) -> u32 {
        let value = self.resolve(name);
        if value.is_empty() {
            return default;
        }
        value.parse().unwrap_or(default)
    }

    /// The override store this resolver reads from.
    pub fn overrides(&self) -> &OverrideStore {
        &self.overrides
    }
}
