use parking_lot::RwLock;
use tracing::info;

use crate::config::ConfigDefaults;
use crate::models::EffectiveConfig;
use crate::settings::store::{SettingsError, SettingsStore};

pub const KEY_API_KEY: &str = "openai_api_key";
pub const KEY_API_BASE_URL: &str = "api_base_url";
pub const KEY_TEXT_MODEL: &str = "openai_model";
pub const KEY_IMAGE_MODEL: &str = "openai_image_model";
pub const KEY_USE_ALTERNATE: &str = "use_silicon_flow";
pub const KEY_ALTERNATE_KEY: &str = "silicon_flow_key";

/// A settings save. `None` fields keep their previous value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub text_model: Option<String>,
    pub image_model: Option<String>,
    pub use_alternate_provider: Option<bool>,
    pub alternate_provider_key: Option<String>,
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        *self == ConfigOverrides::default()
    }

    fn entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = Vec::new();
        let text_fields = [
            (KEY_API_KEY, &self.api_key),
            (KEY_API_BASE_URL, &self.api_base_url),
            (KEY_TEXT_MODEL, &self.text_model),
            (KEY_IMAGE_MODEL, &self.image_model),
            (KEY_ALTERNATE_KEY, &self.alternate_provider_key),
        ];
        for (key, value) in text_fields {
            if let Some(value) = value {
                entries.push((key, value.clone()));
            }
        }
        if let Some(enabled) = self.use_alternate_provider {
            entries.push((KEY_USE_ALTERNATE, enabled.to_string()));
        }
        entries
    }
}

/// Empty persisted text counts as unset.
fn stored_text(store: &dyn SettingsStore, key: &str, default: &str) -> String {
    store
        .get(key)
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn stored_bool(store: &dyn SettingsStore, key: &str, default: bool) -> bool {
    match store.get(key).as_deref().map(str::trim) {
        Some(value) if value.eq_ignore_ascii_case("true") => true,
        Some(value) if value.eq_ignore_ascii_case("false") => false,
        _ => default,
    }
}

fn resolve_from(defaults: &ConfigDefaults, store: &dyn SettingsStore) -> EffectiveConfig {
    EffectiveConfig {
        api_key: stored_text(store, KEY_API_KEY, &defaults.api_key),
        api_base_url: stored_text(store, KEY_API_BASE_URL, &defaults.api_base_url),
        text_model: stored_text(store, KEY_TEXT_MODEL, &defaults.text_model),
        image_model: stored_text(store, KEY_IMAGE_MODEL, &defaults.image_model),
        use_alternate_provider: stored_bool(
            store,
            KEY_USE_ALTERNATE,
            defaults.use_alternate_provider,
        ),
        alternate_provider_key: stored_text(
            store,
            KEY_ALTERNATE_KEY,
            &defaults.alternate_provider_key,
        ),
    }
}

/// Holds the process-wide settings: persisted overrides layered over
/// defaults.
pub struct ConfigResolver<S> {
    defaults: ConfigDefaults,
    store: S,
    current: RwLock<EffectiveConfig>,
}

impl<S: SettingsStore> ConfigResolver<S> {
    pub fn load(defaults: ConfigDefaults, store: S) -> Self {
        let current = resolve_from(&defaults, &store);
        ConfigResolver {
            defaults,
            store,
            current: RwLock::new(current),
        }
    }

    /// Returns an owned snapshot; later updates do not change it.
    pub fn resolve(&self) -> EffectiveConfig {
        self.current.read().clone()
    }

    /// Persists the given fields in one batch, then refreshes the in-memory
    /// settings. On a write error neither the store nor memory changes.
    pub fn update(&self, overrides: ConfigOverrides) -> Result<EffectiveConfig, SettingsError> {
        let mut current = self.current.write();
        self.store.set_many(&overrides.entries())?;
        *current = resolve_from(&self.defaults, &self.store);
        info!(
            "Settings saved (base_url={}, text_model={}, image_model={}, alternate_provider={})",
            current.api_base_url,
            current.text_model,
            current.image_model,
            current.use_alternate_provider
        );
        Ok(current.clone())
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }
}
