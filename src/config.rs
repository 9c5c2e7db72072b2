use std::env;
use std::path::PathBuf;

use once_cell::sync::Lazy;

use crate::llm::ProviderSettings;

pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TEXT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
pub const DEFAULT_TRANSLATION_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_SILICON_FLOW_BASE_URL: &str = "https://api.siliconflow.cn/v1";
pub const DEFAULT_SILICON_FLOW_MODEL: &str = "black-forest-labs/FLUX.1-schnell";
pub const DEFAULT_SETTINGS_PATH: &str = "cp_settings.json";

/// Fallback values for every user-overridable setting. Persisted overrides
/// win over these; see `settings::ConfigResolver`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDefaults {
    pub api_key: String,
    pub api_base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub use_alternate_provider: bool,
    pub alternate_provider_key: String,
}

impl Default for ConfigDefaults {
    fn default() -> Self {
        ConfigDefaults {
            api_key: String::new(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            use_alternate_provider: false,
            alternate_provider_key: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub site_password: String,
    pub settings_path: PathBuf,
    pub http_timeout_seconds: u64,
    pub defaults: ConfigDefaults,
    pub providers: ProviderSettings,
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::load);

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn load() -> Self {
        let defaults = ConfigDefaults {
            api_key: env_string("CP_OPENAI_API_KEY", ""),
            api_base_url: env_string("CP_API_BASE_URL", DEFAULT_API_BASE_URL),
            text_model: env_string("CP_OPENAI_MODEL", DEFAULT_TEXT_MODEL),
            image_model: env_string("CP_OPENAI_IMAGE_MODEL", DEFAULT_IMAGE_MODEL),
            use_alternate_provider: env_bool("CP_USE_SILICON_FLOW", false),
            alternate_provider_key: env_string("CP_SILICON_FLOW_KEY", ""),
        };

        let providers = ProviderSettings {
            translation_model: env_string("CP_TRANSLATION_MODEL", DEFAULT_TRANSLATION_MODEL),
            silicon_flow_base_url: env_string(
                "CP_SILICON_FLOW_BASE_URL",
                DEFAULT_SILICON_FLOW_BASE_URL,
            ),
            silicon_flow_model: env_string("CP_SILICON_FLOW_MODEL", DEFAULT_SILICON_FLOW_MODEL),
        };

        Config {
            log_level: env_string("LOG_LEVEL", "info"),
            site_password: env::var("CP_SITE_PASSWORD").unwrap_or_default(),
            settings_path: PathBuf::from(env_string("CP_SETTINGS_PATH", DEFAULT_SETTINGS_PATH)),
            http_timeout_seconds: env_u64("CP_HTTP_TIMEOUT_SECONDS", 0),
            defaults,
            providers,
        }
    }
}
