pub mod error;
pub mod openai;
pub mod siliconflow;
pub mod transport;

pub use error::{GenerationError, ProviderOperation};
pub use transport::{ApiReply, HttpTransport, Transport};

/// Provider details that are not user-editable settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub translation_model: String,
    pub silicon_flow_base_url: String,
    pub silicon_flow_model: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        ProviderSettings {
            translation_model: crate::config::DEFAULT_TRANSLATION_MODEL.to_string(),
            silicon_flow_base_url: crate::config::DEFAULT_SILICON_FLOW_BASE_URL.to_string(),
            silicon_flow_model: crate::config::DEFAULT_SILICON_FLOW_MODEL.to_string(),
        }
    }
}
