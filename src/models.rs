use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub background: String,
}

impl Character {
    pub fn new(name: impl Into<String>, background: impl Into<String>) -> Self {
        Character {
            name: name.into(),
            background: background.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0}的名称不能为空")]
    EmptyName(&'static str),
    #[error("{0}的背景说明不能为空")]
    EmptyBackground(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub character1: Character,
    pub character2: Character,
}

impl GenerationRequest {
    pub fn new(character1: Character, character2: Character) -> Self {
        GenerationRequest {
            character1,
            character2,
        }
    }

    /// Rejects blank names or backgrounds before any request is issued.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (label, character) in [("角色1", &self.character1), ("角色2", &self.character2)] {
            if character.name.trim().is_empty() {
                return Err(ValidationError::EmptyName(label));
            }
            if character.background.trim().is_empty() {
                return Err(ValidationError::EmptyBackground(label));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Avatars {
    pub character1: String,
    pub character2: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub story: String,
    pub avatars: Avatars,
    pub cp_image: String,
}

/// Credentials and model identifiers used for one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub api_key: String,
    pub api_base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub use_alternate_provider: bool,
    pub alternate_provider_key: String,
}
