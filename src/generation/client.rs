use tracing::{debug, info};

use crate::generation::prompts::{
    avatar_prompt, couple_prompt, story_prompt, STORY_SYSTEM_PROMPT, STORY_TEMPERATURE,
    TRANSLATION_SYSTEM_PROMPT,
};
use crate::llm::openai::{self, ChatRequest};
use crate::llm::{siliconflow, GenerationError, ProviderOperation, ProviderSettings, Transport};
use crate::models::{Avatars, EffectiveConfig, GenerationRequest, GenerationResult};

/// Turns a character pair into a story plus three images.
///
/// The client holds no settings of its own: every call receives the
/// `EffectiveConfig` to use, so a settings save only affects calls started
/// after it.
pub struct GenerationClient<T> {
    transport: T,
    providers: ProviderSettings,
}

impl<T: Transport> GenerationClient<T> {
    pub fn new(transport: T, providers: ProviderSettings) -> Self {
        GenerationClient {
            transport,
            providers,
        }
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Runs the story call and the three image calls concurrently and
    /// returns either all four results or the first error.
    pub async fn generate(
        &self,
        config: &EffectiveConfig,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        let story_prompt = story_prompt(request);
        let first_avatar_prompt = avatar_prompt(&request.character1);
        let second_avatar_prompt = avatar_prompt(&request.character2);
        let couple_prompt = couple_prompt(request);

        info!(
            "Generating CP for {} & {} (alternate_provider={})",
            request.character1.name, request.character2.name, config.use_alternate_provider
        );

        let (story, first_avatar, second_avatar, cp_image) = tokio::try_join!(
            self.generate_story(config, &story_prompt),
            self.generate_image(config, &first_avatar_prompt),
            self.generate_image(config, &second_avatar_prompt),
            self.generate_image(config, &couple_prompt),
        )?;

        Ok(GenerationResult {
            story,
            avatars: Avatars {
                character1: first_avatar,
                character2: second_avatar,
            },
            cp_image,
        })
    }

    pub async fn generate_story(
        &self,
        config: &EffectiveConfig,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: &config.text_model,
            system_prompt: STORY_SYSTEM_PROMPT,
            user_prompt: prompt,
            temperature: Some(STORY_TEMPERATURE),
        };
        openai::chat_completion(&self.transport, config, &request, ProviderOperation::Story).await
    }

    /// With the alternate provider enabled the prompt is translated first and
    /// only the translation reaches the image endpoint.
    pub async fn generate_image(
        &self,
        config: &EffectiveConfig,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        if !config.use_alternate_provider {
            return openai::generate_image(&self.transport, config, prompt).await;
        }

        let translated = self.translate_prompt(config, prompt).await?;
        debug!("Translated image prompt: {}", translated);
        siliconflow::generate_image(
            &self.transport,
            &self.providers,
            &config.alternate_provider_key,
            &translated,
        )
        .await
    }

    async fn translate_prompt(
        &self,
        config: &EffectiveConfig,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: &self.providers.translation_model,
            system_prompt: TRANSLATION_SYSTEM_PROMPT,
            user_prompt: prompt,
            temperature: None,
        };
        openai::chat_completion(
            &self.transport,
            config,
            &request,
            ProviderOperation::Translate,
        )
        .await
    }
}
