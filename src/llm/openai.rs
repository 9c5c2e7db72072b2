use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::llm::error::{GenerationError, ProviderOperation};
use crate::llm::transport::{endpoint, ApiReply, Transport};
use crate::models::EffectiveConfig;
use crate::utils::timing::log_llm_timing;

pub const IMAGE_SIZE: &str = "1024x1024";
const IMAGE_QUALITY: &str = "standard";

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    data: Option<Vec<ImageItem>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageItem {
    url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub system_prompt: &'a str,
    pub user_prompt: &'a str,
    pub temperature: Option<f64>,
}

fn build_chat_payload(request: &ChatRequest<'_>) -> Value {
    let mut payload = json!({
        "model": request.model,
        "messages": [
            { "role": "system", "content": request.system_prompt },
            { "role": "user", "content": request.user_prompt }
        ],
    });
    if let Some(temperature) = request.temperature {
        payload["temperature"] = json!(temperature);
    }
    payload
}

fn build_image_payload(model: &str, prompt: &str) -> Value {
    json!({
        "model": model,
        "prompt": prompt,
        "n": 1,
        "size": IMAGE_SIZE,
        "quality": IMAGE_QUALITY,
    })
}

/// Checks the status and decodes a success body.
pub(crate) fn decode_reply<R: DeserializeOwned>(
    provider: &str,
    reply: ApiReply,
    operation: ProviderOperation,
) -> Result<R, GenerationError> {
    if !reply.status.is_success() {
        warn!(
            "{} {} request failed: status={}",
            provider,
            operation.as_str(),
            reply.status
        );
        return Err(GenerationError::provider(
            operation,
            reply.status.as_u16(),
            &reply.body,
        ));
    }

    serde_json::from_str::<R>(&reply.body)
        .map_err(|err| GenerationError::malformed(operation, format!("invalid JSON body: {err}")))
}

pub(crate) fn first_image_url(
    items: Option<Vec<ImageItem>>,
    operation: ProviderOperation,
    field: &str,
) -> Result<String, GenerationError> {
    items
        .and_then(|items| items.into_iter().next())
        .and_then(|item| item.url)
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| GenerationError::malformed(operation, format!("missing {field}[0].url")))
}

/// POSTs to `{apiBaseUrl}/chat/completions` and returns the first choice's
/// content.
pub async fn chat_completion<T: Transport>(
    transport: &T,
    config: &EffectiveConfig,
    request: &ChatRequest<'_>,
    operation: ProviderOperation,
) -> Result<String, GenerationError> {
    let url = endpoint(&config.api_base_url, "chat/completions");
    let payload = build_chat_payload(request);
    let metadata = json!({ "prompt_chars": request.user_prompt.chars().count() });

    log_llm_timing("openai", request.model, operation.as_str(), Some(metadata), || async {
        let reply = transport.post_json(&url, &config.api_key, &payload).await?;
        let response: ChatCompletionResponse = decode_reply("openai", reply, operation)?;
        let content = response
            .choices
            .and_then(|choices| choices.into_iter().next())
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                GenerationError::malformed(operation, "missing choices[0].message.content")
            })?;
        debug!(
            "openai {} returned {} chars",
            operation.as_str(),
            content.chars().count()
        );
        Ok::<_, GenerationError>(content)
    })
    .await
}

/// POSTs to `{apiBaseUrl}/images/generations` and returns `data[0].url`.
pub async fn generate_image<T: Transport>(
    transport: &T,
    config: &EffectiveConfig,
    prompt: &str,
) -> Result<String, GenerationError> {
    let operation = ProviderOperation::Image;
    let url = endpoint(&config.api_base_url, "images/generations");
    let payload = build_image_payload(&config.image_model, prompt);

    log_llm_timing("openai", &config.image_model, operation.as_str(), None, || async {
        let reply = transport.post_json(&url, &config.api_key, &payload).await?;
        let response: ImagesResponse = decode_reply("openai", reply, operation)?;
        first_image_url(response.data, operation, "data")
    })
    .await
}
