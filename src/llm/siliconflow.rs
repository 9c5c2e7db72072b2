use serde::Deserialize;
use serde_json::{json, Value};

use crate::llm::error::{GenerationError, ProviderOperation};
use crate::llm::openai::{decode_reply, first_image_url, ImageItem, IMAGE_SIZE};
use crate::llm::transport::{endpoint, Transport};
use crate::llm::ProviderSettings;
use crate::utils::timing::log_llm_timing;

#[derive(Debug, Deserialize)]
struct SiliconFlowImagesResponse {
    images: Option<Vec<ImageItem>>,
}

fn build_image_payload(model: &str, prompt: &str) -> Value {
    json!({
        "model": model,
        "prompt": prompt,
        "image_size": IMAGE_SIZE,
    })
}

/// Alternate image provider. Expects an already translated prompt.
pub async fn generate_image<T: Transport>(
    transport: &T,
    providers: &ProviderSettings,
    api_key: &str,
    prompt: &str,
) -> Result<String, GenerationError> {
    let operation = ProviderOperation::Image;
    let url = endpoint(&providers.silicon_flow_base_url, "images/generations");
    let payload = build_image_payload(&providers.silicon_flow_model, prompt);

    log_llm_timing(
        "siliconflow",
        &providers.silicon_flow_model,
        operation.as_str(),
        None,
        || async {
            let reply = transport.post_json(&url, api_key, &payload).await?;
            let response: SiliconFlowImagesResponse =
                decode_reply("siliconflow", reply, operation)?;
            first_image_url(response.images, operation, "images")
        },
    )
    .await
}
