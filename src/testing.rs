//! Fakes shared by the unit tests.

use std::time::Duration;

use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::generation::prompts::TRANSLATION_SYSTEM_PROMPT;
use crate::llm::{ApiReply, GenerationError, Transport};
use crate::models::{Character, EffectiveConfig, GenerationRequest};

pub const SILICON_FLOW_BASE: &str = "https://sf.example.com/v1";

type Responder = Box<dyn Fn(&str, &Value) -> (ApiReply, u64) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub bearer: String,
    pub payload: Value,
}

/// Records every request and answers through a closure returning the reply
/// and a delay in milliseconds.
pub struct FakeTransport {
    calls: Mutex<Vec<RecordedCall>>,
    responder: Responder,
}

impl FakeTransport {
    pub fn new(
        responder: impl Fn(&str, &Value) -> (ApiReply, u64) + Send + Sync + 'static,
    ) -> Self {
        FakeTransport {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(|url, payload| (success_reply(url, payload), 0))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }
}

impl Transport for FakeTransport {
    async fn post_json(
        &self,
        url: &str,
        bearer: &str,
        payload: &Value,
    ) -> Result<ApiReply, GenerationError> {
        self.calls.lock().push(RecordedCall {
            url: url.to_string(),
            bearer: bearer.to_string(),
            payload: payload.clone(),
        });
        let (reply, delay_ms) = (self.responder)(url, payload);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        Ok(reply)
    }
}

pub fn reply(status: StatusCode, body: Value) -> ApiReply {
    ApiReply {
        status,
        body: body.to_string(),
    }
}

pub fn image_url_for(prompt: &str) -> String {
    format!("https://img.example.com/{}.png", prompt)
}

/// Story calls get a fixed story, translation calls echo the prompt with an
/// `EN: ` prefix, image calls get a URL derived from the prompt.
pub fn success_reply(url: &str, payload: &Value) -> ApiReply {
    if url.ends_with("/chat/completions") {
        let user = payload["messages"][1]["content"].as_str().unwrap_or_default();
        let content = if payload["messages"][0]["content"] == TRANSLATION_SYSTEM_PROMPT {
            format!("EN: {user}")
        } else {
            "夕阳下，两人在咖啡馆相遇，从此故事开始了。".to_string()
        };
        return reply(
            StatusCode::OK,
            json!({ "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }] }),
        );
    }

    let prompt = payload["prompt"].as_str().unwrap_or_default();
    let image = json!([{ "url": image_url_for(prompt) }]);
    if url.starts_with(SILICON_FLOW_BASE) {
        reply(StatusCode::OK, json!({ "images": image }))
    } else {
        reply(StatusCode::OK, json!({ "created": 1, "data": image }))
    }
}

pub fn sample_config() -> EffectiveConfig {
    EffectiveConfig {
        api_key: "sk-test".to_string(),
        api_base_url: "https://api.example.com/v1".to_string(),
        text_model: "gpt-4o-mini".to_string(),
        image_model: "dall-e-3".to_string(),
        use_alternate_provider: false,
        alternate_provider_key: String::new(),
    }
}

pub fn sample_request() -> GenerationRequest {
    GenerationRequest::new(
        Character::new("小明", "程序员"),
        Character::new("小红", "设计师"),
    )
}
