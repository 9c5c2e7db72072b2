use std::future::Future;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::llm::error::GenerationError;
use crate::utils::http::get_http_client;

/// Raw provider reply; status checks and decoding happen in the callers.
#[derive(Debug, Clone)]
pub struct ApiReply {
    pub status: StatusCode,
    pub body: String,
}

pub trait Transport: Send + Sync {
    fn post_json(
        &self,
        url: &str,
        bearer: &str,
        payload: &Value,
    ) -> impl Future<Output = Result<ApiReply, GenerationError>> + Send;
}

pub struct HttpTransport {
    client: &'static Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        HttpTransport {
            client: get_http_client(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        bearer: &str,
        payload: &Value,
    ) -> Result<ApiReply, GenerationError> {
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", bearer))
            .json(payload)
            .send()
            .await
            .map_err(|err| GenerationError::Transport(format!("请求失败: {err}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| GenerationError::Transport(format!("读取响应失败: {err}")))?;

        Ok(ApiReply { status, body })
    }
}

pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}
