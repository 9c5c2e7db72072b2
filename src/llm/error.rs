use serde_json::Value;

/// Which provider call produced an error; decides the fallback message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderOperation {
    Story,
    Image,
    Translate,
}

impl ProviderOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderOperation::Story => "story",
            ProviderOperation::Image => "image",
            ProviderOperation::Translate => "translate",
        }
    }

    pub fn fallback_message(self) -> &'static str {
        match self {
            ProviderOperation::Story => "生成故事失败",
            ProviderOperation::Image => "生成图片失败",
            ProviderOperation::Translate => "翻译提示词失败",
        }
    }

    /// Translation failures never surface the provider body.
    fn uses_provider_message(self) -> bool {
        !matches!(self, ProviderOperation::Translate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("{message}")]
    Provider {
        operation: ProviderOperation,
        status: u16,
        message: String,
    },
    #[error("{0}")]
    Transport(String),
    #[error("{}: {detail}", .operation.fallback_message())]
    MalformedResponse {
        operation: ProviderOperation,
        detail: String,
    },
}

impl GenerationError {
    pub fn provider(operation: ProviderOperation, status: u16, body: &str) -> Self {
        let message = if operation.uses_provider_message() {
            extract_error_message(body)
        } else {
            None
        }
        .unwrap_or_else(|| operation.fallback_message().to_string());

        GenerationError::Provider {
            operation,
            status,
            message,
        }
    }

    pub fn malformed(operation: ProviderOperation, detail: impl Into<String>) -> Self {
        GenerationError::MalformedResponse {
            operation,
            detail: detail.into(),
        }
    }
}

/// Pulls `error.message` out of a JSON error body. Empty messages count as
/// absent.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value = serde_json::from_str::<Value>(body.trim()).ok()?;
    value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .filter(|message| !message.is_empty())
        .map(|message| message.to_string())
}
