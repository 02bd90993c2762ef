use crate::error::GenerationError;
use crate::models::ChatMessage;
use crate::pool::WorkerPool;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const TEMPERATURE: f32 = 0.7;
pub const CHAT_MAX_TOKENS: u32 = 150;
pub const SUMMARY_MAX_TOKENS: u32 = 250;
pub const SUMMARY_SYSTEM_PROMPT: &str = "You are a helpful assistant that summarizes documents.";

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn chat(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: TEMPERATURE,
            max_tokens: CHAT_MAX_TOKENS,
        }
    }

    pub fn summary(text: &str) -> Self {
        Self {
            messages: vec![
                ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
                ChatMessage::user(format!("Please summarize the following text:\n\n{text}")),
            ],
            temperature: TEMPERATURE,
            max_tokens: SUMMARY_MAX_TOKENS,
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// `POST {base_url}/chat/completions` against an OpenAI-compatible API.
pub struct OpenAiGenerator {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiGenerator {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerationError> {
        let body = ChatCompletionBody {
            model: &self.config.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                details,
            });
        }

        let payload: ChatCompletionResponse = response.json().await?;
        first_choice_text(payload)
    }
}

fn first_choice_text(payload: ChatCompletionResponse) -> Result<String, GenerationError> {
    payload
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| GenerationError::Malformed("response has no message content".to_string()))
}

/// Chat and summary calls, each run as a job on the worker pool.
#[derive(Clone)]
pub struct GenerativeClient {
    generator: Arc<dyn TextGenerator>,
    pool: WorkerPool,
}

impl GenerativeClient {
    pub fn new(generator: Arc<dyn TextGenerator>, pool: WorkerPool) -> Self {
        Self { generator, pool }
    }

    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String, GenerationError> {
        self.submit(CompletionRequest::chat(messages.to_vec())).await
    }

    pub async fn summarize(&self, text: &str) -> Result<String, GenerationError> {
        self.submit(CompletionRequest::summary(text)).await
    }

    async fn submit(&self, request: CompletionRequest) -> Result<String, GenerationError> {
        let generator = Arc::clone(&self.generator);
        let max_tokens = request.max_tokens;

        let outcome = self
            .pool
            .run(async move { generator.complete(request).await })
            .await?;

        match &outcome {
            Ok(text) => debug!(max_tokens, chars = text.len(), "generation completed"),
            Err(failure) => error!(max_tokens, error = %failure, "generation failed"),
        }
        outcome
    }
}
