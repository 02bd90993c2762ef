use crate::error::{ServiceError, TranscriptionError};
use crate::pool::WorkerPool;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

pub const GOOGLE_SPEECH_ENDPOINT: &str = "https://speech.googleapis.com/v1/speech:recognize";

/// Recognition settings sent with every request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionConfig {
    pub encoding: String,
    pub sample_rate_hertz: u32,
    pub language_code: String,
    pub enable_automatic_punctuation: bool,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            encoding: "WEBM_OPUS".to_string(),
            sample_rate_hertz: 48_000,
            language_code: "en-US".to_string(),
            enable_automatic_punctuation: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SpeechAlternative {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SpeechResult {
    #[serde(default)]
    pub alternatives: Vec<SpeechAlternative>,
}

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn recognize(&self, audio: Vec<u8>) -> Result<Vec<SpeechResult>, TranscriptionError>;
}

#[derive(Debug, Serialize)]
struct RecognizeBody<'a> {
    config: &'a RecognitionConfig,
    audio: RecognizeAudio,
}

#[derive(Debug, Serialize)]
struct RecognizeAudio {
    content: String,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<SpeechResult>,
}

/// Google Cloud Speech-to-Text v1 `speech:recognize`, keyed by API key.
pub struct GoogleSpeechRecognizer {
    api_key: String,
    endpoint: String,
    config: RecognitionConfig,
    client: Client,
}

impl GoogleSpeechRecognizer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: GOOGLE_SPEECH_ENDPOINT.to_string(),
            config: RecognitionConfig::default(),
            client: Client::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SpeechRecognizer for GoogleSpeechRecognizer {
    async fn recognize(&self, audio: Vec<u8>) -> Result<Vec<SpeechResult>, TranscriptionError> {
        let body = RecognizeBody {
            config: &self.config,
            audio: RecognizeAudio {
                content: STANDARD.encode(audio),
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::Request {
                status: status.as_u16(),
                details,
            });
        }

        let payload: RecognizeResponse = response.json().await?;
        Ok(payload.results)
    }
}

/// Drops everything up to and including the first comma of a data URL.
pub fn strip_data_url_prefix(audio_data: &str) -> &str {
    audio_data
        .split_once(',')
        .map(|(_, payload)| payload)
        .unwrap_or(audio_data)
}

pub fn decode_audio(audio_data: &str) -> Result<Vec<u8>, TranscriptionError> {
    let payload = strip_data_url_prefix(audio_data).trim();
    if payload.is_empty() {
        return Err(TranscriptionError::InvalidAudio(
            "audio payload is empty".to_string(),
        ));
    }

    STANDARD
        .decode(payload)
        .map_err(|error| TranscriptionError::InvalidAudio(error.to_string()))
}

/// Top alternative of each segment, space-joined and trimmed.
pub fn join_transcript(results: &[SpeechResult]) -> String {
    results
        .iter()
        .filter_map(|result| result.alternatives.first())
        .map(|alternative| alternative.transcript.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

#[derive(Clone)]
pub struct Transcriber {
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    pool: WorkerPool,
}

impl Transcriber {
    pub fn new(recognizer: Option<Arc<dyn SpeechRecognizer>>, pool: WorkerPool) -> Self {
        Self { recognizer, pool }
    }

    pub fn is_configured(&self) -> bool {
        self.recognizer.is_some()
    }

    pub async fn transcribe(&self, audio_data: &str) -> Result<String, ServiceError> {
        let recognizer = self.recognizer.as_ref().map(Arc::clone).ok_or_else(|| {
            ServiceError::Configuration("speech service credentials are not available".to_string())
        })?;

        let audio = decode_audio(audio_data).map_err(|error| {
            warn!(error = %error, "rejected audio payload");
            ServiceError::Validation(error.to_string())
        })?;
        let audio_bytes = audio.len();

        let results = self
            .pool
            .run(async move { recognizer.recognize(audio).await })
            .await
            .map_err(TranscriptionError::from)??;

        let transcript = join_transcript(&results);
        debug!(
            audio_bytes,
            segments = results.len(),
            chars = transcript.len(),
            "audio transcribed"
        );
        Ok(transcript)
    }
}
