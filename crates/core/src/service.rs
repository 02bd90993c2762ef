use crate::error::{ExtractError, ServiceError};
use crate::generation::GenerativeClient;
use crate::history::HistoryStore;
use crate::intake::IntakeRouter;
use crate::models::{ChatMessage, HistoryQuery, Interaction, PaginatedHistory, UploadOutcome};
use crate::pool::WorkerPool;
use crate::query::run_query;
use crate::transcription::Transcriber;
use std::sync::Arc;
use tracing::{info, warn};

/// Intake, generation and history behind one handle.
///
/// A history item is written only after every step of a chat or upload has
/// succeeded.
#[derive(Clone)]
pub struct AssistantService {
    intake: IntakeRouter,
    generator: GenerativeClient,
    transcriber: Transcriber,
    history: Arc<HistoryStore>,
    pool: WorkerPool,
}

impl AssistantService {
    pub fn new(
        intake: IntakeRouter,
        generator: GenerativeClient,
        transcriber: Transcriber,
        history: Arc<HistoryStore>,
        pool: WorkerPool,
    ) -> Self {
        Self {
            intake,
            generator,
            transcriber,
            history,
            pool,
        }
    }

    pub fn history_store(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String, ServiceError> {
        let last = messages.last().ok_or_else(|| {
            ServiceError::Validation("messages must contain at least one entry".to_string())
        })?;

        let response = self.generator.chat(messages).await?;
        let item = self.history.append(
            last.content.clone(),
            Interaction::Voice {
                response: response.clone(),
            },
        );

        info!(id = item.id, context_messages = messages.len(), "chat recorded");
        Ok(response)
    }

    pub async fn upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadOutcome, ServiceError> {
        let extractor = self.intake.route(filename).map_err(|error| {
            warn!(filename, error = %error, "upload rejected");
            error
        })?;

        let size = bytes.len();
        let text = self
            .pool
            .run_blocking(move || extractor.extract(&bytes))
            .await
            .map_err(ExtractError::from)??;

        let summary = self.generator.summarize(&text).await?;
        let item = self.history.append(
            filename,
            Interaction::Document {
                summary: summary.clone(),
            },
        );

        info!(
            id = item.id,
            filename,
            bytes = size,
            text_chars = text.len(),
            "document recorded"
        );

        Ok(UploadOutcome {
            filename: filename.to_string(),
            text,
            summary,
        })
    }

    pub async fn transcribe(&self, audio_data: &str) -> Result<String, ServiceError> {
        self.transcriber.transcribe(audio_data).await
    }

    pub fn history(&self, query: &HistoryQuery) -> Result<PaginatedHistory, ServiceError> {
        query.validate()?;
        Ok(run_query(self.history.list(), query))
    }

    pub fn delete(&self, id: u64) -> bool {
        let removed = self.history.delete(id);
        info!(id, removed, "history delete");
        removed
    }
}
