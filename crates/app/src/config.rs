use clap::Parser;
use docvoice_core::generation::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use docvoice_core::pool::DEFAULT_WORKER_LIMIT;
use docvoice_core::{
    AssistantService, GenerativeClient, GoogleSpeechRecognizer, HistoryStore, IntakeRouter,
    OpenAiConfig, OpenAiGenerator, PdftoppmConfig, PdftoppmRasterizer, SpeechRecognizer,
    TesseractConfig, TesseractOcr, Transcriber, WorkerPool,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::routes::RouterConfig;

#[derive(Debug, Clone, Parser)]
#[command(name = "docvoice-server", version, about)]
pub struct ServerConfig {
    /// Address the HTTP server listens on
    #[arg(long, env = "DOCVOICE_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Browser origins allowed by CORS (comma separated in the env var)
    #[arg(
        long = "cors-origin",
        env = "DOCVOICE_CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:5173"
    )]
    pub cors_origins: Vec<String>,

    /// API key for the generative model
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub openai_base_url: String,

    /// Model used for chat replies and summaries
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    pub openai_model: String,

    /// Google Cloud Speech-to-Text API key; transcription is disabled without it
    #[arg(long, env = "GOOGLE_SPEECH_API_KEY", hide_env_values = true)]
    pub google_speech_api_key: Option<String>,

    /// tesseract executable
    #[arg(long, env = "TESSERACT_BIN", default_value = "tesseract")]
    pub tesseract_bin: PathBuf,

    /// tesseract language pack
    #[arg(long, env = "OCR_LANGUAGE", default_value = "eng")]
    pub ocr_language: String,

    /// pdftoppm executable
    #[arg(long, env = "PDFTOPPM_BIN", default_value = "pdftoppm")]
    pub pdftoppm_bin: PathBuf,

    /// Resolution PDF pages are rendered at before OCR
    #[arg(long, env = "PDF_DPI", default_value_t = 200)]
    pub pdf_dpi: u32,

    /// Maximum concurrent external calls and extraction jobs
    #[arg(long, env = "DOCVOICE_WORKERS", default_value_t = DEFAULT_WORKER_LIMIT)]
    pub worker_limit: usize,

    /// Largest accepted request body in bytes
    #[arg(long, env = "DOCVOICE_MAX_UPLOAD_BYTES", default_value_t = 25 * 1024 * 1024)]
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// The speech key, with blank values treated as missing.
    pub fn speech_api_key(&self) -> Option<&str> {
        self.google_speech_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn router_config(&self) -> RouterConfig {
        RouterConfig {
            cors_origins: self.cors_origins.clone(),
            max_upload_bytes: self.max_upload_bytes,
        }
    }

    pub fn build_service(&self) -> AssistantService {
        let pool = WorkerPool::new(self.worker_limit);

        let ocr = TesseractOcr::new(TesseractConfig {
            binary: self.tesseract_bin.clone(),
            language: self.ocr_language.clone(),
        });
        let rasterizer = PdftoppmRasterizer::new(PdftoppmConfig {
            binary: self.pdftoppm_bin.clone(),
            dpi: self.pdf_dpi,
        });
        let intake = IntakeRouter::with_engines(rasterizer, ocr);

        let generator = OpenAiGenerator::new(OpenAiConfig {
            api_key: self.openai_api_key.clone(),
            base_url: self.openai_base_url.clone(),
            model: self.openai_model.clone(),
        });

        let recognizer = self
            .speech_api_key()
            .map(|key| Arc::new(GoogleSpeechRecognizer::new(key)) as Arc<dyn SpeechRecognizer>);

        AssistantService::new(
            intake,
            GenerativeClient::new(Arc::new(generator), pool.clone()),
            Transcriber::new(recognizer, pool.clone()),
            Arc::new(HistoryStore::new()),
            pool,
        )
    }
}
