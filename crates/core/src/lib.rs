pub mod error;
pub mod extractor;
pub mod generation;
pub mod history;
pub mod intake;
pub mod models;
pub mod pool;
pub mod query;
pub mod service;
pub mod transcription;

pub use error::{ExtractError, GenerationError, PoolError, ServiceError, TranscriptionError};
pub use extractor::{
    DocxExtractor, ImageExtractor, OcrEngine, PageRasterizer, PdfExtractor, PdftoppmConfig,
    PdftoppmRasterizer, TesseractConfig, TesseractOcr, TextExtractor,
};
pub use generation::{
    CompletionRequest, GenerativeClient, OpenAiConfig, OpenAiGenerator, TextGenerator,
};
pub use history::HistoryStore;
pub use intake::{DocumentFormat, IntakeRouter};
pub use models::{
    ChatMessage, HistoryItem, HistoryKind, HistoryQuery, Interaction, PaginatedHistory,
    SortOrder, UploadOutcome,
};
pub use pool::WorkerPool;
pub use query::run_query;
pub use service::AssistantService;
pub use transcription::{GoogleSpeechRecognizer, SpeechRecognizer, Transcriber};
