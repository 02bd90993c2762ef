//! Drives the router end to end with in-process fakes for OCR, the
//! generative model and speech recognition.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use docvoice_core::generation::CompletionRequest;
use docvoice_core::transcription::{SpeechAlternative, SpeechResult};
use docvoice_core::{
    AssistantService, ExtractError, GenerationError, GenerativeClient, HistoryStore,
    IntakeRouter, Interaction, SpeechRecognizer, TextExtractor, TextGenerator, Transcriber,
    TranscriptionError, WorkerPool,
};
use docvoice_server::{create_router, AppState, RouterConfig};

struct EchoGenerator;

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerationError> {
        let last = request
            .messages
            .last()
            .map(|message| message.content.clone())
            .unwrap_or_default();
        if request.max_tokens == 250 {
            Ok(format!("summary of {} chars", last.len()))
        } else {
            Ok(format!("echo: {last}"))
        }
    }
}

struct FixedText(&'static str);

impl TextExtractor for FixedText {
    fn extract(&self, _bytes: &[u8]) -> Result<String, ExtractError> {
        Ok(self.0.to_string())
    }
}

struct CannedSpeech;

#[async_trait]
impl SpeechRecognizer for CannedSpeech {
    async fn recognize(&self, _audio: Vec<u8>) -> Result<Vec<SpeechResult>, TranscriptionError> {
        Ok(vec![
            SpeechResult {
                alternatives: vec![SpeechAlternative {
                    transcript: "remind me".to_string(),
                    confidence: Some(0.9),
                }],
            },
            SpeechResult {
                alternatives: vec![SpeechAlternative {
                    transcript: "tomorrow".to_string(),
                    confidence: Some(0.8),
                }],
            },
        ])
    }
}

fn make_service(speech: bool) -> AssistantService {
    let pool = WorkerPool::new(4);
    let recognizer = speech.then(|| Arc::new(CannedSpeech) as Arc<dyn SpeechRecognizer>);
    AssistantService::new(
        IntakeRouter::new(
            Arc::new(FixedText("page one\npage two\n")),
            Arc::new(FixedText("Heading\n\nBody\n")),
            Arc::new(FixedText("receipt total 12.50")),
        ),
        GenerativeClient::new(Arc::new(EchoGenerator), pool.clone()),
        Transcriber::new(recognizer, pool.clone()),
        Arc::new(HistoryStore::new()),
        pool,
    )
}

fn make_app_with(service: AssistantService) -> Router {
    create_router(AppState::new(service), &RouterConfig::default())
}

fn make_app() -> Router {
    make_app_with(make_service(false))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri)
        .body(Body::empty())
        .expect("request should build")
}

fn multipart_upload(filename: &str, content: &[u8]) -> Request<Body> {
    let boundary = "docvoice-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::post("/api/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .expect("request should build")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body should be readable");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body should be json")
    };
    (status, value)
}

#[tokio::test]
async fn chat_replies_and_records_voice_item() {
    let app = make_app();
    let (status, body) = send(
        &app,
        post_json(
            "/api/chat",
            json!({"messages": [
                {"role": "assistant", "content": "Hi, what can I do?"},
                {"role": "user", "content": "hi"}
            ]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "echo: hi");

    let (status, history) = send(&app, get("/api/history")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["total"], 1);
    let item = &history["items"][0];
    assert_eq!(item["id"], 1);
    assert_eq!(item["type"], "voice");
    assert_eq!(item["content"], "hi");
    assert_eq!(item["response"], "echo: hi");
    assert!(item.get("summary").is_none());
}

#[tokio::test]
async fn empty_chat_is_unprocessable() {
    let app = make_app();
    let (status, body) = send(&app, post_json("/api/chat", json!({"messages": []}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn upload_returns_text_and_summary() {
    let app = make_app();
    let (status, body) = send(&app, multipart_upload("Scan.PDF", b"%PDF-1.7")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["filename"], "Scan.PDF");
    assert_eq!(body["text"], "page one\npage two\n");
    assert!(body["summary"]
        .as_str()
        .is_some_and(|summary| summary.starts_with("summary of")));

    let (_, history) = send(&app, get("/api/history?type_filter=document")).await;
    assert_eq!(history["total"], 1);
    assert_eq!(history["items"][0]["content"], "Scan.PDF");
    assert!(history["items"][0].get("response").is_none());
}

#[tokio::test]
async fn unsupported_upload_is_rejected_and_not_recorded() {
    let app = make_app();
    let (status, body) = send(&app, multipart_upload("notes.txt", b"plain")).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"], "unsupported_format");
    assert!(body["detail"].as_str().is_some_and(|detail| detail.contains(".txt")));

    let (_, history) = send(&app, get("/api/history")).await;
    assert_eq!(history["total"], 0);
}

#[tokio::test]
async fn voice_filter_with_search_finds_single_item() {
    let service = make_service(false);
    service.history_store().append(
        "hi",
        Interaction::Voice {
            response: "hello".to_string(),
        },
    );
    service.history_store().append(
        "hello.docx",
        Interaction::Document {
            summary: "greetings".to_string(),
        },
    );
    let app = make_app_with(service);

    let (status, body) = send(&app, get("/api/history?type_filter=voice&search=hell")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["items"][0]["content"], "hi");
}

#[tokio::test]
async fn page_beyond_end_is_empty() {
    let service = make_service(false);
    for n in 0..3 {
        service.history_store().append(
            format!("message {n}"),
            Interaction::Voice {
                response: "ok".to_string(),
            },
        );
    }
    let app = make_app_with(service);

    let (status, body) = send(&app, get("/api/history?page=5&per_page=10")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"], json!([]));
    assert_eq!(body["total"], 3);
    assert_eq!(body["total_pages"], 1);
    assert_eq!(body["page"], 5);
    assert_eq!(body["per_page"], 10);
}

#[tokio::test]
async fn invalid_history_params_are_rejected() {
    let app = make_app();
    for uri in [
        "/api/history?per_page=0",
        "/api/history?per_page=101",
        "/api/history?page=0",
        "/api/history?type_filter=image",
        "/api/history?sort=newest",
        "/api/history?page=abc",
    ] {
        let (status, _) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
    }
}

#[tokio::test]
async fn delete_is_idempotent() {
    let app = make_app();
    send(
        &app,
        post_json("/api/chat", json!({"messages": [{"role": "user", "content": "hi"}]})),
    )
    .await;

    for _ in 0..2 {
        let request = Request::delete("/api/history/1")
            .body(Body::empty())
            .expect("request should build");
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Item deleted successfully");
    }

    let (_, history) = send(&app, get("/api/history")).await;
    assert_eq!(history["total"], 0);

    send(
        &app,
        post_json("/api/chat", json!({"messages": [{"role": "user", "content": "again"}]})),
    )
    .await;
    let (_, history) = send(&app, get("/api/history")).await;
    assert_eq!(history["items"][0]["id"], 2);
}

#[tokio::test]
async fn transcribe_without_credentials_is_a_configuration_error() {
    let app = make_app();
    let (status, body) = send(
        &app,
        post_json(
            "/api/transcribe",
            json!({"audio_data": "data:audio/webm;base64,AAAA"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "configuration_error");
}

#[tokio::test]
async fn transcribe_joins_segments() {
    let app = make_app_with(make_service(true));
    let (status, body) = send(
        &app,
        post_json(
            "/api/transcribe",
            json!({"audio_data": "data:audio/webm;codecs=opus;base64,AAAA"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transcript"], "remind me tomorrow");

    let (_, history) = send(&app, get("/api/history")).await;
    assert_eq!(history["total"], 0);
}

#[tokio::test]
async fn health_reports_item_count() {
    let app = make_app();
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["history_items"], 0);
}
