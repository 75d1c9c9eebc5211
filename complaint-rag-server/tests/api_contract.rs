use std::sync::Arc;

use async_trait::async_trait;
use complaint_rag::{
    DecodingOptions, Document, EmbeddingProvider, FlatIndex, InMemoryDocumentStore, Pipeline,
    ProductCategory, REFUSAL_SENTENCE, RagConfig, TextGenerator,
};
use complaint_rag_server::{AppState, app_router};
use serde_json::{Value, json};

struct TopicEmbedder;

fn topic_vector(text: &str) -> Vec<f32> {
    let text = text.to_lowercase();
    vec![
        if text.contains("card") { 1.0 } else { 0.0 },
        if text.contains("transfer") { 1.0 } else { 0.0 },
        0.05,
    ]
}

#[async_trait]
impl EmbeddingProvider for TopicEmbedder {
    async fn embed(&self, text: &str) -> complaint_rag::Result<Vec<f32>> {
        Ok(topic_vector(text))
    }

    fn dimensions(&self) -> usize {
        3
    }
}

struct CannedModel;

#[async_trait]
impl TextGenerator for CannedModel {
    fn name(&self) -> &str {
        "canned"
    }

    async fn generate(&self, _prompt: &str, _options: &DecodingOptions) -> complaint_rag::Result<String> {
        Ok("  Customers dispute unexpected card fees.  ".to_string())
    }
}

fn card_documents() -> Vec<Document> {
    [
        "My credit card was charged an annual fee I never agreed to and the bank refused a refund.",
        "The card issuer raised my interest rate without any notice on my credit card statement.",
        "Fraudulent charges appeared on my card and the dispute was closed without explanation.",
    ]
    .iter()
    .enumerate()
    .map(|(i, text)| {
        Document::new(format!("cc-{i}"), *text, format!("{}", 1000 + i), ProductCategory::CreditCard)
    })
    .collect()
}

fn pipeline() -> Pipeline {
    let documents = card_documents();
    let vectors = documents.iter().map(|d| topic_vector(&d.content)).collect();
    let config = RagConfig::builder().min_similarity(0.5).build().unwrap();

    Pipeline::builder()
        .config(config)
        .embedding_provider(Arc::new(TopicEmbedder))
        .index(Arc::new(FlatIndex::new(3, vectors).unwrap()))
        .document_store(Arc::new(InMemoryDocumentStore::from_documents(documents)))
        .text_generator(Arc::new(CannedModel))
        .build()
        .unwrap()
}

async fn spawn_server() -> (String, tokio::task::JoinHandle<()>) {
    let app = app_router(AppState::new(pipeline()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    (format!("http://{}", addr), handle)
}

#[tokio::test]
async fn health_reports_ok() {
    let (base, handle) = spawn_server().await;
    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .expect("health response")
        .json()
        .await
        .expect("health json");
    assert_eq!(body["status"], "ok");
    handle.abort();
}

#[tokio::test]
async fn answer_returns_structured_result() {
    let (base, handle) = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/answer", base))
        .json(&json!({"question": "What fees do customers see on their credit card?"}))
        .send()
        .await
        .expect("answer response");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("answer json");
    assert_eq!(body["answer"], "Customers dispute unexpected card fees.");
    assert_eq!(body["outcome"], "answered");

    let sources = body["sources"].as_array().expect("sources array");
    assert!(sources.len() >= 2 && sources.len() <= 3);
    assert_eq!(sources[0]["metadata"]["product_category"], "Credit Card");

    let timings = &body["timings"];
    let sum = timings["retrieval_s"].as_f64().unwrap()
        + timings["context_build_s"].as_f64().unwrap()
        + timings["generation_s"].as_f64().unwrap();
    assert!((timings["total_s"].as_f64().unwrap() - sum).abs() < 1e-9);

    handle.abort();
}

#[tokio::test]
async fn answer_omits_optional_fields_when_not_requested() {
    let (base, handle) = spawn_server().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{}/api/answer", base))
        .json(&json!({
            "question": "card fees?",
            "return_timings": false,
            "return_docs": false
        }))
        .send()
        .await
        .expect("answer response")
        .json()
        .await
        .expect("answer json");

    assert!(body.get("timings").is_none());
    assert!(body.get("sources").is_none());
    handle.abort();
}

#[tokio::test]
async fn ask_refuses_unrelated_questions() {
    let (base, handle) = spawn_server().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{}/api/ask", base))
        .json(&json!({"question": "How do I bake sourdough bread?"}))
        .send()
        .await
        .expect("ask response")
        .json()
        .await
        .expect("ask json");

    assert_eq!(body["answer"], REFUSAL_SENTENCE);
    assert_eq!(body["sources"], "");
    handle.abort();
}

#[tokio::test]
async fn ask_lists_numbered_sources() {
    let (base, handle) = spawn_server().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{}/api/ask", base))
        .json(&json!({"question": "Problems with my credit card?"}))
        .send()
        .await
        .expect("ask response")
        .json()
        .await
        .expect("ask json");

    let sources = body["sources"].as_str().expect("sources string");
    assert!(sources.starts_with("Source 1:\n"));
    assert!(sources.contains("\n\nSource 2:\n"));
    handle.abort();
}

#[tokio::test]
async fn blank_question_is_bad_request() {
    let (base, handle) = spawn_server().await;
    let client = reqwest::Client::new();

    for route in ["/api/answer", "/api/ask"] {
        let response = client
            .post(format!("{}{}", base, route))
            .json(&json!({"question": "   "}))
            .send()
            .await
            .expect("response");
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.expect("error json");
        assert!(body["error"].as_str().unwrap().contains("empty"));
    }

    handle.abort();
}
