//! End-to-end tests of the fallback pipeline against a mock
//! chat-completions server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use podmeta_core::{
    CredentialPool, ImagePayload, Marketplace, ProviderConfigSet, ProviderKind, ProviderSettings,
    ProviderStatus, StatusUpdate,
};
use podmeta_fetch::{ErrorKind, FetchContext, RetryStrategy};
use podmeta_providers::{ProviderRegistry, build_pipeline, validate_key};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helpers
// ============================================================================

fn fast_context() -> FetchContext {
    FetchContext::builder()
        .timeout(Duration::from_secs(5))
        .retry(
            RetryStrategy::new(3)
                .with_base_delay(Duration::from_millis(1))
                .with_max_jitter(Duration::ZERO),
        )
        .build()
}

fn settings(server: &MockServer, prefix: &str, key: &str) -> ProviderSettings {
    ProviderSettings {
        base_url: Some(format!("{}/{prefix}/v1", server.uri())),
        ..ProviderSettings::with_key(key)
    }
}

fn both_providers(server: &MockServer) -> ProviderConfigSet {
    ProviderConfigSet::new()
        .with(ProviderKind::Mistral, settings(server, "mistral", "mistral-key"))
        .with(ProviderKind::Groq, settings(server, "groq", "gsk_groq-key"))
}

fn image() -> ImagePayload {
    ImagePayload::new("iVBORw0KGgo=", "image/png").unwrap()
}

fn completion(content: &serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "cmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content.to_string()},
            "finish_reason": "stop"
        }]
    }))
}

fn cat_metadata() -> serde_json::Value {
    json!({
        "title": "Cute Cat Lover Design",
        "description": "An adorable cat illustration for everyone who loves cats.",
        "tags": ["cat", "kitten", "cat lover", "cute", "pet", "animal", "kitty", "meow", "feline", "whiskers"],
        "mainTag": "cat lover"
    })
}

type Updates = Arc<Mutex<Vec<StatusUpdate>>>;

fn recorder() -> (Updates, impl Fn(StatusUpdate) + Send + Sync) {
    let updates: Updates = Arc::default();
    let sink = Arc::clone(&updates);
    (updates, move |u: StatusUpdate| sink.lock().unwrap().push(u))
}

// ============================================================================
// Pipeline
// ============================================================================

#[tokio::test]
async fn test_teepublic_cat_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mistral/v1/chat/completions"))
        .and(header("authorization", "Bearer mistral-key"))
        .and(body_partial_json(json!({
            "model": "pixtral-large-latest",
            "response_format": {"type": "json_object"}
        })))
        .respond_with(completion(&cat_metadata()))
        .expect(1)
        .mount(&server)
        .await;

    let config = both_providers(&server);
    let pipeline = build_pipeline(&config, Arc::new(CredentialPool::new()));
    let (updates, reporter) = recorder();

    let generated = pipeline
        .generate_metadata(&fast_context(), &image(), Marketplace::TeePublic, &config, &reporter)
        .await
        .unwrap();

    assert_eq!(generated.provider, ProviderKind::Mistral);
    assert_eq!(generated.model, "pixtral-large-latest");
    assert_eq!(generated.metadata.title, "Cute Cat Lover Design");
    assert_eq!(generated.metadata.tags.len(), 25);
    assert_eq!(generated.metadata.tags[0], "cat");
    assert_eq!(generated.metadata.main_tag.as_deref(), Some("cat lover"));

    let updates = updates.lock().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].provider, ProviderKind::Mistral);
    assert_eq!(updates[0].status, ProviderStatus::Active);
}

#[tokio::test]
async fn test_invalid_key_falls_back_to_groq() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mistral/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthorized"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/groq/v1/chat/completions"))
        .and(header("authorization", "Bearer gsk_groq-key"))
        .respond_with(completion(&cat_metadata()))
        .expect(1)
        .mount(&server)
        .await;

    let config = both_providers(&server);
    let pipeline = build_pipeline(&config, Arc::new(CredentialPool::new()));
    let (updates, reporter) = recorder();

    let outcome = pipeline
        .execute(&fast_context(), &image(), Marketplace::Zazzle, &config, &reporter)
        .await;

    assert_eq!(outcome.successful_provider(), Some(ProviderKind::Groq));
    let generated = outcome.result.unwrap();
    assert_eq!(generated.model, "meta-llama/llama-4-maverick-17b-128e-instruct");
    assert_eq!(generated.metadata.tags.len(), 10);

    let updates = updates.lock().unwrap();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].provider, ProviderKind::Mistral);
    assert_eq!(updates[0].status, ProviderStatus::Error);
    assert!(updates[0].message.as_deref().unwrap().contains("invalid API key"));
    assert_eq!(updates[1].provider, ProviderKind::Groq);
    assert_eq!(updates[1].status, ProviderStatus::Active);
}

#[tokio::test]
async fn test_missing_model_advances_to_next_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mistral/v1/chat/completions"))
        .and(body_partial_json(json!({"model": "pixtral-large-latest"})))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"error": {"message": "model not found"}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/mistral/v1/chat/completions"))
        .and(body_partial_json(json!({"model": "mistral-medium-latest"})))
        .respond_with(completion(&cat_metadata()))
        .expect(1)
        .mount(&server)
        .await;

    let config = both_providers(&server);
    let pipeline = build_pipeline(&config, Arc::new(CredentialPool::new()));
    let (_updates, reporter) = recorder();

    let generated = pipeline
        .generate_metadata(&fast_context(), &image(), Marketplace::Spreadshirt, &config, &reporter)
        .await
        .unwrap();

    assert_eq!(generated.provider, ProviderKind::Mistral);
    assert_eq!(generated.model, "mistral-medium-latest");
    assert!(generated.metadata.title.chars().count() <= 50);
}

#[tokio::test]
async fn test_rate_limit_exhausts_retries_and_reports() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mistral/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(json!({"error": {"message": "Rate limit reached"}})),
        )
        .expect(4)
        .mount(&server)
        .await;

    let mut config = both_providers(&server);
    config.entry(ProviderKind::Groq).is_active = false;
    let pipeline = build_pipeline(&config, Arc::new(CredentialPool::new()));
    let (updates, reporter) = recorder();

    let err = pipeline
        .generate_metadata(&fast_context(), &image(), Marketplace::TeePublic, &config, &reporter)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RateLimited);
    assert!(err.to_string().contains("Rate limit reached"));

    let updates = updates.lock().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].status, ProviderStatus::RateLimited);
}

#[tokio::test]
async fn test_server_error_retried_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mistral/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/mistral/v1/chat/completions"))
        .respond_with(completion(&cat_metadata()))
        .expect(1)
        .mount(&server)
        .await;

    let config = both_providers(&server);
    let pipeline = build_pipeline(&config, Arc::new(CredentialPool::new()));
    let (_updates, reporter) = recorder();

    let outcome = pipeline
        .execute(&fast_context(), &image(), Marketplace::TeePublic, &config, &reporter)
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.attempts[0].tries, 3);
}

#[tokio::test]
async fn test_timeouts_retried_then_reported_as_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mistral/v1/chat/completions"))
        .respond_with(completion(&cat_metadata()).set_delay(Duration::from_secs(3)))
        .expect(4)
        .mount(&server)
        .await;

    let mut config = both_providers(&server);
    config.entry(ProviderKind::Groq).is_active = false;
    let pipeline = build_pipeline(&config, Arc::new(CredentialPool::new()));
    let (updates, reporter) = recorder();

    let ctx = FetchContext::builder()
        .timeout(Duration::from_secs(1))
        .retry(
            RetryStrategy::new(3)
                .with_base_delay(Duration::from_millis(1))
                .with_max_jitter(Duration::ZERO),
        )
        .build();

    let outcome = pipeline
        .execute(&ctx, &image(), Marketplace::Spreadshirt, &config, &reporter)
        .await;

    let err = outcome.result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(outcome.attempts.len(), 1);
    assert_eq!(outcome.attempts[0].tries, 4);
    assert_eq!(outcome.attempts[0].error_kind, Some(ErrorKind::Network));

    let updates = updates.lock().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].provider, ProviderKind::Mistral);
    assert_eq!(updates[0].status, ProviderStatus::Error);
}

#[tokio::test]
async fn test_invalid_base_url_fails_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/groq/v1/chat/completions"))
        .respond_with(completion(&cat_metadata()))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = both_providers(&server);
    config.entry(ProviderKind::Mistral).base_url = Some("ftp://mistral.invalid/v1".to_string());
    let pipeline = build_pipeline(&config, Arc::new(CredentialPool::new()));
    let (updates, reporter) = recorder();

    let outcome = pipeline
        .execute(&fast_context(), &image(), Marketplace::Spreadshirt, &config, &reporter)
        .await;

    assert_eq!(outcome.successful_provider(), Some(ProviderKind::Groq));
    assert_eq!(outcome.attempts[0].provider, ProviderKind::Mistral);
    assert_eq!(outcome.attempts[0].tries, 1);
    assert_eq!(outcome.attempts[0].error_kind, Some(ErrorKind::RequestRejected));

    let updates = updates.lock().unwrap();
    assert_eq!(updates[0].provider, ProviderKind::Mistral);
    assert_eq!(updates[0].status, ProviderStatus::Error);
}

#[tokio::test]
async fn test_pool_keys_rotate_across_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mistral/v1/chat/completions"))
        .and(header("authorization", "Bearer pool-one"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/mistral/v1/chat/completions"))
        .and(header("authorization", "Bearer pool-two"))
        .respond_with(completion(&cat_metadata()))
        .expect(1)
        .mount(&server)
        .await;

    let config = ProviderConfigSet::new()
        .with(
            ProviderKind::Mistral,
            ProviderSettings {
                base_url: Some(format!("{}/mistral/v1", server.uri())),
                ..ProviderSettings::default()
            },
        )
        .with(
            ProviderKind::Groq,
            ProviderSettings {
                is_active: false,
                ..ProviderSettings::default()
            },
        );

    let pool = CredentialPool::new();
    pool.add(ProviderKind::Mistral, "pool-one");
    pool.add(ProviderKind::Mistral, "pool-two");
    let pipeline = build_pipeline(&config, Arc::new(pool));
    let (_updates, reporter) = recorder();

    let generated = pipeline
        .generate_metadata(&fast_context(), &image(), Marketplace::TeePublic, &config, &reporter)
        .await
        .unwrap();
    assert_eq!(generated.provider, ProviderKind::Mistral);
}

#[tokio::test]
async fn test_no_credentials_means_no_provider() {
    let config = ProviderConfigSet::new();
    let pipeline = build_pipeline(&config, Arc::new(CredentialPool::new()));
    let (updates, reporter) = recorder();

    let err = pipeline
        .generate_metadata(&fast_context(), &image(), Marketplace::TeePublic, &config, &reporter)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NoProviderAvailable);
    assert!(updates.lock().unwrap().is_empty());
}

// ============================================================================
// Key Validation
// ============================================================================

#[tokio::test]
async fn test_validate_key_accepts_and_rejects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/groq/v1/models"))
        .and(header("authorization", "Bearer gsk_good"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/groq/v1/models"))
        .and(header("authorization", "Bearer gsk_bad"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": {"message": "Invalid API Key"}})),
        )
        .mount(&server)
        .await;

    let ctx = fast_context();
    let descriptor = ProviderRegistry::get(ProviderKind::Groq).unwrap();
    let base = format!("{}/groq/v1", server.uri());

    validate_key(&ctx, descriptor, Some(&base), "gsk_good").await.unwrap();

    let err = validate_key(&ctx, descriptor, Some(&base), "gsk_bad").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidCredential);
    assert!(err.to_string().contains("Invalid API Key"));
}
