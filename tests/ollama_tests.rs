mod common;

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{ollama_client, ollama_replying};
use studygen::{GenerationError, LLMConfig, OllamaClient, StudyGenerator};

#[tokio::test]
async fn test_request_shape() {
    let server = ollama_replying(r#"{"summary":"S","notes":"N","studyPlan":"P"}"#).await;
    let client = ollama_client(&format!("{}/", server.uri()));

    client.generate("PROMPT TEXT", None).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["model"], "llama3.1");
    assert_eq!(body["stream"], false);
    assert_eq!(
        body["messages"],
        json!([
            { "role": "system", "content": "Return only valid JSON." },
            { "role": "user", "content": "PROMPT TEXT" }
        ])
    );
}

#[tokio::test]
async fn test_model_override_takes_precedence() {
    let server = ollama_replying("{}").await;
    let client = ollama_client(&server.uri());

    client.generate("prompt", Some("mistral")).await.unwrap();
    client.generate("prompt", Some("  ")).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let models: Vec<String> = requests
        .iter()
        .map(|r| {
            let body: Value = serde_json::from_slice(&r.body).unwrap();
            body["model"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(models, vec!["mistral", "llama3.1"]);
}

#[tokio::test]
async fn test_wrapped_json_is_recovered() {
    let server = ollama_replying(
        "Here you go: ```json\n{\"summary\":\"S\",\"notes\":\"N\",\"studyPlan\":\"P\"}\n```",
    )
    .await;
    let client = ollama_client(&server.uri());

    let material = client.generate("prompt", None).await.unwrap();
    assert_eq!(material.summary, "S");
    assert_eq!(material.notes, "N");
    assert_eq!(material.study_plan, "P");
}

#[tokio::test]
async fn test_plain_text_is_non_json_content() {
    let server = ollama_replying("I cannot comply.").await;
    let client = ollama_client(&server.uri());

    let result = client.generate("prompt", None).await;
    assert!(matches!(result, Err(GenerationError::NonJsonContent)));
}

#[tokio::test]
async fn test_missing_content_yields_empty_material() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "done": true })))
        .mount(&server)
        .await;
    let client = ollama_client(&server.uri());

    let material = client.generate("prompt", None).await.unwrap();
    assert_eq!(material, studygen::StudyMaterial::default());
}

#[tokio::test]
async fn test_not_found_is_model_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;
    let client = ollama_client(&server.uri());

    match client.generate("prompt", Some("llama9")).await {
        Err(GenerationError::ModelUnavailable { model, detail }) => {
            assert_eq!(model, "llama9");
            assert_eq!(detail, "not found");
        }
        other => panic!("expected ModelUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_model_body_is_model_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "error": "model \"llama9\" not found, try pulling it first" })),
        )
        .mount(&server)
        .await;
    let client = ollama_client(&server.uri());

    let result = client.generate("prompt", None).await;
    assert!(matches!(result, Err(GenerationError::ModelUnavailable { .. })));
}

#[tokio::test]
async fn test_server_error_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("out of memory"))
        .mount(&server)
        .await;
    let client = ollama_client(&server.uri());

    match client.generate("prompt", None).await {
        Err(GenerationError::UpstreamError { status, detail }) => {
            assert!(status.starts_with("500"));
            assert_eq!(detail, "out of memory");
        }
        other => panic!("expected UpstreamError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreadable_body_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;
    let client = ollama_client(&server.uri());

    let result = client.generate("prompt", None).await;
    assert!(matches!(result, Err(GenerationError::UpstreamError { .. })));
}

#[tokio::test]
async fn test_slow_upstream_is_transport_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "message": { "content": "{}" } }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = OllamaClient::new(LLMConfig {
        endpoint: Some(server.uri()),
        timeout_seconds: 1,
        ..LLMConfig::default()
    })
    .unwrap();

    let result = client.generate("prompt", None).await;
    assert!(matches!(result, Err(GenerationError::TransportTimeout(1))));
}

#[tokio::test]
async fn test_unreachable_host_is_upstream_error() {
    let client = ollama_client("http://127.0.0.1:1");

    let result = client.generate("prompt", None).await;
    assert!(matches!(result, Err(GenerationError::UpstreamError { .. })));
}
