//! Nutrition estimation against a mocked OpenAI-compatible endpoint.

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use forgefit::config::AppConfig;
use forgefit::services::NutritionEstimationService;

mod common;

fn estimation_config(base_url: &str, api_key: Option<&str>) -> AppConfig {
    AppConfig {
        ai_api_base_url: base_url.to_string(),
        ai_api_key: api_key.map(|key| key.to_string()),
        ..common::test_config()
    }
}

fn chat_completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }
        ]
    })
}

#[tokio::test]
async fn test_estimate_parses_model_response() {
    let mock_server = MockServer::start().await;

    let content = r#"{
        "food_name": "Chicken Burrito",
        "calories": 650.0,
        "protein_g": 35.0,
        "carbs_g": 70.0,
        "fat_g": 24.0,
        "serving": "1 large burrito (about 350g)"
    }"#;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion_body(content)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = estimation_config(&mock_server.uri(), Some("test-key"));
    let service = NutritionEstimationService::new(&config).unwrap();
    assert!(service.is_configured());

    let estimate = service.estimate("a large chicken burrito").await.unwrap();
    assert_eq!(estimate.food_name, "Chicken Burrito");
    assert_eq!(estimate.calories, 650.0);
    assert_eq!(estimate.protein_g, 35.0);
    assert_eq!(estimate.serving, "1 large burrito (about 350g)");
}

#[tokio::test]
async fn test_estimate_tolerates_fenced_output() {
    let mock_server = MockServer::start().await;

    let content = "```json\n{\"food_name\": \"Oatmeal\", \"calories\": 150.0, \
        \"protein_g\": 5.0, \"carbs_g\": 27.0, \"fat_g\": 3.0, \"serving\": \"1 cup cooked\"}\n```";

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion_body(content)))
        .mount(&mock_server)
        .await;

    let config = estimation_config(&mock_server.uri(), Some("test-key"));
    let service = NutritionEstimationService::new(&config).unwrap();

    let estimate = service.estimate("a bowl of oatmeal").await.unwrap();
    assert_eq!(estimate.food_name, "Oatmeal");
    assert_eq!(estimate.carbs_g, 27.0);
}

#[tokio::test]
async fn test_estimate_surfaces_upstream_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&mock_server)
        .await;

    let config = estimation_config(&mock_server.uri(), Some("test-key"));
    let service = NutritionEstimationService::new(&config).unwrap();

    let result = service.estimate("a sandwich").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_estimate_rejects_prose_output() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion_body(
            "Sorry, I cannot estimate macros for that description.",
        )))
        .mount(&mock_server)
        .await;

    let config = estimation_config(&mock_server.uri(), Some("test-key"));
    let service = NutritionEstimationService::new(&config).unwrap();

    let result = service.estimate("something indescribable").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_estimate_rejects_empty_choices() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "model": "gpt-4o-mini",
            "choices": []
        })))
        .mount(&mock_server)
        .await;

    let config = estimation_config(&mock_server.uri(), Some("test-key"));
    let service = NutritionEstimationService::new(&config).unwrap();

    let result = service.estimate("a salad").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_unconfigured_service_refuses_to_call_out() {
    let config = estimation_config("https://api.openai.com", None);
    let service = NutritionEstimationService::new(&config).unwrap();

    assert!(!service.is_configured());
    let result = service.estimate("anything").await;
    assert!(result.is_err());
}
