//! Mock Telegram API Server for testing
//!
//! This module provides a mock HTTP server that simulates the Telegram Bot API
//! for testing purposes. It uses wiremock to create configurable mock responses.

use serde_json::{json, Value};
use teloxide::Bot;
use wiremock::{
    matchers::{method, path_regex},
    Mock, MockServer, Request, ResponseTemplate,
};

pub const TEST_BOT_TOKEN: &str = "12345:test_token";

/// Mock Telegram API server for testing
pub struct TelegramMockServer {
    pub server: MockServer,
}

/// Configuration for mock responses
#[derive(Debug, Clone)]
pub struct MockResponseConfig {
    pub success: bool,
    pub delay_ms: Option<u64>,
}

impl Default for MockResponseConfig {
    fn default() -> Self {
        Self {
            success: true,
            delay_ms: None,
        }
    }
}

impl TelegramMockServer {
    /// Create a new mock Telegram API server
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Bot talking to this server instead of api.telegram.org
    pub fn bot(&self) -> Bot {
        let url = url::Url::parse(&self.server.uri()).expect("mock server uri should parse");
        Bot::new(TEST_BOT_TOKEN).set_api_url(url)
    }

    /// Mount a response for one Bot API method
    ///
    /// teloxide spells method names in a different case than the Bot API
    /// docs, so the path is matched case-insensitively.
    pub async fn mock_method(&self, api_method: &str, result: Value, config: MockResponseConfig) {
        let body = if config.success {
            json!({ "ok": true, "result": result })
        } else {
            json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })
        };

        let mut response = ResponseTemplate::new(if config.success { 200 } else { 400 }).set_body_json(body);
        if let Some(delay) = config.delay_ms {
            response = response.set_delay(std::time::Duration::from_millis(delay));
        }

        Mock::given(method("POST"))
            .and(path_regex(format!("(?i)^/bot{}/{}$", TEST_BOT_TOKEN, api_method)))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Setup mock for sendMessage endpoint
    pub async fn mock_send_message(&self, config: MockResponseConfig) {
        self.mock_method("sendMessage", sent_message(json!({ "text": "Test message" })), config)
            .await;
    }

    pub async fn mock_send_location(&self, config: MockResponseConfig) {
        let location = json!({ "location": { "latitude": 55.75, "longitude": 37.61 } });
        self.mock_method("sendLocation", sent_message(location), config).await;
    }

    /// Setup mock for answerCallbackQuery endpoint
    pub async fn mock_answer_callback_query(&self, config: MockResponseConfig) {
        self.mock_method("answerCallbackQuery", json!(true), config).await;
    }

    pub async fn mock_answer_pre_checkout_query(&self, config: MockResponseConfig) {
        self.mock_method("answerPreCheckoutQuery", json!(true), config).await;
    }

    /// Setup all the mocks the messenger uses
    pub async fn setup_default_mocks(&self) {
        self.mock_send_message(MockResponseConfig::default()).await;
        self.mock_send_location(MockResponseConfig::default()).await;
        self.mock_answer_callback_query(MockResponseConfig::default()).await;
        self.mock_answer_pre_checkout_query(MockResponseConfig::default()).await;
    }

    /// Requests received for a Bot API method, oldest first
    pub async fn requests_for(&self, api_method: &str) -> Vec<Request> {
        let suffix = format!("/{}", api_method.to_lowercase());
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path().to_lowercase().ends_with(&suffix))
            .collect()
    }

    /// JSON bodies of the requests received for a Bot API method
    pub async fn bodies_for(&self, api_method: &str) -> Vec<Value> {
        self.requests_for(api_method)
            .await
            .iter()
            .map(|request| serde_json::from_slice(&request.body).expect("request body should be JSON"))
            .collect()
    }
}

/// Message object the bot API returns for a successful send
fn sent_message(content: Value) -> Value {
    let mut message = json!({
        "message_id": 123,
        "from": {
            "id": 12345,
            "is_bot": true,
            "first_name": "TestBot",
            "username": "test_bot"
        },
        "chat": {
            "id": 42,
            "type": "private",
            "first_name": "Test"
        },
        "date": 1640995200
    });

    if let (Some(message), Some(content)) = (message.as_object_mut(), content.as_object()) {
        for (key, value) in content {
            message.insert(key.clone(), value.clone());
        }
    }
    message
}
