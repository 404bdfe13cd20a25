//! Mock Telegram API Server for testing
//!
//! This module provides a mock HTTP server that simulates the parts of the
//! Telegram Bot API used during startup. It uses wiremock to create
//! configurable mock responses.

use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path_regex},
    Mock, MockServer, ResponseTemplate,
};

/// Mock Telegram API server for testing
pub struct TelegramMockServer {
    pub server: MockServer,
}

/// Configuration for mock responses
#[derive(Debug, Clone)]
pub struct MockResponseConfig {
    pub success: bool,
    pub delay_ms: Option<u64>,
    pub custom_response: Option<Value>,
}

impl Default for MockResponseConfig {
    fn default() -> Self {
        Self {
            success: true,
            delay_ms: None,
            custom_response: None,
        }
    }
}

impl TelegramMockServer {
    /// Create a new mock Telegram API server
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Value for `bot.api_url`
    pub fn api_url(&self) -> String {
        self.server.uri()
    }

    /// Setup mock for the getMe endpoint
    pub async fn mock_get_me(&self, config: MockResponseConfig) {
        let body = json!({
            "ok": true,
            "result": {
                "id": 12345,
                "is_bot": true,
                "first_name": "MiniBot",
                "username": "minibot_test",
                "can_join_groups": true,
                "can_read_all_group_messages": false,
                "supports_inline_queries": false,
                "can_connect_to_business": false,
                "has_main_web_app": false
            }
        });
        self.mount("getme", body, config).await;
    }

    /// Setup mock for the deleteWebhook endpoint
    pub async fn mock_delete_webhook(&self, config: MockResponseConfig) {
        self.mount("deletewebhook", json!({ "ok": true, "result": true }), config).await;
    }

    /// Setup all mocks needed for a successful connect
    pub async fn setup_default_mocks(&self) {
        self.mock_get_me(MockResponseConfig::default()).await;
        self.mock_delete_webhook(MockResponseConfig::default()).await;
    }

    /// Number of requests received for a Bot API method
    pub async fn request_count(&self, api_method: &str) -> usize {
        let suffix = format!("/{}", api_method.to_lowercase());
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path().to_lowercase().ends_with(&suffix))
            .count()
    }

    async fn mount(&self, api_method: &str, success_body: Value, config: MockResponseConfig) {
        let (status, body) = match config.custom_response {
            Some(body) => (if config.success { 200 } else { 401 }, body),
            None if config.success => (200, success_body),
            None => (
                401,
                json!({
                    "ok": false,
                    "error_code": 401,
                    "description": "Unauthorized"
                }),
            ),
        };

        let mut response = ResponseTemplate::new(status).set_body_json(body);
        if let Some(delay) = config.delay_ms {
            response = response.set_delay(std::time::Duration::from_millis(delay));
        }

        // Bot API method names are case-insensitive
        Mock::given(method("POST"))
            .and(path_regex(format!(r"(?i)^/bot[^/]+/{}$", api_method)))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }
}
