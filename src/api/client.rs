use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

use super::backend::ModelBackend;
use crate::error::{PaperChatError, Result};
use crate::models::{Message, RequestBody};

/// OpenAI-compatible chat completions backend.
pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl HttpBackend {
    pub fn new(api_key: &str, endpoint: &str, model: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e| {
                PaperChatError::ConfigError(format!("Invalid authorization header: {}", e))
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl ModelBackend for HttpBackend {
    async fn complete(&self, messages: &[Message], tools: Option<&[Value]>) -> Result<Value> {
        let request_body = RequestBody {
            model: self.model.clone(),
            messages: messages.to_vec(),
            stream: false,
            tools: tools.map(|t| t.to_vec()),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PaperChatError::ApiError { status, message });
        }

        let body: Value = response.json().await?;
        Ok(body)
    }
}
