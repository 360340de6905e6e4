use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::config::TranslateConfig;
use crate::error::{Result, SubsError};
use super::{ModelClient, Prompt};

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ChatOptions>,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Chat client for a local Ollama server
pub struct OllamaClient {
    client: Client,
    endpoint: String,
    model: String,
    temperature: Option<f32>,
}

impl OllamaClient {
    pub fn new(config: &TranslateConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Check that Ollama is reachable and the model has been pulled
    pub async fn check_availability(&self) -> Result<()> {
        let url = format!("{}/api/show", self.endpoint);

        let response = self.client
            .post(&url)
            .json(&json!({ "name": self.model }))
            .send()
            .await
            .map_err(|e| SubsError::ModelInvocation(format!("Failed to connect to Ollama: {}", e)))?;

        if response.status().is_success() {
            info!("Ollama model '{}' is available", self.model);
            Ok(())
        } else {
            Err(SubsError::ModelInvocation(format!(
                "Ollama model '{}' not found. Please pull the model first: ollama pull {}",
                self.model, self.model
            )))
        }
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: &prompt.system },
                ChatMessage { role: "user", content: &prompt.user },
            ],
            stream: false,
            options: self.temperature.map(|temperature| ChatOptions { temperature }),
        };

        let url = format!("{}/api/chat", self.endpoint);
        debug!("Sending chat request to: {}", url);

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SubsError::ModelInvocation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SubsError::ModelInvocation(format!(
                "Ollama API error {}: {}", status, error_text
            )));
        }

        let chat_response: ChatResponse = response.json().await
            .map_err(|e| SubsError::ModelInvocation(format!("Failed to parse response: {}", e)))?;

        debug!("Raw Ollama response: {}", chat_response.message.content);

        Ok(chat_response.message.content)
    }
}
