//! Extraction capability
//!
//! The language model is reached through a narrow request/response
//! contract: text or page images in, raw JSON text out.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Value};

use super::prompt::{
    text_prompt, vision_response_format, TEXT_SYSTEM_PROMPT, VISION_INSTRUCTIONS,
    VISION_SYSTEM_PROMPT,
};
use super::types::ExtractionError;

/// Model backend used by the field extractor
#[async_trait]
pub trait ExtractionCapability: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Ask for `{"pessoas": [...]}` from document text; returns the raw reply
    async fn extract_from_text(
        &self,
        api_key: &str,
        document_text: &str,
    ) -> Result<String, ExtractionError>;

    /// Ask for `{"documentos": [...]}` from JPEG page images; returns the raw reply
    async fn extract_from_images(
        &self,
        api_key: &str,
        jpeg_pages: &[Vec<u8>],
    ) -> Result<String, ExtractionError>;
}

/// OpenAI settings
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub text_model: String,
    pub vision_model: String,
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            text_model: "gpt-4o-mini".to_string(),
            vision_model: "gpt-4o-2024-08-06".to_string(),
            timeout_secs: 120,
        }
    }
}

/// OpenAI-compatible chat completions backend
pub struct OpenAiCapability {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiCapability {
    pub fn new(config: OpenAiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client, config }
    }

    fn text_request(&self, document_text: &str) -> Value {
        json!({
            "model": self.config.text_model,
            "temperature": 0,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": TEXT_SYSTEM_PROMPT },
                { "role": "user", "content": text_prompt(document_text) }
            ]
        })
    }

    fn vision_request(&self, jpeg_pages: &[Vec<u8>]) -> Value {
        let mut content = vec![json!({ "type": "text", "text": VISION_INSTRUCTIONS })];
        content.extend(jpeg_pages.iter().map(|page| {
            json!({
                "type": "image_url",
                "image_url": { "url": jpeg_data_uri(page) }
            })
        }));

        json!({
            "model": self.config.vision_model,
            "temperature": 0,
            "response_format": vision_response_format(),
            "messages": [
                { "role": "system", "content": VISION_SYSTEM_PROMPT },
                { "role": "user", "content": content }
            ]
        })
    }

    async fn complete(&self, api_key: &str, request: Value) -> Result<String, ExtractionError> {
        if api_key.trim().is_empty() {
            return Err(ExtractionError::MissingCredential);
        }

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key.trim())
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractionError::Capability(format!("Failed to call OpenAI: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Capability(format!(
                "OpenAI returned {}: {}",
                status, body
            )));
        }

        let result: Value = response
            .json()
            .await
            .map_err(|e| ExtractionError::Capability(format!("Failed to read response: {}", e)))?;

        message_content(&result)
    }
}

#[async_trait]
impl ExtractionCapability for OpenAiCapability {
    fn name(&self) -> &str {
        "openai"
    }

    async fn extract_from_text(
        &self,
        api_key: &str,
        document_text: &str,
    ) -> Result<String, ExtractionError> {
        tracing::debug!(
            model = %self.config.text_model,
            chars = document_text.chars().count(),
            "Requesting text extraction"
        );
        self.complete(api_key, self.text_request(document_text))
            .await
    }

    async fn extract_from_images(
        &self,
        api_key: &str,
        jpeg_pages: &[Vec<u8>],
    ) -> Result<String, ExtractionError> {
        tracing::debug!(
            model = %self.config.vision_model,
            pages = jpeg_pages.len(),
            "Requesting vision extraction"
        );
        self.complete(api_key, self.vision_request(jpeg_pages))
            .await
    }
}

/// `data:image/jpeg;base64,...`
pub fn jpeg_data_uri(jpeg: &[u8]) -> String {
    format!(
        "data:image/jpeg;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(jpeg)
    )
}

/// Pull `choices[0].message.content` out of a chat completion
fn message_content(completion: &Value) -> Result<String, ExtractionError> {
    if let Some(refusal) = completion["choices"][0]["message"]["refusal"].as_str() {
        return Err(ExtractionError::Capability(format!(
            "Model refused the request: {}",
            refusal
        )));
    }

    completion["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            ExtractionError::MalformedResponse("completion has no message content".to_string())
        })
}
