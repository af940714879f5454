use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::types::{ChatResponse, FinishReason, Usage};
use super::{AiHandler, GenerationParams};
use crate::config::loader::get_settings;
use crate::error::HarperBotError;

const HARM_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Gemini `generateContent` handler.
pub struct GeminiHandler {
    client: Client,
    api_base: String,
    api_key: String,
}

impl GeminiHandler {
    /// Create a new handler from the current settings.
    pub fn from_settings() -> Result<Self, HarperBotError> {
        let settings = get_settings();
        if settings.gemini.key.is_empty() {
            return Err(HarperBotError::Ai(
                "no Gemini API key configured (set GEMINI_API_KEY or gemini.key)".into(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.config.http_timeout))
            .build()
            .map_err(HarperBotError::Http)?;

        Ok(Self {
            client,
            api_base: settings.gemini.api_base.clone(),
            api_key: settings.gemini.key.clone(),
        })
    }

    /// Build the request body for `models/{model}:generateContent`.
    fn build_request_body(prompt: &str, params: GenerationParams) -> serde_json::Value {
        let safety_settings: Vec<_> = HARM_CATEGORIES
            .iter()
            .map(|category| json!({"category": category, "threshold": "BLOCK_NONE"}))
            .collect();

        json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": {
                "temperature": params.temperature,
                "topP": params.top_p,
                "topK": params.top_k,
                "maxOutputTokens": params.max_output_tokens,
            },
            "safetySettings": safety_settings,
        })
    }
}

#[async_trait]
impl AiHandler for GeminiHandler {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<ChatResponse, HarperBotError> {
        let url = format!(
            "{}/models/{model}:generateContent",
            self.api_base.trim_end_matches('/')
        );
        let body = Self::build_request_body(prompt, params);

        tracing::debug!(model, prompt_chars = prompt.len(), "sending generateContent request");
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(HarperBotError::Http)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body_text = resp.text().await.unwrap_or_default();
            return Err(HarperBotError::Ai(format!(
                "API returned {status}: {body_text}"
            )));
        }

        let api_resp: ApiResponse = resp.json().await.map_err(HarperBotError::Http)?;
        Ok(api_resp.into_chat_response())
    }
}

// ── API response types ─────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
    usage_metadata: Option<ApiUsage>,
    prompt_feedback: Option<ApiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCandidate {
    content: Option<ApiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiContent {
    #[serde(default)]
    parts: Vec<ApiPart>,
}

#[derive(Debug, Deserialize)]
struct ApiPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

impl ApiResponse {
    fn into_chat_response(self) -> ChatResponse {
        let usage = self.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        let Some(candidate) = self.candidates.into_iter().next() else {
            // A blocked prompt comes back with no candidates at all
            let finish_reason = match self.prompt_feedback.and_then(|f| f.block_reason) {
                Some(_) => FinishReason::Safety,
                None => FinishReason::Unknown,
            };
            return ChatResponse {
                content: String::new(),
                finish_reason,
                usage,
            };
        };

        let content = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        ChatResponse {
            content,
            finish_reason: candidate
                .finish_reason
                .as_deref()
                .map(FinishReason::from)
                .unwrap_or_default(),
            usage,
        }
    }
}
