use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::ai::types::{ChatResponse, FinishReason, Usage};
use crate::ai::{AiHandler, GenerationParams};
use crate::error::HarperBotError;

/// A recorded AI call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedAiCall {
    pub model: String,
    pub prompt: String,
    pub params: GenerationParams,
}

/// Mock AI handler that returns pre-configured responses in order.
///
/// The last response is repeated once the queue is down to one entry.
/// Records every call for assertions.
pub struct MockAiHandler {
    responses: Mutex<VecDeque<String>>,
    failure: Option<String>,
    recorded_calls: Mutex<Vec<RecordedAiCall>>,
}

impl MockAiHandler {
    /// Create a mock that returns the same response for every call.
    pub fn new(response: impl Into<String>) -> Self {
        Self::with_responses(vec![response.into()])
    }

    /// Create a mock that returns responses in order (one per call).
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            failure: None,
            recorded_calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock whose every call fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            failure: Some(message.to_string()),
            recorded_calls: Mutex::new(Vec::new()),
        }
    }

    /// Get all recorded AI calls for test assertions.
    pub fn get_recorded_calls(&self) -> Vec<RecordedAiCall> {
        self.recorded_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiHandler for MockAiHandler {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<ChatResponse, HarperBotError> {
        self.recorded_calls.lock().unwrap().push(RecordedAiCall {
            model: model.to_string(),
            prompt: prompt.to_string(),
            params,
        });

        if let Some(message) = &self.failure {
            return Err(HarperBotError::Ai(message.clone()));
        }

        let mut responses = self.responses.lock().unwrap();
        let content = if responses.len() > 1 {
            responses.pop_front().unwrap_or_default()
        } else {
            responses.front().cloned().unwrap_or_default()
        };

        Ok(ChatResponse {
            content,
            finish_reason: FinishReason::Stop,
            usage: Some(Usage {
                prompt_tokens: 100,
                completion_tokens: 50,
                total_tokens: 150,
            }),
        })
    }
}
