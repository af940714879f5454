pub mod analysis;
pub mod gemini;
pub mod types;

use crate::error::HarperBotError;
use async_trait::async_trait;
use types::ChatResponse;

/// Sampling parameters for one generation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl GenerationParams {
    pub fn from_config(config: &crate::config::types::GlobalConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

/// Trait for generative-language API handlers.
///
/// Object-safe for dynamic dispatch via `Arc<dyn AiHandler>`.
#[async_trait]
pub trait AiHandler: Send + Sync {
    /// Send a single-turn user prompt to `model`.
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<ChatResponse, HarperBotError>;
}
