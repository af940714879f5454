pub mod apply;
pub mod improvement;
pub mod review;

use std::sync::Arc;

use crate::ai::AiHandler;
use crate::ai::gemini::GeminiHandler;
use crate::error::HarperBotError;

/// Resolve the AI handler: use the injected one or create from settings.
pub fn resolve_ai_handler(
    injected: &Option<Arc<dyn AiHandler>>,
) -> Result<Arc<dyn AiHandler>, HarperBotError> {
    match injected {
        Some(ai) => Ok(ai.clone()),
        None => Ok(Arc::new(GeminiHandler::from_settings()?)),
    }
}
