pub mod gemini;

use async_trait::async_trait;

use crate::state::Turn;

pub use gemini::{GeminiClient, GenerateError};

/// Anything that can turn a conversation history into the next reply.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, credential: &str, history: &[Turn]) -> Result<String, GenerateError>;
}
