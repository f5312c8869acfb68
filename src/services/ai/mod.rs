pub mod extract;
pub mod groq;
pub mod ollama;

use async_trait::async_trait;

/// A chat-completion backend used for entity extraction. One-shot: the
/// state machine owns the dialogue, so no history is sent.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> anyhow::Result<String>;
}
