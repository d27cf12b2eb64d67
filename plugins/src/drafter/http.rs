use anyhow::Result;
use async_trait::async_trait;
use sshprobe_core::api::{Drafter, GenerationError, LlmEndpointConfig};

use crate::llm::ChatClient;

const SYSTEM_PROMPT: &str = "You are a careful Unix and Windows operator. \
You only suggest read-only diagnostic commands and you answer with JSON only.";

/// Drafts extra candidates through an OpenAI-compatible chat endpoint.
pub struct HttpDrafter {
    client: ChatClient,
}

impl HttpDrafter {
    pub fn new(cfg: &LlmEndpointConfig) -> Result<Self> {
        Ok(Self {
            client: ChatClient::new(cfg)?,
        })
    }
}

#[async_trait]
impl Drafter for HttpDrafter {
    fn name(&self) -> &str {
        "http"
    }

    async fn draft(&self, prompt: &str) -> Result<String, GenerationError> {
        tracing::debug!(
            target: "sshprobe.llm",
            model = %self.client.model(),
            prompt_len = prompt.len(),
            "drafting candidates"
        );
        self.client
            .complete(SYSTEM_PROMPT, prompt)
            .await
            .map_err(GenerationError::Transport)
    }
}
