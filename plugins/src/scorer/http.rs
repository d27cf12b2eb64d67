use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use sshprobe_core::api::{
    CandidateCommand, LlmEndpointConfig, RiskAssessment, RiskAssessmentError, RiskScorer,
};

use crate::llm::ChatClient;

const SYSTEM_PROMPT: &str = "You assess how risky a shell command is to run on a production host. \
Answer with a single JSON object: {\"score\": number between 0 and 1, \"reasoning\": string, \"concerns\": [string]}. \
0 means read-only and harmless, 1 means destructive or privilege-changing.";

#[derive(Deserialize)]
struct RawAssessment {
    score: f32,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    concerns: Vec<String>,
}

/// Risk scorer backed by an OpenAI-compatible chat endpoint.
pub struct HttpScorer {
    client: ChatClient,
}

impl HttpScorer {
    pub fn new(cfg: &LlmEndpointConfig) -> Result<Self> {
        Ok(Self {
            client: ChatClient::new(cfg)?,
        })
    }
}

fn user_prompt(candidate: &CandidateCommand) -> String {
    format!(
        "Command: {}\nPurpose: {}\nCategory: {}\nDeclared risk: {}\n",
        candidate.command, candidate.purpose, candidate.category, candidate.risk_level
    )
}

/// First `{` to last `}`; models like to wrap JSON in prose or fences.
fn parse_assessment(raw: &str) -> Result<RiskAssessment, RiskAssessmentError> {
    let start = raw.find('{');
    let end = raw.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if e > s => &raw[s..=e],
        _ => {
            return Err(RiskAssessmentError::Malformed(
                "no JSON object in response".into(),
            ))
        }
    };
    let parsed: RawAssessment = serde_json::from_str(json)
        .map_err(|e| RiskAssessmentError::Malformed(e.to_string()))?;
    Ok(RiskAssessment {
        score: parsed.score,
        reasoning: parsed.reasoning,
        concerns: parsed.concerns,
    })
}

#[async_trait]
impl RiskScorer for HttpScorer {
    fn name(&self) -> &str {
        "http"
    }

    async fn assess(
        &self,
        candidate: &CandidateCommand,
    ) -> Result<RiskAssessment, RiskAssessmentError> {
        let raw = self
            .client
            .complete(SYSTEM_PROMPT, &user_prompt(candidate))
            .await
            .map_err(RiskAssessmentError::Transport)?;
        let assessment = parse_assessment(&raw)?;
        tracing::debug!(
            target: "sshprobe.llm",
            command = %candidate.command,
            score = assessment.score,
            "risk assessed"
        );
        Ok(assessment)
    }
}
