use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AppConfig;
use crate::detect::dto::Detection;
use crate::qa::heuristic::fmt_num;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const LLM_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Gemini `generateContent` REST endpoint. Only constructed
/// when an API key is configured.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Option<Self>> {
        let Some(api_key) = config.gemini_api_key.clone() else {
            return Ok(None);
        };
        let client = reqwest::Client::builder().timeout(LLM_TIMEOUT).build()?;
        Ok(Some(Self {
            client,
            api_key,
            model: config.gemini_model.clone(),
        }))
    }

    /// Ask the model the user's question with the detections as context.
    /// Returns the first candidate's text verbatim.
    pub async fn ask(&self, question: &str, detections: &[Detection]) -> anyhow::Result<String> {
        let prompt = build_prompt(question, detections);
        let url = format!("{GEMINI_BASE_URL}/{}:generateContent", self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateRequest {
                contents: vec![RequestContent {
                    parts: vec![RequestPart { text: prompt }],
                }],
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("LLM API error: {status}");
        }

        let body: GenerateResponse = response.json().await?;
        let text: String = body
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            anyhow::bail!("LLM returned an empty response");
        }
        debug!(chars = text.len(), "llm answer received");
        Ok(text)
    }
}

fn build_prompt(question: &str, detections: &[Detection]) -> String {
    format!(
        "You are an AI assistant for an object detection system. You have access to the \
         following detected objects in an image:\n\n{}\n\nUser question: {question}\n\nPlease \
         provide a helpful, accurate, and concise answer based on the detected objects. If the \
         question cannot be answered with the available information, politely explain what \
         information is available.",
        build_context(detections)
    )
}

/// Numbered context block, one line per detection.
fn build_context(detections: &[Detection]) -> String {
    if detections.is_empty() {
        return "No objects detected in the image.".to_string();
    }
    detections
        .iter()
        .enumerate()
        .map(|(i, d)| {
            format!(
                "{}. {} (confidence: {:.1}%, location: x={}, y={}, width={}, height={})",
                i + 1,
                d.label,
                d.score * 100.0,
                fmt_num(d.bbox.x),
                fmt_num(d.bbox.y),
                fmt_num(d.bbox.width),
                fmt_num(d.bbox.height)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
