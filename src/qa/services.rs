use tracing::warn;

use crate::detect::dto::Detection;
use crate::qa::{heuristic, llm::GeminiClient};

/// Answer a question about a detection list. Tries the LLM when one is
/// configured; any failure falls through to the heuristic responder, never
/// to an error.
pub async fn answer(
    question: &str,
    detections: &[Detection],
    llm: Option<&GeminiClient>,
) -> String {
    if let Some(client) = llm {
        match client.ask(question, detections).await {
            Ok(text) => return text,
            Err(e) => {
                warn!(error = %e, "LLM call failed, falling back to heuristic responder");
            }
        }
    }
    heuristic::answer(question, detections)
}
