use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use wayfarer_core::PlanningError;
use wayfarer_llm::TextGenerator;
use wayfarer_observability::AppMetrics;

use crate::prompts::quick_answer_request;
use crate::stage::call_bounded;

static PLANNING_CUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:plan|planning|itinerary|schedule|book|organi[sz]e)\b|\b\d{1,3}\s*-?\s*(?:days?|nights?|weeks?)\b",
    )
    .expect("valid planning cue regex")
});

static QUESTION_OPENER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:is|are|was|what|when|where|which|why|how|should|can|could|do|does|will|would)\b",
    )
    .expect("valid question regex")
});

// Anything that asks for a plan or names a trip length goes through the pipeline.
pub fn is_quick_question(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    if lower.is_empty() || PLANNING_CUE.is_match(&lower) {
        return false;
    }
    lower.ends_with('?') || QUESTION_OPENER.is_match(&lower)
}

pub async fn answer_question(
    generator: &dyn TextGenerator,
    question: &str,
    limit: Duration,
    metrics: &AppMetrics,
) -> Result<String, PlanningError> {
    let generation = quick_answer_request(question);
    let answer = call_bounded(generator, &generation, "quick_answer", limit, metrics).await?;

    let answer = answer.trim();
    if answer.is_empty() {
        return Err(PlanningError::Upstream {
            stage: "quick_answer",
            message: "empty answer".to_string(),
        });
    }
    Ok(answer.to_string())
}
