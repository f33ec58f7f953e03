use std::time::Duration;

use serde::Deserialize;
use wayfarer_core::{PlanningError, ResearchNotes, TripRequest};
use wayfarer_llm::{parse_json_reply, TextGenerator};
use wayfarer_observability::AppMetrics;

use crate::prompts::research_request;
use crate::stage::call_bounded;

const MAX_TIPS: usize = 8;

#[derive(Debug, Deserialize)]
struct ResearchReply {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    best_time_to_visit: String,
    #[serde(default)]
    tips: Vec<String>,
}

pub async fn research(
    generator: &dyn TextGenerator,
    request: &TripRequest,
    stage_timeout: Duration,
    metrics: &AppMetrics,
) -> Result<ResearchNotes, PlanningError> {
    let generation = research_request(request);
    let raw = call_bounded(generator, &generation, "research", stage_timeout, metrics).await?;

    let notes = match parse_json_reply::<ResearchReply>(&raw) {
        Some(reply) => ResearchNotes {
            summary: reply.summary.trim().to_string(),
            best_time_to_visit: reply.best_time_to_visit.trim().to_string(),
            tips: reply
                .tips
                .into_iter()
                .map(|tip| tip.trim().to_string())
                .filter(|tip| !tip.is_empty())
                .take(MAX_TIPS)
                .collect(),
            degraded: false,
        },
        None => ResearchNotes {
            summary: raw.trim().to_string(),
            best_time_to_visit: String::new(),
            tips: Vec::new(),
            degraded: false,
        },
    };

    if notes.summary.is_empty() {
        return Err(PlanningError::Upstream {
            stage: "research",
            message: "empty research summary".to_string(),
        });
    }

    Ok(notes)
}
