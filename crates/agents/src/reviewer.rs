use std::time::Duration;

use serde::Deserialize;
use wayfarer_core::{ItineraryPair, PlanningError, Review, Theme, TripRequest};
use wayfarer_llm::{parse_json_reply, TextGenerator};
use wayfarer_observability::AppMetrics;

use crate::prompts::review_request;
use crate::stage::call_bounded;

#[derive(Debug, Deserialize)]
struct ReviewReply {
    score: f64,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    improvements: Vec<String>,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    adjustments: Adjustments,
}

#[derive(Debug, Default, Deserialize)]
struct Adjustments {
    #[serde(default)]
    budget: Vec<String>,
    #[serde(default)]
    comfort: Vec<String>,
}

pub struct ReviewOutcome {
    pub review: Review,
    adjustments: Adjustments,
}

impl ReviewOutcome {
    pub fn apply_to(self, options: &mut ItineraryPair) -> Review {
        let Adjustments { budget, comfort } = self.adjustments;
        for (theme, notes) in [(Theme::Budget, budget), (Theme::Comfort, comfort)] {
            options.get_mut(theme).review_adjustments.extend(
                notes
                    .into_iter()
                    .map(|note| note.trim().to_string())
                    .filter(|note| !note.is_empty()),
            );
        }
        self.review
    }
}

pub async fn review(
    generator: &dyn TextGenerator,
    request: &TripRequest,
    options: &ItineraryPair,
    stage_timeout: Duration,
    metrics: &AppMetrics,
) -> Result<ReviewOutcome, PlanningError> {
    let generation = review_request(request, options);
    let raw = call_bounded(generator, &generation, "review", stage_timeout, metrics).await?;

    let reply = parse_json_reply::<ReviewReply>(&raw).ok_or_else(|| PlanningError::Upstream {
        stage: "review",
        message: "review reply was not valid JSON".to_string(),
    })?;

    let score = if reply.score.is_finite() {
        reply.score.round().clamp(1.0, 10.0) as u8
    } else {
        1
    };

    Ok(ReviewOutcome {
        review: Review {
            score,
            strengths: clean(reply.strengths),
            improvements: clean(reply.improvements),
            summary: reply.summary.trim().to_string(),
        },
        adjustments: reply.adjustments,
    })
}

fn clean(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
