use std::time::Duration;

use wayfarer_core::PlanningError;
use wayfarer_llm::{GenerationRequest, TextGenerator};
use wayfarer_observability::AppMetrics;

pub(crate) async fn generate(
    generator: &dyn TextGenerator,
    request: &GenerationRequest,
    stage: &'static str,
    metrics: &AppMetrics,
) -> Result<String, PlanningError> {
    metrics.inc_generation_call();
    generator
        .generate(request)
        .await
        .map_err(|error| PlanningError::Upstream {
            stage,
            message: error.to_string(),
        })
}

pub(crate) async fn call_bounded(
    generator: &dyn TextGenerator,
    request: &GenerationRequest,
    stage: &'static str,
    limit: Duration,
    metrics: &AppMetrics,
) -> Result<String, PlanningError> {
    match tokio::time::timeout(limit, generate(generator, request, stage, metrics)).await {
        Ok(result) => result,
        Err(_) => Err(PlanningError::UpstreamTimeout {
            stage,
            after: limit,
        }),
    }
}
