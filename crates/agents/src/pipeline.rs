use std::sync::Arc;

use tracing::{info, instrument, warn};
use wayfarer_core::{parse_trip_request, FinalReport, PlanningError, ResearchNotes};
use wayfarer_llm::TextGenerator;
use wayfarer_observability::AppMetrics;

use crate::config::PipelineConfig;
use crate::events::{ProgressSink, Stage, StagePhase};
use crate::inquiry::answer_question;
use crate::planners::fan_out;
use crate::research::research;
use crate::reviewer::review;
use crate::synthesizer::synthesize;

#[derive(Clone)]
pub struct TripPlanner {
    generator: Arc<dyn TextGenerator>,
    config: PipelineConfig,
    metrics: Arc<AppMetrics>,
}

impl TripPlanner {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        config: PipelineConfig,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            generator,
            config,
            metrics,
        }
    }

    pub fn config(&self) -> PipelineConfig {
        self.config
    }

    pub fn generator_name(&self) -> &'static str {
        self.generator.name()
    }

    #[instrument(skip(self, text, progress), fields(generator = self.generator.name()))]
    pub async fn plan(
        &self,
        text: &str,
        progress: &ProgressSink,
    ) -> Result<FinalReport, PlanningError> {
        let generator = self.generator.as_ref();
        let mut notices = Vec::new();

        progress.emit(Stage::Parse, StagePhase::Started, None);
        let request = match parse_trip_request(text) {
            Ok(request) => request,
            Err(error) => {
                self.metrics.inc_parse_failure();
                progress.emit(Stage::Parse, StagePhase::Failed, Some(error.to_string()));
                return Err(error);
            }
        };
        progress.emit(
            Stage::Parse,
            StagePhase::Finished,
            Some(request.destination.clone()),
        );

        progress.emit(Stage::Research, StagePhase::Started, None);
        let notes = match research(generator, &request, self.config.stage_timeout, &self.metrics)
            .await
        {
            Ok(notes) => {
                progress.emit(Stage::Research, StagePhase::Finished, None);
                notes
            }
            Err(error) => {
                self.degrade(Stage::Research, &error, progress);
                notices.push(format!(
                    "Background research for {} is unavailable.",
                    request.destination
                ));
                ResearchNotes::degraded(&request.destination)
            }
        };

        let proposals = fan_out(
            Arc::clone(&self.generator),
            &request,
            &notes,
            self.config.branch_timeout,
            Arc::clone(&self.metrics),
            progress,
        )
        .await;
        notices.extend(proposals.degraded_notices());

        progress.emit(Stage::Synthesize, StagePhase::Started, None);
        let synthesis = match synthesize(
            generator,
            &request,
            &notes,
            &proposals,
            self.config.stage_timeout,
            &self.metrics,
        )
        .await
        {
            Ok(synthesis) => synthesis,
            Err(error) => {
                self.metrics.inc_synthesis_failure();
                progress.emit(Stage::Synthesize, StagePhase::Failed, Some(error.to_string()));
                return Err(error);
            }
        };
        let mut options = synthesis.options;
        match synthesis.notice {
            Some(notice) => {
                self.metrics.inc_degraded_stage();
                progress.emit(Stage::Synthesize, StagePhase::Degraded, Some(notice.clone()));
                notices.push(notice);
            }
            None => progress.emit(Stage::Synthesize, StagePhase::Finished, None),
        }

        progress.emit(Stage::Review, StagePhase::Started, None);
        let review = match review(
            generator,
            &request,
            &options,
            self.config.stage_timeout,
            &self.metrics,
        )
        .await
        {
            Ok(outcome) => {
                let review = outcome.apply_to(&mut options);
                progress.emit(
                    Stage::Review,
                    StagePhase::Finished,
                    Some(format!("score {}/10", review.score)),
                );
                Some(review)
            }
            Err(error) => {
                self.degrade(Stage::Review, &error, progress);
                notices.push("The itineraries could not be reviewed.".to_string());
                None
            }
        };

        self.metrics.inc_plan_completed();
        info!(
            destination = %request.destination,
            duration_days = request.dates.duration_days,
            notices = notices.len(),
            reviewed = review.is_some(),
            "plan completed"
        );

        Ok(FinalReport {
            request,
            research: notes,
            proposals,
            options,
            review,
            notices,
        })
    }

    #[instrument(skip(self, question, progress), fields(generator = self.generator.name()))]
    pub async fn answer(
        &self,
        question: &str,
        progress: &ProgressSink,
    ) -> Result<String, PlanningError> {
        progress.emit(Stage::Answer, StagePhase::Started, None);
        match answer_question(
            self.generator.as_ref(),
            question,
            self.config.stage_timeout,
            &self.metrics,
        )
        .await
        {
            Ok(answer) => {
                self.metrics.inc_quick_answer();
                progress.emit(Stage::Answer, StagePhase::Finished, None);
                Ok(answer)
            }
            Err(error) => {
                self.degrade(Stage::Answer, &error, progress);
                Err(error)
            }
        }
    }

    fn degrade(&self, stage: Stage, error: &PlanningError, progress: &ProgressSink) {
        self.metrics.inc_degraded_stage();
        warn!(stage = stage.as_str(), error = %error, "stage degraded");
        progress.emit(stage, StagePhase::Degraded, Some(error.to_string()));
    }
}
