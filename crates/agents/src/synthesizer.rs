use std::time::Duration;

use serde::Deserialize;
use tracing::warn;
use wayfarer_core::{
    assemble_itineraries, DayPlan, ItineraryOption, ItineraryPair, PlanningError, Proposals,
    ResearchNotes, Theme, TripRequest,
};
use wayfarer_llm::{parse_json_reply, TextGenerator};
use wayfarer_observability::AppMetrics;

use crate::prompts::synthesis_request;
use crate::stage::call_bounded;

pub const SCHEDULE_FALLBACK_NOTICE: &str =
    "Detailed day-by-day schedules were unavailable; showing a default schedule.";

#[derive(Debug, Default, Deserialize)]
struct SynthesisReply {
    #[serde(default)]
    budget: Option<OptionDraft>,
    #[serde(default)]
    comfort: Option<OptionDraft>,
}

#[derive(Debug, Default, Deserialize)]
struct OptionDraft {
    #[serde(default)]
    headline: String,
    #[serde(default)]
    days: Vec<DayDraft>,
}

#[derive(Debug, Deserialize)]
struct DayDraft {
    #[serde(default)]
    title: String,
    #[serde(default)]
    morning: String,
    #[serde(default)]
    afternoon: String,
    #[serde(default)]
    evening: String,
}

pub struct Synthesis {
    pub options: ItineraryPair,
    pub notice: Option<String>,
}

pub async fn synthesize(
    generator: &dyn TextGenerator,
    request: &TripRequest,
    notes: &ResearchNotes,
    proposals: &Proposals,
    stage_timeout: Duration,
    metrics: &AppMetrics,
) -> Result<Synthesis, PlanningError> {
    let mut options = assemble_itineraries(request, proposals)?;

    let generation = synthesis_request(request, notes, &options);
    let reply = match call_bounded(generator, &generation, "synthesize", stage_timeout, metrics)
        .await
    {
        Ok(raw) => parse_json_reply::<SynthesisReply>(&raw),
        Err(error) => {
            warn!(error = %error, "schedule generation failed");
            None
        }
    };

    let Some(mut reply) = reply else {
        return Ok(Synthesis {
            options,
            notice: Some(SCHEDULE_FALLBACK_NOTICE.to_string()),
        });
    };

    let mut applied = 0;
    for theme in [Theme::Budget, Theme::Comfort] {
        let draft = match theme {
            Theme::Budget => reply.budget.take(),
            Theme::Comfort => reply.comfort.take(),
        };
        if let Some(draft) = draft {
            if apply_draft(options.get_mut(theme), draft, request.dates.duration_days) {
                applied += 1;
            }
        }
    }

    Ok(Synthesis {
        options,
        notice: (applied < 2).then(|| SCHEDULE_FALLBACK_NOTICE.to_string()),
    })
}

fn apply_draft(option: &mut ItineraryOption, draft: OptionDraft, duration_days: u32) -> bool {
    let headline = draft.headline.trim();
    if !headline.is_empty() {
        option.headline = headline.to_string();
    }

    let complete = draft.days.len() == duration_days as usize
        && draft
            .days
            .iter()
            .all(|day| !day.title.trim().is_empty() && !day.morning.trim().is_empty());
    if !complete {
        return false;
    }

    option.days = draft
        .days
        .into_iter()
        .zip(1..)
        .map(|(day, number)| DayPlan {
            day: number,
            title: day.title.trim().to_string(),
            morning: day.morning.trim().to_string(),
            afternoon: day.afternoon.trim().to_string(),
            evening: day.evening.trim().to_string(),
        })
        .collect();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{barcelona_proposals, weekend_schedule_reply};
    use wayfarer_core::parse_trip_request;
    use wayfarer_llm::ScriptedGenerator;

    fn barcelona() -> TripRequest {
        parse_trip_request("weekend Barcelona getaway, luxury budget").expect("should parse")
    }

    #[tokio::test]
    async fn generated_schedules_replace_defaults() {
        let generator =
            ScriptedGenerator::new().with_reply("synthesizer", weekend_schedule_reply());

        let synthesis = synthesize(
            &generator,
            &barcelona(),
            &ResearchNotes::degraded("Barcelona"),
            &barcelona_proposals(),
            Duration::from_secs(5),
            &AppMetrics::default(),
        )
        .await
        .expect("should synthesize");

        assert!(synthesis.notice.is_none());
        assert_eq!(synthesis.options.budget().headline, "Tapas and Gaudi on a shoestring");
        assert_eq!(synthesis.options.comfort().days.len(), 2);
        assert_eq!(synthesis.options.comfort().days[1].day, 2);
    }

    #[tokio::test]
    async fn wrong_day_count_keeps_default_schedule() {
        let generator = ScriptedGenerator::new().with_reply(
            "synthesizer",
            r#"{"budget": {"headline": "Short", "days": [{"title": "Only one", "morning": "Walk"}]}}"#,
        );

        let synthesis = synthesize(
            &generator,
            &barcelona(),
            &ResearchNotes::degraded("Barcelona"),
            &barcelona_proposals(),
            Duration::from_secs(5),
            &AppMetrics::default(),
        )
        .await
        .expect("should synthesize");

        assert_eq!(synthesis.notice.as_deref(), Some(SCHEDULE_FALLBACK_NOTICE));
        assert_eq!(synthesis.options.budget().headline, "Short");
        assert_eq!(synthesis.options.budget().days[0].title, "Arrival in Barcelona");
    }

    #[tokio::test]
    async fn generator_failure_still_yields_two_options() {
        let generator = ScriptedGenerator::new().with_failure("synthesizer", "overloaded");

        let synthesis = synthesize(
            &generator,
            &barcelona(),
            &ResearchNotes::degraded("Barcelona"),
            &barcelona_proposals(),
            Duration::from_secs(5),
            &AppMetrics::default(),
        )
        .await
        .expect("should synthesize");

        assert_eq!(synthesis.options.themes(), [Theme::Budget, Theme::Comfort]);
        assert!(synthesis.notice.is_some());
    }
}
