pub mod config;
pub mod events;
pub mod inquiry;
pub mod pipeline;
pub mod planners;
pub mod prompts;
pub mod research;
pub mod reviewer;
pub mod synthesizer;

mod stage;
#[cfg(test)]
mod test_support;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::{Duration, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use wayfarer_core::{
    normalize_text, render_failure, render_report, ChatFailure, ChatInput, ChatReply,
    ConversationSession, ConversationTurn, FinalReport,
};
use wayfarer_observability::AppMetrics;
use wayfarer_storage::SessionRepository;

pub use config::PipelineConfig;
pub use events::{PipelineEvent, ProgressSink, Stage, StagePhase};
pub use inquiry::is_quick_question;
pub use pipeline::TripPlanner;

const SESSION_TTL_HOURS: i64 = 24;
const MAX_SESSION_TURNS: usize = 40;

#[derive(Clone)]
pub struct ConciergeAgent<S>
where
    S: SessionRepository,
{
    planner: TripPlanner,
    store: Arc<S>,
    metrics: Arc<AppMetrics>,
}

impl<S> ConciergeAgent<S>
where
    S: SessionRepository,
{
    pub fn new(planner: TripPlanner, store: Arc<S>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            planner,
            store,
            metrics,
        }
    }

    pub fn planner(&self) -> &TripPlanner {
        &self.planner
    }

    pub async fn handle_chat(&self, input: ChatInput) -> Result<ChatReply> {
        self.handle_chat_with_progress(input, &ProgressSink::disabled())
            .await
    }

    #[instrument(skip(self, input, progress))]
    pub async fn handle_chat_with_progress(
        &self,
        input: ChatInput,
        progress: &ProgressSink,
    ) -> Result<ChatReply> {
        let started = Instant::now();
        self.metrics.inc_request();

        let normalized = normalize_text(&input.text);
        let session_id = input
            .session_id
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let answer = if is_quick_question(&normalized) {
            match self.planner.answer(&normalized, progress).await {
                Ok(answer) => Some(answer),
                Err(error) => {
                    warn!(error = %error, "quick answer unavailable, planning instead");
                    None
                }
            }
        } else {
            None
        };

        let (reply_text, report, failure) = match answer {
            Some(answer) => (answer, None, None),
            None => match self.planner.plan(&normalized, progress).await {
                Ok(report) => (render_report(&report), Some(report), None),
                Err(error) => (
                    render_failure(&error),
                    None,
                    Some(ChatFailure {
                        kind: error.kind().to_string(),
                        message: error.to_string(),
                    }),
                ),
            },
        };

        self.persist_turn(&session_id, &normalized, &reply_text, report.as_ref())
            .await?;

        self.metrics.observe_latency(started.elapsed());
        info!(
            session_id = %session_id,
            planned = report.is_some(),
            failure = failure.as_ref().map(|failure| failure.kind.as_str()).unwrap_or("none"),
            "chat handled"
        );

        Ok(ChatReply {
            session_id,
            reply_text,
            report,
            failure,
        })
    }

    pub async fn load_session(&self, session_id: &str) -> Result<Option<ConversationSession>> {
        let session = self.store.load_session(session_id).await?;
        Ok(session.filter(|session| session.expires_at > Utc::now()))
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64> {
        self.store.purge_expired(Utc::now()).await
    }

    async fn persist_turn(
        &self,
        session_id: &str,
        user_text: &str,
        assistant_text: &str,
        report: Option<&FinalReport>,
    ) -> Result<()> {
        let now = Utc::now();
        let mut session = self
            .store
            .load_session(session_id)
            .await?
            .unwrap_or_else(|| ConversationSession {
                session_id: session_id.to_string(),
                expires_at: now + Duration::hours(SESSION_TTL_HOURS),
                turns: Vec::new(),
            });

        session.expires_at = now + Duration::hours(SESSION_TTL_HOURS);
        session.turns.push(ConversationTurn {
            at: now,
            user_text: user_text.to_string(),
            assistant_text: assistant_text.to_string(),
            report: report.cloned(),
        });

        if session.turns.len() > MAX_SESSION_TURNS {
            let keep_from = session.turns.len() - MAX_SESSION_TURNS;
            session.turns = session.turns.split_off(keep_from);
        }

        self.store.upsert_session(&session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{tokyo_generator, TOKYO_REQUEST};
    use wayfarer_llm::ScriptedGenerator;
    use wayfarer_storage::Store;

    fn agent() -> ConciergeAgent<Store> {
        agent_with(Arc::new(tokyo_generator()))
    }

    fn agent_with(generator: Arc<ScriptedGenerator>) -> ConciergeAgent<Store> {
        let metrics = AppMetrics::shared();
        let planner = TripPlanner::new(generator, PipelineConfig::default(), Arc::clone(&metrics));
        ConciergeAgent::new(planner, Arc::new(Store::memory()), metrics)
    }

    #[tokio::test]
    async fn chat_plans_and_records_turns() {
        let agent = agent();
        let reply = agent
            .handle_chat(ChatInput {
                session_id: None,
                text: TOKYO_REQUEST.to_string(),
            })
            .await
            .expect("chat should succeed");

        assert!(reply.failure.is_none());
        assert!(reply.reply_text.contains("Tokyo"));
        assert!(reply.report.is_some());

        let followup = agent
            .handle_chat(ChatInput {
                session_id: Some(reply.session_id.clone()),
                text: "plan something fun".to_string(),
            })
            .await
            .expect("chat should succeed");
        assert_eq!(followup.session_id, reply.session_id);
        assert_eq!(
            followup.failure.as_ref().map(|failure| failure.kind.as_str()),
            Some("parse_error")
        );

        let session = agent
            .load_session(&reply.session_id)
            .await
            .expect("load should succeed")
            .expect("session should exist");
        assert_eq!(session.turns.len(), 2);
        assert!(session.turns[0].report.is_some());
        assert!(session.turns[1].report.is_none());
    }

    #[tokio::test]
    async fn session_history_is_capped() {
        let agent = agent();
        let session_id = "capped".to_string();
        for _ in 0..(MAX_SESSION_TURNS + 2) {
            agent
                .handle_chat(ChatInput {
                    session_id: Some(session_id.clone()),
                    text: "plan something fun".to_string(),
                })
                .await
                .expect("chat should succeed");
        }

        let session = agent
            .load_session(&session_id)
            .await
            .expect("load should succeed")
            .expect("session should exist");
        assert_eq!(session.turns.len(), MAX_SESSION_TURNS);
    }

    #[tokio::test]
    async fn destination_question_gets_a_single_quick_answer() {
        let generator = Arc::new(tokyo_generator().with_reply(
            "quick_answer",
            "Yes. Early April is cherry blossom season, so book hotels early.",
        ));
        let agent = agent_with(Arc::clone(&generator));

        let reply = agent
            .handle_chat(ChatInput {
                session_id: None,
                text: "Is April good for visiting Tokyo?".to_string(),
            })
            .await
            .expect("chat should succeed");

        assert_eq!(generator.calls(), vec!["quick_answer".to_string()]);
        assert!(reply.reply_text.starts_with("Yes. Early April"));
        assert!(reply.report.is_none());
        assert!(reply.failure.is_none());

        let session = agent
            .load_session(&reply.session_id)
            .await
            .expect("load should succeed")
            .expect("session should exist");
        assert_eq!(session.turns.len(), 1);
    }

    #[tokio::test]
    async fn failed_quick_answer_falls_back_to_planning() {
        let generator = Arc::new(tokyo_generator().with_failure("quick_answer", "overloaded"));
        let agent = agent_with(Arc::clone(&generator));

        let reply = agent
            .handle_chat(ChatInput {
                session_id: None,
                text: "Is April good for visiting Tokyo?".to_string(),
            })
            .await
            .expect("chat should succeed");

        assert_eq!(generator.call_count("quick_answer"), 1);
        assert_eq!(generator.call_count("researcher"), 1);
        let report = reply.report.expect("pipeline should plan instead");
        assert_eq!(report.request.destination, "Tokyo");
        assert_eq!(report.request.dates.month.as_deref(), Some("April"));
    }
}
