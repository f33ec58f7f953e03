use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use wayfarer_core::ProposalCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Answer,
    Parse,
    Research,
    Flight,
    Hotel,
    Activity,
    Synthesize,
    Review,
}

impl Stage {
    pub fn for_category(category: ProposalCategory) -> Self {
        match category {
            ProposalCategory::Flight => Self::Flight,
            ProposalCategory::Hotel => Self::Hotel,
            ProposalCategory::Activity => Self::Activity,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Answer => "answer",
            Self::Parse => "parse",
            Self::Research => "research",
            Self::Flight => "flight",
            Self::Hotel => "hotel",
            Self::Activity => "activity",
            Self::Synthesize => "synthesize",
            Self::Review => "review",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StagePhase {
    Started,
    Finished,
    Degraded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineEvent {
    pub stage: Stage,
    pub phase: StagePhase,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    sender: Option<UnboundedSender<PipelineEvent>>,
}

impl ProgressSink {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn new(sender: UnboundedSender<PipelineEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    pub fn channel() -> (Self, UnboundedReceiver<PipelineEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }

    pub fn emit(&self, stage: Stage, phase: StagePhase, detail: Option<String>) {
        let Some(sender) = &self.sender else {
            return;
        };
        let _ = sender.send(PipelineEvent {
            stage,
            phase,
            detail,
        });
    }
}
