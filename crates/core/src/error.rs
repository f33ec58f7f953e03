use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlanningError {
    #[error("Could not determine a destination from your request.")]
    Parse,

    #[error("{stage} timed out after {after:?}")]
    UpstreamTimeout { stage: &'static str, after: Duration },

    #[error("{stage} call failed: {message}")]
    Upstream { stage: &'static str, message: String },

    #[error(
        "Could not build an itinerary: no flight, hotel or activity suggestions were available."
    )]
    Synthesis,
}

impl PlanningError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse => "parse_error",
            Self::UpstreamTimeout { .. } => "upstream_timeout",
            Self::Upstream { .. } => "upstream_error",
            Self::Synthesis => "synthesis_error",
        }
    }

    // Recoverable errors degrade a stage instead of halting the pipeline.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UpstreamTimeout { .. } | Self::Upstream { .. })
    }
}
