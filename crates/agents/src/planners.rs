use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use tokio::task::JoinSet;
use tracing::{debug, warn};
use wayfarer_core::{
    BranchStatus, Proposal, ProposalCategory, ProposalItem, Proposals, ResearchNotes, TripRequest,
};
use wayfarer_llm::{parse_json_reply, TextGenerator};
use wayfarer_observability::AppMetrics;

use crate::events::{ProgressSink, Stage, StagePhase};
use crate::prompts::planner_request;
use crate::stage::generate;

const MAX_ITEMS: usize = 12;

static PRICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?").expect("valid price regex")
});

#[derive(Debug, Deserialize)]
struct PlannerReply {
    #[serde(default)]
    options: Vec<PlannerOption>,
}

#[derive(Debug, Deserialize)]
struct PlannerOption {
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "lenient_price")]
    price: Price,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    details: String,
    #[serde(default)]
    rationale: String,
}

#[derive(Debug, Default, PartialEq)]
enum Price {
    #[default]
    Missing,
    Amount(f64),
    Unreadable,
}

fn lenient_price<'de, D>(deserializer: D) -> Result<Price, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => Price::Missing,
        serde_json::Value::Number(number) => {
            number.as_f64().map(Price::Amount).unwrap_or(Price::Unreadable)
        }
        serde_json::Value::String(text) => read_price(&text),
        _ => Price::Unreadable,
    })
}

// First figure wins, so "$120-180" reads as 120. "1.200,50" style amounts are unreadable.
fn read_price(text: &str) -> Price {
    let Some(found) = PRICE.find(text) else {
        return Price::Missing;
    };

    let mut rest = text[found.end()..].chars();
    if let (Some(',' | '.'), Some(next)) = (rest.next(), rest.next()) {
        if next.is_ascii_digit() {
            return Price::Unreadable;
        }
    }

    found
        .as_str()
        .replace(',', "")
        .parse::<f64>()
        .map(Price::Amount)
        .unwrap_or(Price::Unreadable)
}

pub async fn plan_category(
    generator: &dyn TextGenerator,
    category: ProposalCategory,
    request: &TripRequest,
    notes: &ResearchNotes,
    metrics: &AppMetrics,
) -> Proposal {
    let generation = planner_request(category, request, notes);
    let raw = match generate(generator, &generation, category.as_str(), metrics).await {
        Ok(raw) => raw,
        Err(error) => {
            return Proposal::empty(
                category,
                BranchStatus::Failed {
                    reason: error.to_string(),
                },
            )
        }
    };

    let Some(reply) = parse_json_reply::<PlannerReply>(&raw) else {
        return Proposal::empty(
            category,
            BranchStatus::Failed {
                reason: format!("{} planner reply was not valid JSON", category.as_str()),
            },
        );
    };

    let items = reply
        .options
        .into_iter()
        .filter_map(|option| {
            let name = option.name.trim().to_string();
            let price = match option.price {
                Price::Missing => 0.0,
                Price::Amount(price) => price,
                Price::Unreadable => {
                    debug!(
                        category = category.as_str(),
                        name = %name,
                        "dropping option with unreadable price"
                    );
                    return None;
                }
            };
            if name.is_empty() || !price.is_finite() || price < 0.0 {
                return None;
            }
            Some(ProposalItem {
                name,
                price,
                currency: option
                    .currency
                    .map(|currency| currency.trim().to_uppercase())
                    .filter(|currency| currency.len() == 3)
                    .unwrap_or_else(|| request.budget.currency.clone()),
                details: option.details.trim().to_string(),
                rationale: option.rationale.trim().to_string(),
            })
        })
        .take(MAX_ITEMS)
        .collect();

    Proposal {
        category,
        items,
        status: BranchStatus::Completed,
    }
}

pub async fn fan_out(
    generator: Arc<dyn TextGenerator>,
    request: &TripRequest,
    notes: &ResearchNotes,
    branch_timeout: Duration,
    metrics: Arc<AppMetrics>,
    progress: &ProgressSink,
) -> Proposals {
    let mut branches = JoinSet::new();
    for category in ProposalCategory::ALL {
        let generator = Arc::clone(&generator);
        let request = request.clone();
        let notes = notes.clone();
        let metrics = Arc::clone(&metrics);
        progress.emit(Stage::for_category(category), StagePhase::Started, None);

        branches.spawn(async move {
            let planned = plan_category(generator.as_ref(), category, &request, &notes, &metrics);
            match tokio::time::timeout(branch_timeout, planned).await {
                Ok(proposal) => proposal,
                Err(_) => {
                    metrics.inc_branch_timeout();
                    Proposal::empty(category, BranchStatus::TimedOut)
                }
            }
        });
    }

    let mut flight = None;
    let mut hotel = None;
    let mut activity = None;
    while let Some(joined) = branches.join_next().await {
        let proposal = match joined {
            Ok(proposal) => proposal,
            Err(error) => {
                warn!(error = %error, "planner task aborted");
                continue;
            }
        };

        report_branch(&proposal, &metrics, progress);
        match proposal.category {
            ProposalCategory::Flight => flight = Some(proposal),
            ProposalCategory::Hotel => hotel = Some(proposal),
            ProposalCategory::Activity => activity = Some(proposal),
        }
    }

    let settle = |slot: Option<Proposal>, category: ProposalCategory| {
        slot.unwrap_or_else(|| {
            let proposal = Proposal::empty(
                category,
                BranchStatus::Failed {
                    reason: "planner task aborted".to_string(),
                },
            );
            report_branch(&proposal, &metrics, progress);
            proposal
        })
    };

    Proposals {
        flight: settle(flight, ProposalCategory::Flight),
        hotel: settle(hotel, ProposalCategory::Hotel),
        activity: settle(activity, ProposalCategory::Activity),
    }
}

fn report_branch(proposal: &Proposal, metrics: &AppMetrics, progress: &ProgressSink) {
    let stage = Stage::for_category(proposal.category);
    let detail = match &proposal.status {
        BranchStatus::Completed if !proposal.is_empty() => {
            progress.emit(
                stage,
                StagePhase::Finished,
                Some(format!("{} options", proposal.items.len())),
            );
            return;
        }
        BranchStatus::Completed => "no usable options".to_string(),
        BranchStatus::TimedOut => "timed out".to_string(),
        BranchStatus::Failed { reason } => reason.clone(),
    };

    metrics.inc_degraded_stage();
    warn!(category = proposal.category.as_str(), detail = %detail, "planner branch degraded");
    progress.emit(stage, StagePhase::Degraded, Some(detail));
}
