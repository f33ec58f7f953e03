use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DURATION_DAYS: u32 = 5;
pub const WEEKEND_DURATION_DAYS: u32 = 2;
pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTier {
    Budget,
    Moderate,
    Luxury,
}

impl BudgetTier {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "budget" | "cheap" | "economy" => Some(Self::Budget),
            "moderate" | "mid" | "standard" => Some(Self::Moderate),
            "luxury" | "premium" | "splurge" => Some(Self::Luxury),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::Moderate => "moderate",
            Self::Luxury => "luxury",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub amount: Option<f64>,
    pub currency: String,
    pub tier: BudgetTier,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            amount: None,
            currency: DEFAULT_CURRENCY.to_string(),
            tier: BudgetTier::Moderate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripDates {
    pub duration_days: u32,
    pub month: Option<String>,
    pub start_date: Option<NaiveDate>,
}

impl TripDates {
    pub fn nights(&self) -> u32 {
        self.duration_days.saturating_sub(1).max(1)
    }
}

impl Default for TripDates {
    fn default() -> Self {
        Self {
            duration_days: DEFAULT_DURATION_DAYS,
            month: None,
            start_date: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub destination: String,
    pub origin: Option<String>,
    pub dates: TripDates,
    pub budget: Budget,
    pub interests: BTreeSet<String>,
    pub party_size: u8,
    pub kid_ages: Vec<u8>,
    pub raw_text: String,
}

impl TripRequest {
    pub fn has_kids(&self) -> bool {
        !self.kid_ages.is_empty() || self.interests.contains("family")
    }

    pub fn kid_age_group(&self) -> Option<&'static str> {
        let youngest = self.kid_ages.iter().min()?;
        Some(match youngest {
            0..=2 => "infant",
            3..=5 => "toddler",
            6..=12 => "child",
            _ => "teen",
        })
    }

    pub fn travel_window(&self) -> String {
        let mut window = format!("{} days", self.dates.duration_days);
        if let Some(start) = self.dates.start_date {
            window.push_str(&format!(" starting {}", start.format("%Y-%m-%d")));
        } else if let Some(month) = &self.dates.month {
            window.push_str(&format!(" in {month}"));
        }
        window
    }

    pub fn budget_summary(&self) -> String {
        match self.budget.amount {
            Some(amount) => format!(
                "{:.0} {} ({})",
                amount,
                self.budget.currency,
                self.budget.tier.as_str()
            ),
            None => format!("unspecified ({})", self.budget.tier.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchNotes {
    pub summary: String,
    pub best_time_to_visit: String,
    pub tips: Vec<String>,
    pub degraded: bool,
}

impl ResearchNotes {
    pub fn degraded(destination: &str) -> Self {
        Self {
            summary: format!("Background research for {destination} is unavailable."),
            best_time_to_visit: String::new(),
            tips: Vec::new(),
            degraded: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalCategory {
    Flight,
    Hotel,
    Activity,
}

impl ProposalCategory {
    pub const ALL: [Self; 3] = [Self::Flight, Self::Hotel, Self::Activity];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flight => "flight",
            Self::Hotel => "hotel",
            Self::Activity => "activity",
        }
    }

    pub fn unavailable_notice(self) -> String {
        format!("No {} suggestions available.", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalItem {
    pub name: String,
    pub price: f64,
    pub currency: String,
    pub details: String,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BranchStatus {
    Completed,
    TimedOut,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub category: ProposalCategory,
    pub items: Vec<ProposalItem>,
    pub status: BranchStatus,
}

impl Proposal {
    pub fn empty(category: ProposalCategory, status: BranchStatus) -> Self {
        Self {
            category,
            items: Vec::new(),
            status,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn by_price(&self) -> Vec<&ProposalItem> {
        let mut items = self.items.iter().collect::<Vec<_>>();
        items.sort_by(|a, b| a.price.total_cmp(&b.price));
        items
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposals {
    pub flight: Proposal,
    pub hotel: Proposal,
    pub activity: Proposal,
}

impl Proposals {
    pub fn get(&self, category: ProposalCategory) -> &Proposal {
        match category {
            ProposalCategory::Flight => &self.flight,
            ProposalCategory::Hotel => &self.hotel,
            ProposalCategory::Activity => &self.activity,
        }
    }

    pub fn all_empty(&self) -> bool {
        ProposalCategory::ALL
            .iter()
            .all(|category| self.get(*category).is_empty())
    }

    pub fn degraded_notices(&self) -> Vec<String> {
        ProposalCategory::ALL
            .iter()
            .filter(|category| self.get(**category).is_empty())
            .map(|category| category.unavailable_notice())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Budget,
    Comfort,
}

impl Theme {
    pub fn label(self) -> &'static str {
        match self {
            Self::Budget => "Budget-friendly",
            Self::Comfort => "Comfort & convenience",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::Comfort => "comfort",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: u32,
    pub title: String,
    pub morning: String,
    pub afternoon: String,
    pub evening: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub flights: f64,
    pub lodging: f64,
    pub activities: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub amount: f64,
    pub currency: String,
    pub breakdown: CostBreakdown,
    pub budget_limit: Option<f64>,
    pub over_budget: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryOption {
    pub theme: Theme,
    pub headline: String,
    pub flight: Option<ProposalItem>,
    pub hotel: Option<ProposalItem>,
    pub activities: Vec<ProposalItem>,
    pub days: Vec<DayPlan>,
    pub total_cost: CostEstimate,
    pub notes: Vec<String>,
    pub review_adjustments: Vec<String>,
}

// Always budget then comfort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryPair {
    budget: ItineraryOption,
    comfort: ItineraryOption,
}

impl ItineraryPair {
    pub fn new(mut budget: ItineraryOption, mut comfort: ItineraryOption) -> Self {
        budget.theme = Theme::Budget;
        comfort.theme = Theme::Comfort;
        Self { budget, comfort }
    }

    pub fn budget(&self) -> &ItineraryOption {
        &self.budget
    }

    pub fn comfort(&self) -> &ItineraryOption {
        &self.comfort
    }

    pub fn get_mut(&mut self, theme: Theme) -> &mut ItineraryOption {
        match theme {
            Theme::Budget => &mut self.budget,
            Theme::Comfort => &mut self.comfort,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItineraryOption> {
        [&self.budget, &self.comfort].into_iter()
    }

    pub fn themes(&self) -> [Theme; 2] {
        [self.budget.theme, self.comfort.theme]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub score: u8,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalReport {
    pub request: TripRequest,
    pub research: ResearchNotes,
    pub proposals: Proposals,
    pub options: ItineraryPair,
    pub review: Option<Review>,
    pub notices: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatInput {
    pub session_id: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatFailure {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub session_id: String,
    pub reply_text: String,
    pub report: Option<FinalReport>,
    pub failure: Option<ChatFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub at: DateTime<Utc>,
    pub user_text: String,
    pub assistant_text: String,
    pub report: Option<FinalReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
    pub turns: Vec<ConversationTurn>,
}
