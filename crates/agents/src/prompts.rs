use std::fmt::Write as _;

use wayfarer_core::{ItineraryPair, ProposalCategory, ResearchNotes, TripRequest};
use wayfarer_llm::{GenerationRequest, ModelTier};

pub const RESEARCHER_ROLE: &str = "researcher";
pub const SYNTHESIZER_ROLE: &str = "synthesizer";
pub const REVIEWER_ROLE: &str = "reviewer";
pub const QUICK_ANSWER_ROLE: &str = "quick_answer";

const FACTUAL_TEMPERATURE: f32 = 0.3;
const ADVISORY_TEMPERATURE: f32 = 0.5;
const ACTIVITY_TEMPERATURE: f32 = 0.6;
const CREATIVE_TEMPERATURE: f32 = 0.8;

pub fn planner_role(category: ProposalCategory) -> &'static str {
    match category {
        ProposalCategory::Flight => "flight_planner",
        ProposalCategory::Hotel => "hotel_planner",
        ProposalCategory::Activity => "activity_planner",
    }
}

pub fn quick_answer_request(question: &str) -> GenerationRequest {
    let system = "You are a travel advisor answering a quick question, not planning a trip. \
Answer directly in the first sentence, then give 3 to 5 short bullet points and one practical tip. \
End by offering to plan a full itinerary. Stay under 180 words and reply in plain text."
        .to_string();

    GenerationRequest {
        role: QUICK_ANSWER_ROLE.to_string(),
        tier: ModelTier::Fast,
        system,
        user: format!("Question: {question}"),
        temperature: ADVISORY_TEMPERATURE,
    }
}

pub fn research_request(request: &TripRequest) -> GenerationRequest {
    let system = "You are a destination researcher for a travel planning service. \
Reply with a single JSON object: \
{\"summary\": string, \"best_time_to_visit\": string, \"tips\": [string]}. \
Keep the summary under 120 words and give at most 6 practical tips."
        .to_string();

    let mut user = describe_request(request);
    if let Some(group) = request.kid_age_group() {
        let _ = writeln!(
            user,
            "The party travels with children (youngest is a {group}); mention anything that matters for them."
        );
    }

    GenerationRequest {
        role: RESEARCHER_ROLE.to_string(),
        tier: ModelTier::Fast,
        system,
        user,
        temperature: FACTUAL_TEMPERATURE,
    }
}

pub fn planner_request(
    category: ProposalCategory,
    request: &TripRequest,
    notes: &ResearchNotes,
) -> GenerationRequest {
    let (focus, tier, temperature) = match category {
        ProposalCategory::Flight => (
            "Suggest 2 to 4 round-trip flight options. Price is per traveler, round trip.",
            ModelTier::Fast,
            FACTUAL_TEMPERATURE,
        ),
        ProposalCategory::Hotel => (
            "Suggest 2 to 4 places to stay across different price levels. Price is per night for the whole party.",
            ModelTier::Fast,
            FACTUAL_TEMPERATURE,
        ),
        ProposalCategory::Activity => (
            "Suggest 4 to 10 activities that fit the traveler's interests. Price is per person; use 0 for free activities.",
            ModelTier::Default,
            ACTIVITY_TEMPERATURE,
        ),
    };

    let mut system = format!(
        "You are the {} for a travel planning service. {focus} \
Reply with a single JSON object: \
{{\"options\": [{{\"name\": string, \"price\": number, \"currency\": string, \"details\": string, \"rationale\": string}}]}}. \
Prices are realistic estimates in {}.",
        planner_role(category).replace('_', " "),
        request.budget.currency
    );
    if request.has_kids() && category != ProposalCategory::Flight {
        let group = request.kid_age_group().unwrap_or("child");
        let _ = write!(
            system,
            " The party includes children (youngest is a {group}): prefer family rooms, \
short transfers, age-appropriate activities and early evenings."
        );
    }

    let mut user = describe_request(request);
    let _ = writeln!(user, "\nResearch summary: {}", notes.summary);
    if !notes.best_time_to_visit.is_empty() {
        let _ = writeln!(user, "Best time to visit: {}", notes.best_time_to_visit);
    }

    GenerationRequest {
        role: planner_role(category).to_string(),
        tier,
        system,
        user,
        temperature,
    }
}

pub fn synthesis_request(
    request: &TripRequest,
    notes: &ResearchNotes,
    options: &ItineraryPair,
) -> GenerationRequest {
    let days = request.dates.duration_days;
    let system = format!(
        "You write day-by-day travel schedules. Two itineraries have already been chosen; \
write a catchy headline and exactly {days} days for each. Reply with a single JSON object: \
{{\"budget\": {{\"headline\": string, \"days\": [{{\"title\": string, \"morning\": string, \"afternoon\": string, \"evening\": string}}]}}, \
\"comfort\": {{same shape}}}}. Only schedule the flight, hotel and activities listed."
    );

    let mut user = describe_request(request);
    let _ = writeln!(user, "\nResearch summary: {}", notes.summary);
    for option in options.iter() {
        let _ = writeln!(user, "\n{} itinerary ({}):", option.theme.as_str(), option.theme.label());
        if let Some(flight) = &option.flight {
            let _ = writeln!(user, "- flight: {}", flight.name);
        }
        if let Some(hotel) = &option.hotel {
            let _ = writeln!(user, "- hotel: {}", hotel.name);
        }
        for activity in &option.activities {
            let _ = writeln!(user, "- activity: {}", activity.name);
        }
    }

    GenerationRequest {
        role: SYNTHESIZER_ROLE.to_string(),
        tier: ModelTier::Default,
        system,
        user,
        temperature: CREATIVE_TEMPERATURE,
    }
}

pub fn review_request(request: &TripRequest, options: &ItineraryPair) -> GenerationRequest {
    let system = "You review travel itineraries for feasibility, pacing and budget fit. \
Reply with a single JSON object: \
{\"score\": integer 1-10, \"strengths\": [string], \"improvements\": [string], \"summary\": string, \
\"adjustments\": {\"budget\": [string], \"comfort\": [string]}}. \
Adjustments are concrete suggestions for the matching itinerary."
        .to_string();

    let mut user = describe_request(request);
    for option in options.iter() {
        let cost = &option.total_cost;
        let _ = writeln!(
            user,
            "\n{} itinerary: {} (estimated {:.0} {}{})",
            option.theme.as_str(),
            option.headline,
            cost.amount,
            cost.currency,
            if cost.over_budget { ", over budget" } else { "" }
        );
        for day in &option.days {
            let _ = writeln!(
                user,
                "Day {}: {} | {} | {} | {}",
                day.day, day.title, day.morning, day.afternoon, day.evening
            );
        }
    }

    GenerationRequest {
        role: REVIEWER_ROLE.to_string(),
        tier: ModelTier::Default,
        system,
        user,
        temperature: FACTUAL_TEMPERATURE,
    }
}

fn describe_request(request: &TripRequest) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Destination: {}", request.destination);
    if let Some(origin) = &request.origin {
        let _ = writeln!(out, "Departing from: {origin}");
    }
    let _ = writeln!(out, "Trip length: {}", request.travel_window());
    let _ = writeln!(out, "Travelers: {}", request.party_size);
    if !request.kid_ages.is_empty() {
        let ages = request
            .kid_ages
            .iter()
            .map(|age| age.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "Children's ages: {ages}");
    }
    let _ = writeln!(out, "Budget: {}", request.budget_summary());
    if !request.interests.is_empty() {
        let interests = request
            .interests
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "Interests: {interests}");
    }
    let _ = writeln!(out, "Original request: {}", request.raw_text);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_core::parse_trip_request;

    #[test]
    fn family_constraints_reach_activity_planner_only_when_kids_travel() {
        let family =
            parse_trip_request("Plan a trip to Bali with my kids (ages 3 and 7), love beaches")
                .expect("should parse");
        let notes = ResearchNotes::degraded("Bali");

        let activity = planner_request(ProposalCategory::Activity, &family, &notes);
        assert!(activity.system.contains("toddler"));
        assert_eq!(activity.role, "activity_planner");

        let flight = planner_request(ProposalCategory::Flight, &family, &notes);
        assert!(!flight.system.contains("children"));

        let solo = parse_trip_request("Plan a 5-day trip to Tokyo in April, budget $3000")
            .expect("should parse");
        let activity = planner_request(ProposalCategory::Activity, &solo, &notes);
        assert!(!activity.system.contains("children"));
    }

    #[test]
    fn quick_answer_uses_the_fast_tier() {
        let generation = quick_answer_request("Is April good for visiting Tokyo?");
        assert_eq!(generation.role, QUICK_ANSWER_ROLE);
        assert_eq!(generation.tier, ModelTier::Fast);
        assert!(generation.user.contains("Is April good for visiting Tokyo?"));
    }

    #[test]
    fn research_request_carries_trip_context() {
        let request = parse_trip_request("Plan a 5-day trip to Tokyo in April, budget $3000")
            .expect("should parse");
        let generation = research_request(&request);
        assert_eq!(generation.tier, ModelTier::Fast);
        assert!(generation.user.contains("Destination: Tokyo"));
        assert!(generation.user.contains("5 days in April"));
    }
}
