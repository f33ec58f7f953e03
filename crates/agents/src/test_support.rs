use wayfarer_core::{BranchStatus, Proposal, ProposalCategory, ProposalItem, Proposals};
use wayfarer_llm::ScriptedGenerator;

pub const TOKYO_REQUEST: &str = "Plan a 5-day trip to Tokyo in April, budget $3000";

fn item(name: &str, price: f64) -> ProposalItem {
    ProposalItem {
        name: name.to_string(),
        price,
        currency: "USD".to_string(),
        details: String::new(),
        rationale: String::new(),
    }
}

pub fn barcelona_proposals() -> Proposals {
    Proposals {
        flight: Proposal {
            category: ProposalCategory::Flight,
            items: vec![item("Vueling economy", 180.0), item("Iberia business", 900.0)],
            status: BranchStatus::Completed,
        },
        hotel: Proposal {
            category: ProposalCategory::Hotel,
            items: vec![item("Generator hostel", 70.0), item("Hotel Arts", 620.0)],
            status: BranchStatus::Completed,
        },
        activity: Proposal {
            category: ProposalCategory::Activity,
            items: vec![
                item("Sagrada Familia", 33.0),
                item("Gothic Quarter walk", 0.0),
                item("Private sailing trip", 250.0),
            ],
            status: BranchStatus::Completed,
        },
    }
}

pub fn weekend_schedule_reply() -> &'static str {
    r#"{
      "budget": {
        "headline": "Tapas and Gaudi on a shoestring",
        "days": [
          {"title": "Old town", "morning": "Gothic Quarter walk", "afternoon": "Boqueria", "evening": "Tapas crawl"},
          {"title": "Gaudi", "morning": "Sagrada Familia", "afternoon": "Park Guell", "evening": "Fly home"}
        ]
      },
      "comfort": {
        "headline": "Barcelona in style",
        "days": [
          {"title": "Seafront", "morning": "Check in at Hotel Arts", "afternoon": "Private sailing trip", "evening": "Rooftop dinner"},
          {"title": "Modernisme", "morning": "Sagrada Familia", "afternoon": "Spa", "evening": "Fly home"}
        ]
      }
    }"#
}

pub fn tokyo_generator() -> ScriptedGenerator {
    ScriptedGenerator::new()
        .with_reply(
            "researcher",
            r#"{"summary": "Tokyo in April means cherry blossoms and mild weather.",
                "best_time_to_visit": "Late March to early May",
                "tips": ["Buy a Suica card", "Book popular restaurants ahead"]}"#,
        )
        .with_reply(
            "flight_planner",
            r#"{"options": [
                {"name": "Zipair economy", "price": 650, "details": "LAX-NRT"},
                {"name": "ANA premium economy", "price": 1400, "details": "LAX-HND"}]}"#,
        )
        .with_reply(
            "hotel_planner",
            r#"{"options": [
                {"name": "Nine Hours capsule", "price": 45},
                {"name": "Hotel Gracery Shinjuku", "price": 160},
                {"name": "Park Hyatt Tokyo", "price": 700}]}"#,
        )
        .with_reply(
            "activity_planner",
            r#"{"options": [
                {"name": "Ueno Park hanami", "price": 0},
                {"name": "Tsukiji outer market tasting", "price": 40},
                {"name": "teamLab Planets", "price": 30},
                {"name": "Sumo morning practice", "price": 100}]}"#,
        )
        .with_reply(
            "synthesizer",
            r#"{"budget": {"headline": "Blossoms on a budget", "days": []}}"#,
        )
        .with_reply(
            "reviewer",
            r#"{"score": 8, "strengths": ["Good pacing"], "improvements": ["Add a day trip"],
                "summary": "Both plans fit the season.",
                "adjustments": {"budget": ["Consider a JR day pass"], "comfort": []}}"#,
        )
}
