use std::fmt::Write as _;

use crate::error::PlanningError;
use crate::models::{FinalReport, ItineraryOption};

pub fn render_report(report: &FinalReport) -> String {
    let request = &report.request;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "## Your trip to {} ({})",
        request.destination,
        request.travel_window()
    );
    let _ = writeln!(
        out,
        "Travelers: {} | Budget: {}",
        request.party_size,
        request.budget_summary()
    );

    if !report.research.summary.is_empty() {
        let _ = writeln!(out, "\n{}", report.research.summary);
    }
    if !report.research.best_time_to_visit.is_empty() {
        let _ = writeln!(out, "Best time to visit: {}", report.research.best_time_to_visit);
    }

    for (label, option) in ["A", "B"].iter().zip(report.options.iter()) {
        render_option(&mut out, label, option);
    }

    if let Some(review) = &report.review {
        let _ = writeln!(out, "\n### Review ({}/10)\n{}", review.score, review.summary);
        for strength in &review.strengths {
            let _ = writeln!(out, "+ {strength}");
        }
        for improvement in &review.improvements {
            let _ = writeln!(out, "- {improvement}");
        }
    }

    if !report.research.tips.is_empty() {
        let _ = writeln!(out, "\n### Practical tips");
        for tip in &report.research.tips {
            let _ = writeln!(out, "- {tip}");
        }
    }

    if !report.notices.is_empty() {
        let _ = writeln!(out, "\n### Notices");
        for notice in &report.notices {
            let _ = writeln!(out, "- {notice}");
        }
    }

    out
}

fn render_option(out: &mut String, label: &str, option: &ItineraryOption) {
    let cost = &option.total_cost;
    let _ = writeln!(
        out,
        "\n### Option {label}: {} ({})",
        option.headline,
        option.theme.label()
    );

    let budget_state = match (cost.budget_limit, cost.over_budget) {
        (Some(_), true) => " (over budget)",
        (Some(_), false) => " (within budget)",
        (None, _) => "",
    };
    let _ = writeln!(
        out,
        "Estimated total: {:.0} {}{budget_state}",
        cost.amount, cost.currency
    );

    if let Some(flight) = &option.flight {
        let _ = writeln!(out, "- Flight: {} ({:.0} {})", flight.name, flight.price, flight.currency);
    }
    if let Some(hotel) = &option.hotel {
        let _ = writeln!(
            out,
            "- Stay: {} ({:.0} {} per night)",
            hotel.name, hotel.price, hotel.currency
        );
    }

    for day in &option.days {
        let _ = writeln!(out, "\n**Day {}: {}**", day.day, day.title);
        let _ = writeln!(out, "- Morning: {}", day.morning);
        let _ = writeln!(out, "- Afternoon: {}", day.afternoon);
        let _ = writeln!(out, "- Evening: {}", day.evening);
    }

    for note in option.notes.iter().chain(option.review_adjustments.iter()) {
        let _ = writeln!(out, "> {note}");
    }
}

pub fn render_failure(error: &PlanningError) -> String {
    match error {
        PlanningError::Parse => format!(
            "{error} Try something like \"Plan a 5-day trip to Tokyo in April, budget $3000\"."
        ),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_failure_includes_example() {
        let text = render_failure(&PlanningError::Parse);
        assert!(text.starts_with("Could not determine a destination from your request."));
    }
}
