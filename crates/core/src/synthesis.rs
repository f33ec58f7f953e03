use std::collections::VecDeque;

use crate::error::PlanningError;
use crate::models::{
    CostBreakdown, CostEstimate, DayPlan, ItineraryOption, ItineraryPair, ProposalCategory,
    ProposalItem, Proposals, Theme, TripRequest,
};

pub fn assemble_itineraries(
    request: &TripRequest,
    proposals: &Proposals,
) -> Result<ItineraryPair, PlanningError> {
    if proposals.all_empty() {
        return Err(PlanningError::Synthesis);
    }

    let flights = proposals.flight.by_price();
    let hotels = proposals.hotel.by_price();
    let activities = proposals.activity.by_price();
    let (cheap, pricey) = split_activities(&activities, activity_capacity(request));

    let budget = build_option(
        Theme::Budget,
        request,
        proposals,
        flights.first().copied(),
        hotels.first().copied(),
        cheap,
    );
    let comfort = build_option(
        Theme::Comfort,
        request,
        proposals,
        flights.last().copied(),
        hotels.last().copied(),
        pricey,
    );

    Ok(ItineraryPair::new(budget, comfort))
}

// Open activity slots in `default_schedule`: day one evening, two per middle day and the
// last morning.
fn activity_capacity(request: &TripRequest) -> usize {
    match request.dates.duration_days {
        0 | 1 => 1,
        days => (days as usize - 1) * 2,
    }
}

// Disjoint when there are at least two activities; a lone activity is shared.
fn split_activities<'a>(
    by_price: &[&'a ProposalItem],
    capacity: usize,
) -> (Vec<&'a ProposalItem>, Vec<&'a ProposalItem>) {
    let pricey_count = capacity.min(by_price.len() / 2);
    let cheap_count = capacity.min(by_price.len() - pricey_count);

    let cheap = by_price[..cheap_count].to_vec();
    let pricey = if pricey_count == 0 {
        cheap.clone()
    } else {
        by_price.iter().rev().take(pricey_count).copied().collect()
    };
    (cheap, pricey)
}

fn build_option(
    theme: Theme,
    request: &TripRequest,
    proposals: &Proposals,
    flight: Option<&ProposalItem>,
    hotel: Option<&ProposalItem>,
    activities: Vec<&ProposalItem>,
) -> ItineraryOption {
    let mut notes = proposals.degraded_notices();
    for category in [ProposalCategory::Flight, ProposalCategory::Hotel] {
        if proposals.get(category).items.len() == 1 {
            notes.push(format!(
                "Only one {} option was proposed, so both itineraries share it.",
                category.as_str()
            ));
        }
    }

    let flight = flight.cloned();
    let hotel = hotel.cloned();
    let activities = activities.into_iter().cloned().collect::<Vec<_>>();

    let total_cost = estimate_cost(request, flight.as_ref(), hotel.as_ref(), &activities);
    if total_cost.over_budget {
        if let Some(limit) = total_cost.budget_limit {
            notes.push(format!(
                "Estimated total of {:.0} {} exceeds the {:.0} {} budget by {:.0} {}.",
                total_cost.amount,
                total_cost.currency,
                limit,
                total_cost.currency,
                total_cost.amount - limit,
                total_cost.currency
            ));
        }
    }

    let days = default_schedule(request, flight.as_ref(), hotel.as_ref(), &activities);

    ItineraryOption {
        theme,
        headline: format!(
            "{} {} in {} days",
            theme.label(),
            request.destination,
            request.dates.duration_days
        ),
        flight,
        hotel,
        activities,
        days,
        total_cost,
        notes,
        review_adjustments: Vec::new(),
    }
}

fn estimate_cost(
    request: &TripRequest,
    flight: Option<&ProposalItem>,
    hotel: Option<&ProposalItem>,
    activities: &[ProposalItem],
) -> CostEstimate {
    let party = f64::from(request.party_size.max(1));
    let nights = f64::from(request.dates.nights());

    let breakdown = CostBreakdown {
        flights: flight.map(|item| item.price * party).unwrap_or(0.0),
        lodging: hotel.map(|item| item.price * nights).unwrap_or(0.0),
        activities: activities.iter().map(|item| item.price).sum::<f64>() * party,
    };
    let amount = breakdown.flights + breakdown.lodging + breakdown.activities;
    let budget_limit = request.budget.amount;

    CostEstimate {
        amount,
        currency: request.budget.currency.clone(),
        breakdown,
        budget_limit,
        over_budget: budget_limit.map(|limit| amount > limit).unwrap_or(false),
    }
}

pub fn default_schedule(
    request: &TripRequest,
    flight: Option<&ProposalItem>,
    hotel: Option<&ProposalItem>,
    activities: &[ProposalItem],
) -> Vec<DayPlan> {
    let destination = request.destination.as_str();
    let total_days = request.dates.duration_days.max(1);
    let mut queue = activities
        .iter()
        .map(|item| item.name.clone())
        .collect::<VecDeque<_>>();
    let stay = hotel
        .map(|item| item.name.clone())
        .unwrap_or_else(|| "your accommodation".to_string());

    let mut days = Vec::with_capacity(total_days as usize);
    for day in 1..=total_days {
        let plan = if day == 1 {
            DayPlan {
                day,
                title: format!("Arrival in {destination}"),
                morning: flight
                    .map(|item| format!("Travel on {}", item.name))
                    .unwrap_or_else(|| format!("Travel to {destination}")),
                afternoon: format!("Check in at {stay} and rest"),
                evening: queue
                    .pop_front()
                    .unwrap_or_else(|| format!("Easy first evening near {stay}")),
            }
        } else if day == total_days {
            DayPlan {
                day,
                title: "Departure".to_string(),
                morning: queue
                    .pop_front()
                    .unwrap_or_else(|| "Free morning for last purchases".to_string()),
                afternoon: format!("Check out of {stay} and head to the airport"),
                evening: flight
                    .map(|item| format!("Return on {}", item.name))
                    .unwrap_or_else(|| "Travel home".to_string()),
            }
        } else {
            DayPlan {
                day,
                title: format!("Day {day} in {destination}"),
                morning: queue
                    .pop_front()
                    .unwrap_or_else(|| format!("Explore {destination} at your own pace")),
                afternoon: queue
                    .pop_front()
                    .unwrap_or_else(|| "Unscheduled time to rest or wander".to_string()),
                evening: format!("Dinner near {stay}"),
            }
        };
        days.push(plan);
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BranchStatus, Proposal};
    use crate::parser::parse_trip_request;

    fn item(name: &str, price: f64) -> ProposalItem {
        ProposalItem {
            name: name.to_string(),
            price,
            currency: "USD".to_string(),
            details: String::new(),
            rationale: String::new(),
        }
    }

    fn proposal(category: ProposalCategory, items: Vec<ProposalItem>) -> Proposal {
        Proposal {
            category,
            items,
            status: BranchStatus::Completed,
        }
    }

    fn tokyo() -> TripRequest {
        parse_trip_request("Plan a 5-day trip to Tokyo in April, budget $3000")
            .expect("request should parse")
    }

    #[test]
    fn picks_distinct_primaries_per_theme() {
        let proposals = Proposals {
            flight: proposal(
                ProposalCategory::Flight,
                vec![item("Premium Air", 1400.0), item("Saver Jet", 700.0)],
            ),
            hotel: proposal(
                ProposalCategory::Hotel,
                vec![item("Capsule Inn", 40.0), item("Park Tower", 450.0)],
            ),
            activity: proposal(
                ProposalCategory::Activity,
                vec![item("Tsukiji food walk", 60.0), item("Sumo morning", 120.0)],
            ),
        };

        let pair = assemble_itineraries(&tokyo(), &proposals).expect("should synthesize");

        assert_eq!(pair.budget().flight.as_ref().unwrap().name, "Saver Jet");
        assert_eq!(pair.comfort().flight.as_ref().unwrap().name, "Premium Air");
        assert_eq!(pair.budget().hotel.as_ref().unwrap().name, "Capsule Inn");
        assert_eq!(pair.comfort().hotel.as_ref().unwrap().name, "Park Tower");
        assert_eq!(pair.budget().days.len(), 5);
    }

    #[test]
    fn flags_over_budget_without_clamping() {
        let proposals = Proposals {
            flight: proposal(ProposalCategory::Flight, vec![item("Premium Air", 2500.0)]),
            hotel: proposal(ProposalCategory::Hotel, vec![item("Park Tower", 450.0)]),
            activity: Proposal::empty(ProposalCategory::Activity, BranchStatus::TimedOut),
        };

        let pair = assemble_itineraries(&tokyo(), &proposals).expect("should synthesize");
        let cost = &pair.comfort().total_cost;

        assert_eq!(cost.amount, 2500.0 + 450.0 * 4.0);
        assert!(cost.over_budget);
        assert!(pair
            .comfort()
            .notes
            .iter()
            .any(|note| note == "No activity suggestions available."));
    }

    #[test]
    fn all_empty_proposals_fail() {
        let proposals = Proposals {
            flight: Proposal::empty(ProposalCategory::Flight, BranchStatus::TimedOut),
            hotel: Proposal::empty(ProposalCategory::Hotel, BranchStatus::TimedOut),
            activity: Proposal::empty(
                ProposalCategory::Activity,
                BranchStatus::Failed {
                    reason: "boom".to_string(),
                },
            ),
        };

        assert_eq!(
            assemble_itineraries(&tokyo(), &proposals),
            Err(PlanningError::Synthesis)
        );
    }

    #[test]
    fn schedule_covers_every_day() {
        let request = tokyo();
        let days = default_schedule(&request, None, None, &[item("Shrine visit", 0.0)]);
        assert_eq!(days.len(), 5);
        assert_eq!(days[0].evening, "Shrine visit");
        assert_eq!(days[4].title, "Departure");
    }

    #[test]
    fn themes_cost_only_their_scheduled_activities() {
        let request =
            parse_trip_request("weekend Barcelona getaway").expect("request should parse");
        let proposals = Proposals {
            flight: proposal(ProposalCategory::Flight, vec![item("Vueling", 90.0)]),
            hotel: proposal(ProposalCategory::Hotel, vec![item("Casa Camper", 180.0)]),
            activity: proposal(
                ProposalCategory::Activity,
                vec![
                    item("Tapas tour", 10.0),
                    item("Bunkers sunset", 20.0),
                    item("Liceu opera", 200.0),
                    item("Private yacht", 400.0),
                ],
            ),
        };

        let pair = assemble_itineraries(&request, &proposals).expect("should synthesize");

        assert_eq!(pair.budget().total_cost.breakdown.activities, 30.0);
        assert_eq!(pair.comfort().total_cost.breakdown.activities, 600.0);
        for option in [pair.budget(), pair.comfort()] {
            assert_eq!(option.activities.len(), 2);
            for activity in &option.activities {
                assert!(
                    option.days.iter().any(|day| day.morning == activity.name
                        || day.afternoon == activity.name
                        || day.evening == activity.name),
                    "{} is costed but never scheduled",
                    activity.name
                );
            }
        }
        let comfort_names = pair
            .comfort()
            .activities
            .iter()
            .map(|activity| activity.name.as_str())
            .collect::<Vec<_>>();
        assert!(pair
            .budget()
            .activities
            .iter()
            .all(|activity| !comfort_names.contains(&activity.name.as_str())));
    }

    #[test]
    fn day_trip_schedules_a_single_activity() {
        let request = parse_trip_request("a 1-day trip to Tokyo").expect("request should parse");
        let proposals = Proposals {
            flight: Proposal::empty(ProposalCategory::Flight, BranchStatus::TimedOut),
            hotel: Proposal::empty(ProposalCategory::Hotel, BranchStatus::TimedOut),
            activity: proposal(
                ProposalCategory::Activity,
                vec![
                    item("Shrine visit", 0.0),
                    item("Sushi class", 90.0),
                    item("Skytree", 25.0),
                ],
            ),
        };

        let pair = assemble_itineraries(&request, &proposals).expect("should synthesize");

        assert_eq!(pair.budget().activities.len(), 1);
        assert_eq!(pair.budget().days[0].evening, "Shrine visit");
        assert_eq!(pair.comfort().activities[0].name, "Sushi class");
    }
}
