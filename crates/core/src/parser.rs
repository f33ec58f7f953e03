use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::PlanningError;
use crate::models::{
    Budget, BudgetTier, TripDates, TripRequest, DEFAULT_CURRENCY, DEFAULT_DURATION_DAYS,
    WEEKEND_DURATION_DAYS,
};

const MAX_DURATION_DAYS: u32 = 60;
const MAX_PARTY_SIZE: u32 = 20;
const MAX_CHILD_AGE: u32 = 17;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

const FILLER_WORDS: &[&str] = &[
    "i", "a", "an", "the", "my", "our", "me", "we", "us", "plan", "planning", "trip", "weekend",
    "week", "day", "days", "budget", "luxury", "cheap", "family", "romantic", "quick", "short",
    "long", "summer", "winter", "spring", "autumn", "fall", "christmas", "easter", "please",
    "help", "something", "somewhere", "anywhere", "fun", "go", "travel", "holiday", "vacation",
    "getaway", "next", "this", "solo", "honeymoon", "sept",
];

const KNOWN_DESTINATIONS: &[&str] = &[
    "New York",
    "Los Angeles",
    "San Francisco",
    "Las Vegas",
    "Rio de Janeiro",
    "Buenos Aires",
    "Hong Kong",
    "Kuala Lumpur",
    "Cape Town",
    "Mexico City",
    "New Zealand",
    "Tokyo",
    "Kyoto",
    "Osaka",
    "Seoul",
    "Taipei",
    "Shanghai",
    "Beijing",
    "Bangkok",
    "Phuket",
    "Chiang Mai",
    "Bali",
    "Singapore",
    "Penang",
    "Langkawi",
    "Hanoi",
    "Ho Chi Minh City",
    "Delhi",
    "Mumbai",
    "Maldives",
    "Dubai",
    "Istanbul",
    "Cairo",
    "Marrakech",
    "Nairobi",
    "Paris",
    "London",
    "Rome",
    "Florence",
    "Venice",
    "Milan",
    "Barcelona",
    "Madrid",
    "Seville",
    "Lisbon",
    "Porto",
    "Amsterdam",
    "Berlin",
    "Munich",
    "Prague",
    "Vienna",
    "Budapest",
    "Zurich",
    "Copenhagen",
    "Stockholm",
    "Reykjavik",
    "Dublin",
    "Edinburgh",
    "Athens",
    "Santorini",
    "Dubrovnik",
    "Sydney",
    "Melbourne",
    "Toronto",
    "Vancouver",
    "Montreal",
    "Chicago",
    "Miami",
    "Honolulu",
    "Hawaii",
    "Cancun",
    "Havana",
    "Lima",
    "Cusco",
    "Patagonia",
    "Japan",
    "Thailand",
    "Malaysia",
    "Vietnam",
    "Indonesia",
    "Korea",
    "India",
    "Italy",
    "Spain",
    "Portugal",
    "France",
    "Germany",
    "Greece",
    "Iceland",
    "Ireland",
    "Scotland",
    "Croatia",
    "Morocco",
    "Egypt",
    "Mexico",
    "Peru",
    "Australia",
    "Canada",
];

static STRONG_PLACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?i:to|visit|visiting|explore|exploring|towards|see)\s+(?:(?i:the)\s+)?(\p{Lu}[\p{L}'.-]*(?:\s+\p{Lu}[\p{L}'.-]*)*)",
    )
    .expect("valid destination regex")
});

static IN_PLACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?i:in|around|at)\s+(?:(?i:the)\s+)?(\p{Lu}[\p{L}'.-]*(?:\s+\p{Lu}[\p{L}'.-]*)*)",
    )
    .expect("valid destination regex")
});

static PLACE_BEFORE_TRIP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(\p{Lu}[\p{L}'.-]*(?:\s+\p{Lu}[\p{L}'.-]*)*)\s+(?i:trip|getaway|vacation|holiday|break|adventure|escape|tour|itinerary)\b",
    )
    .expect("valid destination regex")
});

static ORIGIN_PLACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?i:from|leaving|departing)\s+(?:(?i:the)\s+)?(\p{Lu}[\p{L}'.-]*(?:\s+\p{Lu}[\p{L}'.-]*)*)",
    )
    .expect("valid origin regex")
});

static GAZETTEER: Lazy<Regex> = Lazy::new(|| {
    let mut names = KNOWN_DESTINATIONS
        .iter()
        .map(|name| regex::escape(&name.to_lowercase()))
        .collect::<Vec<_>>();
    names.sort_by_key(|name| std::cmp::Reverse(name.len()));
    Regex::new(&format!(r"\b(?:{})\b", names.join("|"))).expect("valid gazetteer regex")
});

static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(\d{1,3}|an?|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|thirteen|fourteen)\s*-?\s*(days?|nights?|weeks?)\b",
    )
    .expect("valid duration regex")
});

static DATE_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(\d{4}-\d{2}-\d{2})\b(?:\s*(?:to|until|through|till|-|–)\s*(\d{4}-\d{2}-\d{2})\b)?",
    )
    .expect("valid date regex")
});

static MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(january|february|march|april|may|june|july|august|september|sept|october|november|december)\b")
        .expect("valid month regex")
});

// "may" and "march" only count as months after one of these words.
const MONTH_CUES: &[&str] = &[
    "in", "during", "this", "next", "early", "late", "mid", "of", "until", "from", "by",
];

static SYMBOL_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([$€£¥])\s?(\d[\d,]*(?:\.\d+)?)\s?([kK])?\b").expect("valid amount regex")
});

static CODE_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(\d[\d,]*(?:\.\d+)?)\s?(k)?\s*(usd|eur|gbp|jpy|myr|aud|cad|sgd|dollars?|euros?|pounds?|yen|ringgit)\b",
    )
    .expect("valid amount regex")
});

static BARE_BUDGET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bbudget(?:\s+(?:of|is|around|about|under|max))?\s*:?\s*(\d[\d,]*(?:\.\d+)?)\s?(k)?\b",
    )
    .expect("valid amount regex")
});

static PARTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(\d{1,2}|two|three|four|five|six|seven|eight|nine|ten)\s+(?:people|persons|travell?ers|adults|friends|guests|pax)\b",
    )
    .expect("valid party regex")
});

static GROUP_OF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:family|group|party) of (\d{1,2}|two|three|four|five|six|seven|eight|nine|ten)\b|\b(\d{1,2}|two|three|four|five|six|seven|eight|nine|ten) of us\b",
    )
    .expect("valid party regex")
});

static AGE_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bages?\s+((?:\d{1,2}(?:\s*(?:,|and|&)\s*)?)+)").expect("valid ages regex")
});

static YEARS_OLD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})\s*-?\s*(?:years?|yrs?|yo)\b(?:\s*-?\s*old)?")
        .expect("valid ages regex")
});

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{1,2}").expect("valid number regex"));

static INTERESTS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        (
            "food",
            r"\b(?:food|foodie|culinary|cuisine|restaurants?|street food|eat|eating|ramen|sushi|tapas|wine|dining)\b",
        ),
        (
            "culture",
            r"\b(?:culture|cultural|temples?|shrines?|traditions?|traditional|festivals?|local life)\b",
        ),
        (
            "history",
            r"\b(?:history|historic|historical|castles?|ruins|heritage)\b",
        ),
        (
            "art",
            r"\b(?:art|arts|museums?|gallery|galleries|architecture)\b",
        ),
        (
            "nature",
            r"\b(?:nature|hiking|hike|mountains?|parks?|wildlife|outdoors|cherry blossoms?)\b",
        ),
        (
            "beach",
            r"\b(?:beach|beaches|coast|islands?|snorkell?ing|surfing|surf)\b",
        ),
        (
            "nightlife",
            r"\b(?:nightlife|bars?|clubs?|clubbing|party|parties)\b",
        ),
        (
            "adventure",
            r"\b(?:adventure|adventurous|adrenaline|diving|trekking|kayaking|rafting)\b",
        ),
        (
            "shopping",
            r"\b(?:shopping|shop|markets?|boutiques?)\b",
        ),
        (
            "relaxation",
            r"\b(?:relax|relaxing|relaxation|spa|wellness|slow-paced|chill)\b",
        ),
    ]
    .into_iter()
    .map(|(tag, pattern)| (tag, Regex::new(pattern).expect("valid interest regex")))
    .collect()
});

const LUXURY_CUES: &[&str] = &[
    "luxury",
    "luxurious",
    "splurge",
    "5-star",
    "five star",
    "five-star",
    "high-end",
    "premium",
    "lavish",
];

const BUDGET_CUES: &[&str] = &[
    "cheap",
    "on a budget",
    "budget trip",
    "budget travel",
    "budget-friendly",
    "low budget",
    "low-cost",
    "affordable",
    "backpack",
    "shoestring",
];

const COUPLE_CUES: &[&str] = &[
    "couple",
    "honeymoon",
    "anniversary",
    "my wife",
    "my husband",
    "my partner",
    "my girlfriend",
    "my boyfriend",
];

const KID_CUES: &[&str] = &[
    "kid", "kids", "child", "children", "son", "daughter", "toddler", "baby", "family",
];

pub fn normalize_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

pub fn parse_trip_request(text: &str) -> Result<TripRequest, PlanningError> {
    let normalized = normalize_text(text);
    let lower = normalized.to_lowercase();

    let origin = detect_origin(&normalized);
    let destination =
        detect_destination(&normalized, origin.as_deref()).ok_or(PlanningError::Parse)?;

    let (start_date, range_days) = detect_dates(&normalized);
    let month = detect_month(&normalized).or_else(|| {
        start_date.map(|date| MONTHS[date.month0() as usize].to_string())
    });
    let duration_days = range_days
        .or_else(|| detect_duration(&lower))
        .unwrap_or(DEFAULT_DURATION_DAYS)
        .clamp(1, MAX_DURATION_DAYS);

    let tier_cue = detect_budget_tier(&lower);
    let (amount, currency) = match detect_budget_amount(&normalized) {
        Some((amount, currency)) => (Some(amount), currency),
        None => (None, DEFAULT_CURRENCY.to_string()),
    };

    let kid_ages = detect_kid_ages(&lower);
    let has_kid_cue = !kid_ages.is_empty() || contains_word_any(&lower, KID_CUES);
    let party_size = detect_party_size(&lower, kid_ages.len() as u32);

    let mut interests = detect_interests(&lower);
    if let Some(tier) = tier_cue {
        interests.insert(tier.as_str().to_string());
    }
    if has_kid_cue {
        interests.insert("family".to_string());
    }

    Ok(TripRequest {
        destination,
        origin,
        dates: TripDates {
            duration_days,
            month,
            start_date,
        },
        budget: Budget {
            amount,
            currency,
            tier: tier_cue.unwrap_or(BudgetTier::Moderate),
        },
        interests,
        party_size,
        kid_ages,
        raw_text: normalized,
    })
}

fn detect_destination(text: &str, origin: Option<&str>) -> Option<String> {
    let lower = text.to_lowercase();
    let not_origin = |place: &str| {
        origin
            .map(|origin| !origin.eq_ignore_ascii_case(place))
            .unwrap_or(true)
    };

    if let Some(place) = first_place(&STRONG_PLACE, text).filter(|place| not_origin(place)) {
        return Some(place);
    }

    for found in GAZETTEER.find_iter(&lower) {
        let before = lower[..found.start()].trim_end();
        if before.ends_with("from") || before.ends_with("leaving") {
            continue;
        }
        if let Some(name) = KNOWN_DESTINATIONS
            .iter()
            .find(|name| name.to_lowercase() == found.as_str())
        {
            return Some((*name).to_string());
        }
    }

    first_place(&IN_PLACE, text)
        .filter(|place| not_origin(place))
        .or_else(|| first_place(&PLACE_BEFORE_TRIP, text).filter(|place| not_origin(place)))
}

fn detect_origin(text: &str) -> Option<String> {
    if let Some(place) = first_place(&ORIGIN_PLACE, text) {
        return Some(place);
    }

    let lower = text.to_lowercase();
    GAZETTEER.find_iter(&lower).find_map(|found| {
        let before = lower[..found.start()].trim_end();
        if !(before.ends_with("from") || before.ends_with("leaving")) {
            return None;
        }
        KNOWN_DESTINATIONS
            .iter()
            .find(|name| name.to_lowercase() == found.as_str())
            .map(|name| (*name).to_string())
    })
}

fn first_place(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .find_map(|phrase| clean_place(phrase.as_str()))
}

fn clean_place(phrase: &str) -> Option<String> {
    let is_filler = |token: &&str| {
        let word = token
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        word.is_empty()
            || FILLER_WORDS.contains(&word.as_str())
            || WEEKDAYS.contains(&word.as_str())
            || MONTHS.iter().any(|month| month.eq_ignore_ascii_case(&word))
    };

    let tokens = phrase.split_whitespace().collect::<Vec<_>>();
    let start = tokens.iter().position(|token| !is_filler(token))?;
    let end = tokens.iter().rposition(|token| !is_filler(token))?;

    let place = tokens[start..=end]
        .join(" ")
        .trim_end_matches(['.', ',', '\'', '-'])
        .to_string();
    if place.is_empty() {
        None
    } else {
        Some(place)
    }
}

fn detect_dates(text: &str) -> (Option<NaiveDate>, Option<u32>) {
    let Some(caps) = DATE_RANGE.captures(text) else {
        return (None, None);
    };

    let start = caps
        .get(1)
        .and_then(|value| NaiveDate::parse_from_str(value.as_str(), "%Y-%m-%d").ok());
    let end = caps
        .get(2)
        .and_then(|value| NaiveDate::parse_from_str(value.as_str(), "%Y-%m-%d").ok());

    let days = match (start, end) {
        (Some(start), Some(end)) if end > start => Some((end - start).num_days() as u32),
        _ => None,
    };
    (start, days)
}

fn detect_month(text: &str) -> Option<String> {
    MONTH.find_iter(text).find_map(|found| {
        let word = found.as_str().to_lowercase();
        if matches!(word.as_str(), "may" | "march") && !reads_as_month(text, found.start()) {
            return None;
        }
        let name = if word == "sept" { "september" } else { word.as_str() };
        MONTHS
            .iter()
            .find(|month| month.eq_ignore_ascii_case(name))
            .map(|month| (*month).to_string())
    })
}

fn reads_as_month(text: &str, start: usize) -> bool {
    let before = text[..start].trim_end();
    let previous = before
        .rsplit(|c: char| c.is_whitespace())
        .next()
        .unwrap_or_default();
    if MONTH_CUES.contains(&previous.to_lowercase().as_str()) {
        return true;
    }

    let capitalised = text[start..].starts_with(|c: char| c.is_uppercase());
    let sentence_start = before.is_empty() || before.ends_with(['.', '!', '?']);
    capitalised && !sentence_start
}

fn detect_duration(lower: &str) -> Option<u32> {
    if let Some(caps) = DURATION.captures(lower) {
        let count = word_number(caps.get(1)?.as_str())?;
        let unit = caps.get(2)?.as_str();
        return Some(if unit.starts_with("night") {
            count + 1
        } else if unit.starts_with("week") {
            count * 7
        } else {
            count
        });
    }

    if lower.contains("fortnight") {
        Some(14)
    } else if lower.contains("long weekend") {
        Some(WEEKEND_DURATION_DAYS + 1)
    } else if lower.contains("weekend") {
        Some(WEEKEND_DURATION_DAYS)
    } else {
        None
    }
}

fn detect_budget_tier(lower: &str) -> Option<BudgetTier> {
    if contains_any(lower, LUXURY_CUES) {
        Some(BudgetTier::Luxury)
    } else if contains_any(lower, BUDGET_CUES) {
        Some(BudgetTier::Budget)
    } else {
        None
    }
}

fn detect_budget_amount(text: &str) -> Option<(f64, String)> {
    if let Some(caps) = SYMBOL_AMOUNT.captures(text) {
        let currency = match caps.get(1)?.as_str() {
            "€" => "EUR",
            "£" => "GBP",
            "¥" => "JPY",
            _ => "USD",
        };
        let amount = parse_amount(caps.get(2)?.as_str(), caps.get(3).is_some())?;
        return Some((amount, currency.to_string()));
    }

    if let Some(caps) = CODE_AMOUNT.captures(text) {
        let amount = parse_amount(caps.get(1)?.as_str(), caps.get(2).is_some())?;
        let code = caps.get(3)?.as_str().to_lowercase();
        let currency = match code.as_str() {
            "dollar" | "dollars" => "USD".to_string(),
            "euro" | "euros" => "EUR".to_string(),
            "pound" | "pounds" => "GBP".to_string(),
            "yen" => "JPY".to_string(),
            "ringgit" => "MYR".to_string(),
            other => other.to_uppercase(),
        };
        return Some((amount, currency));
    }

    let caps = BARE_BUDGET.captures(text)?;
    let amount = parse_amount(caps.get(1)?.as_str(), caps.get(2).is_some())?;
    Some((amount, DEFAULT_CURRENCY.to_string()))
}

fn parse_amount(digits: &str, thousands: bool) -> Option<f64> {
    let value = digits.replace(',', "").parse::<f64>().ok()?;
    let value = if thousands { value * 1_000.0 } else { value };
    (value.is_finite() && value > 0.0).then_some(value)
}

fn detect_kid_ages(lower: &str) -> Vec<u8> {
    if !contains_word_any(lower, KID_CUES) && !lower.contains("year old") {
        return Vec::new();
    }

    let mut ages = AGE_LIST
        .captures_iter(lower)
        .filter_map(|caps| caps.get(1))
        .flat_map(|list| {
            NUMBER
                .find_iter(list.as_str())
                .filter_map(|age| age.as_str().parse::<u32>().ok())
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    if ages.is_empty() {
        ages = YEARS_OLD
            .captures_iter(lower)
            .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
            .collect();
    }

    ages.into_iter()
        .filter(|age| *age <= MAX_CHILD_AGE)
        .map(|age| age as u8)
        .collect()
}

fn detect_party_size(lower: &str, kids: u32) -> u8 {
    let explicit = PARTY
        .captures(lower)
        .and_then(|caps| caps.get(1))
        .or_else(|| {
            GROUP_OF
                .captures(lower)
                .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        })
        .and_then(|value| word_number(value.as_str()));

    let size = match explicit {
        Some(count) => count.max(kids + 1),
        None => {
            let adults = if contains_any(lower, COUPLE_CUES) { 2 } else { 1 };
            adults + kids
        }
    };
    size.clamp(1, MAX_PARTY_SIZE) as u8
}

fn detect_interests(lower: &str) -> BTreeSet<String> {
    INTERESTS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(lower))
        .map(|(tag, _)| (*tag).to_string())
        .collect()
}

fn word_number(value: &str) -> Option<u32> {
    if let Ok(number) = value.parse::<u32>() {
        return Some(number);
    }
    Some(match value {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "thirteen" => 13,
        "fourteen" => 14,
        _ => return None,
    })
}

fn contains_any(input: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| input.contains(needle))
}

fn contains_word_any(input: &str, words: &[&str]) -> bool {
    input
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| words.contains(&token))
}
