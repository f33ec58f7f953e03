use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

static FENCED_JSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```(?:json)?\s*\n?([\s\S]*?)\n?```").expect("valid fenced json regex")
});

pub fn parse_json_reply<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let json_str = extract_json(raw)?;
    match serde_json::from_str::<T>(&json_str) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("Failed to parse model JSON: {}", e);
            None
        }
    }
}

pub fn extract_json(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.starts_with('{') && serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
        return Some(trimmed.to_string());
    }

    for cap in FENCED_JSON.captures_iter(s) {
        let potential_json = cap.get(1)?.as_str().trim();
        if serde_json::from_str::<serde_json::Value>(potential_json).is_ok() {
            return Some(potential_json.to_string());
        }
    }

    let brace_start = s.find('{')?;
    let mut depth = 0;
    let mut end = brace_start;

    for (i, c) in s[brace_start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = brace_start + i + 1;
                    break;
                }
            }
            _ => {}
        }
    }

    if depth == 0 && end > brace_start {
        let potential_json = &s[brace_start..end];
        if serde_json::from_str::<serde_json::Value>(potential_json).is_ok() {
            return Some(potential_json.to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Notes {
        summary: String,
    }

    #[test]
    fn parses_direct_json() {
        let notes: Notes = parse_json_reply(r#"{"summary": "Tokyo in spring"}"#).unwrap();
        assert_eq!(notes.summary, "Tokyo in spring");
    }

    #[test]
    fn parses_fenced_json() {
        let raw = "Here you go:\n\n```json\n{\"summary\": \"fenced\"}\n```\n";
        let notes: Notes = parse_json_reply(raw).unwrap();
        assert_eq!(notes.summary, "fenced");
    }

    #[test]
    fn parses_json_embedded_in_prose() {
        let raw = "Sure! {\"summary\": \"inline\"} Hope that helps.";
        let notes: Notes = parse_json_reply(raw).unwrap();
        assert_eq!(notes.summary, "inline");
    }

    #[test]
    fn prose_only_yields_none() {
        assert!(parse_json_reply::<Notes>("no structured data here").is_none());
    }
}
