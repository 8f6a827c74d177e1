use std::borrow::Cow;

const MAX_LOGGED_BODY_CHARS: usize = 2000;
const REDACTED: &str = "[REDACTED]";

const PREFIX_PATTERNS: [&str; 2] = ["sk-", "sess-"];

const MARKER_PATTERNS: [&str; 6] = [
    "Bearer ",
    "bearer ",
    "api_key=",
    "\"api_key\":\"",
    "\"token\":\"",
    "\"credential\":\"",
];

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '+' | '/' | '=')
}

fn token_end(input: &str, from: usize) -> usize {
    input[from..]
        .char_indices()
        .find(|&(_, c)| !is_secret_char(c))
        .map_or(input.len(), |(i, _)| from + i)
}

/// Redact `marker` and the token following it. With `word_start`, a marker
/// glued to a preceding letter or digit ("ask-", "task-") is left alone.
fn redact_after(scrubbed: &mut String, marker: &str, word_start: bool) {
    let mut search_from = 0;
    while let Some(rel) = scrubbed[search_from..].find(marker) {
        let start = search_from + rel;
        let value_start = start + marker.len();

        if word_start
            && scrubbed[..start]
                .chars()
                .next_back()
                .is_some_and(char::is_alphanumeric)
        {
            search_from = value_start;
            continue;
        }

        let end = token_end(scrubbed, value_start);

        // Bare marker with no value after it.
        if end == value_start {
            search_from = value_start;
            continue;
        }

        scrubbed.replace_range(start..end, REDACTED);
        search_from = start + REDACTED.len();
    }
}

/// Redact API keys, bearer tokens and session credentials from text that is
/// about to be logged.
pub fn scrub_secret_patterns(input: &str) -> Cow<'_, str> {
    let needs_scrubbing = PREFIX_PATTERNS
        .iter()
        .chain(MARKER_PATTERNS.iter())
        .any(|pattern| input.contains(pattern));
    if !needs_scrubbing {
        return Cow::Borrowed(input);
    }

    let mut scrubbed = input.to_string();
    for prefix in PREFIX_PATTERNS {
        redact_after(&mut scrubbed, prefix, true);
    }
    for marker in MARKER_PATTERNS {
        redact_after(&mut scrubbed, marker, false);
    }
    Cow::Owned(scrubbed)
}

/// Scrub and truncate a wire body for diagnostic logging.
pub fn loggable_body(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);
    if scrubbed.chars().count() <= MAX_LOGGED_BODY_CHARS {
        return scrubbed.into_owned();
    }

    let end = scrubbed
        .char_indices()
        .nth(MAX_LOGGED_BODY_CHARS)
        .map_or(scrubbed.len(), |(i, _)| i);
    format!("{}...", &scrubbed[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_is_borrowed() {
        let out = scrub_secret_patterns("{\"model\":\"gpt-3.5-turbo\"}");
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn redacts_openai_key_prefix() {
        let out = scrub_secret_patterns("invalid key sk-proj-abc123XYZ provided");
        assert_eq!(out, "invalid key [REDACTED] provided");
    }

    #[test]
    fn redacts_bearer_header_value() {
        let out = scrub_secret_patterns("Authorization: Bearer abc.def-123");
        assert!(!out.contains("abc.def-123"));
        assert!(out.contains(REDACTED));
    }

    #[test]
    fn redacts_json_token_field() {
        let out = scrub_secret_patterns(r#"{"token":"wx-session-42","ok":true}"#);
        assert!(!out.contains("wx-session-42"));
        assert!(out.contains("\"ok\":true"));
    }

    #[test]
    fn key_prefix_inside_a_word_is_not_a_key() {
        let out = scrub_secret_patterns("ask-me about the task-list or a possess-ion");
        assert_eq!(out, "ask-me about the task-list or a possess-ion");
    }

    #[test]
    fn key_prefix_after_punctuation_is_redacted() {
        let out = scrub_secret_patterns("key=sk-live42 (sess-abc) ask-me");
        assert_eq!(out, "key=[REDACTED] ([REDACTED]) ask-me");
    }

    #[test]
    fn bare_marker_is_left_alone() {
        let out = scrub_secret_patterns("use Bearer  auth");
        assert_eq!(out, "use Bearer  auth");
    }

    #[test]
    fn loggable_body_truncates_on_char_boundary() {
        let long = "调".repeat(MAX_LOGGED_BODY_CHARS + 10);
        let out = loggable_body(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), MAX_LOGGED_BODY_CHARS + 3);
    }
}
