//! PII redaction for event payloads, URLs, and selectors.
//!
//! Pure functions over JSON values: no state, no side effects, safe to run on
//! every event before it leaves the client. Filtering is idempotent — the
//! replacement tokens never match any of the patterns.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use url::Url;

/// Query parameters stripped wholesale from URLs.
const STRIPPED_QUERY_PARAMS: [&str; 7] = [
    "token", "key", "password", "secret", "api_key", "auth", "session",
];

/// Ordered substitution pass applied to every string leaf.
/// Card precedes phone/SSN so long digit runs are consumed first.
static SUBSTITUTIONS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap(),
            "[REDACTED_EMAIL]",
        ),
        (
            Regex::new(r"\b(?:\d[ -]?){13,16}\b").unwrap(),
            "[REDACTED_CARD]",
        ),
        (
            Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap(),
            "[REDACTED_SSN]",
        ),
        (
            Regex::new(r"\b(?:\+?\d{1,2}[\s.-]?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]\d{4}\b").unwrap(),
            "[REDACTED_PHONE]",
        ),
        (
            Regex::new(r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b").unwrap(),
            "[REDACTED_IP]",
        ),
    ]
});

/// Sensitive query parameters embedded in arbitrary strings.
static QUERY_PARAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([?&](?:token|key|password|secret|api_key|auth|session)=)[^&\s]+").unwrap()
});

static SELECTOR_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[A-Za-z0-9_-]+").unwrap());

static SELECTOR_DATA_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[data-[^\]]*\]").unwrap());

/// Privacy filter configuration.
#[derive(Debug, Clone)]
pub struct PrivacyConfig {
    /// Keys whose whole value is replaced (case-insensitive substring match)
    pub sensitive_fields: Vec<String>,
    /// Drop user agent and whole query strings
    pub strict: bool,
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        Self {
            sensitive_fields: [
                "password", "secret", "token", "api_key", "apikey", "auth", "ssn", "credit",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            strict: false,
        }
    }
}

impl PrivacyConfig {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }
}

/// Redacts PII from arbitrary event payloads and sanitizes URLs/selectors.
#[derive(Debug, Clone, Default)]
pub struct PrivacyFilter {
    config: PrivacyConfig,
}

impl PrivacyFilter {
    pub fn new(config: PrivacyConfig) -> Self {
        Self { config }
    }

    pub fn is_strict(&self) -> bool {
        self.config.strict
    }

    /// Recursively filters a JSON value.
    ///
    /// Sensitive-key replacement takes precedence over the per-string
    /// substitution pass: a matching key loses its entire value regardless
    /// of content.
    pub fn filter_value(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, val)| {
                        if self.is_sensitive_key(key) {
                            (key.clone(), Value::String("[REDACTED]".to_string()))
                        } else {
                            (key.clone(), self.filter_value(val))
                        }
                    })
                    .collect(),
            ),
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| self.filter_value(item)).collect())
            }
            Value::String(s) => Value::String(self.filter_string(s)),
            other => other.clone(),
        }
    }

    /// Applies the ordered substitution pass to a single string.
    pub fn filter_string(&self, input: &str) -> String {
        let mut out = QUERY_PARAM_RE
            .replace_all(input, "${1}[REDACTED]")
            .into_owned();
        for (pattern, replacement) in SUBSTITUTIONS.iter() {
            out = pattern.replace_all(&out, *replacement).into_owned();
        }
        out
    }

    /// Strips sensitive query parameters from a URL, then runs the
    /// substitution pass. Malformed URLs fall back to raw-string filtering.
    pub fn sanitize_url(&self, raw: &str) -> String {
        match Url::parse(raw) {
            Ok(mut url) => {
                if self.config.strict {
                    url.set_query(None);
                } else if url.query().is_some() {
                    let kept: Vec<(String, String)> = url
                        .query_pairs()
                        .filter(|(key, _)| {
                            !STRIPPED_QUERY_PARAMS.contains(&key.to_ascii_lowercase().as_str())
                        })
                        .map(|(key, val)| (key.into_owned(), val.into_owned()))
                        .collect();
                    if kept.is_empty() {
                        url.set_query(None);
                    } else {
                        url.query_pairs_mut().clear().extend_pairs(kept);
                    }
                }
                self.filter_string(url.as_str())
            }
            Err(_) => self.filter_string(raw),
        }
    }

    /// Collapses a CSS selector to tag + class: `#id` fragments and `data-*`
    /// attribute predicates are stripped. Returns `unknown` if nothing
    /// survives.
    pub fn sanitize_selector(&self, selector: &str) -> String {
        let stripped = SELECTOR_ID_RE.replace_all(selector, "");
        let stripped = SELECTOR_DATA_ATTR_RE.replace_all(&stripped, "");
        let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            "unknown".to_string()
        } else {
            collapsed
        }
    }

    fn is_sensitive_key(&self, key: &str) -> bool {
        let lower = key.to_ascii_lowercase();
        self.config
            .sensitive_fields
            .iter()
            .any(|field| lower.contains(field.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_email_and_phone() {
        let filter = PrivacyFilter::default();
        let input = json!({ "email": "a@b.com", "phone": "555-123-4567" });
        let output = filter.filter_value(&input);
        assert_eq!(output["email"], "[REDACTED_EMAIL]");
        assert_eq!(output["phone"], "[REDACTED_PHONE]");
    }

    #[test]
    fn filtering_is_idempotent() {
        let filter = PrivacyFilter::default();
        let input = json!({
            "email": "a@b.com",
            "phone": "555-123-4567",
            "card": "4111 1111 1111 1111",
            "note": "ssn 123-45-6789 from 10.0.0.1"
        });
        let once = filter.filter_value(&input);
        let twice = filter.filter_value(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn sensitive_key_wins_over_string_pass() {
        let filter = PrivacyFilter::default();
        let input = json!({ "password": "hunter2", "apiKeyId": 42 });
        let output = filter.filter_value(&input);
        assert_eq!(output["password"], "[REDACTED]");
        // substring match is case-insensitive
        assert_eq!(output["apiKeyId"], "[REDACTED]");
    }

    #[test]
    fn redacts_nested_structures() {
        let filter = PrivacyFilter::default();
        let input = json!({
            "form": { "fields": [ { "value": "jane@doe.org" } ] }
        });
        let output = filter.filter_value(&input);
        assert_eq!(output["form"]["fields"][0]["value"], "[REDACTED_EMAIL]");
    }

    #[test]
    fn sanitize_url_strips_sensitive_params() {
        let filter = PrivacyFilter::default();
        let out = filter.sanitize_url("https://example.com/search?q=rust&token=abc123&page=2");
        assert!(out.contains("q=rust"));
        assert!(out.contains("page=2"));
        assert!(!out.contains("abc123"));
    }

    #[test]
    fn sanitize_url_handles_malformed_input() {
        let filter = PrivacyFilter::default();
        let out = filter.sanitize_url("not a url, contact a@b.com");
        assert_eq!(out, "not a url, contact [REDACTED_EMAIL]");
    }

    #[test]
    fn strict_mode_drops_whole_query() {
        let filter = PrivacyFilter::new(PrivacyConfig::strict());
        let out = filter.sanitize_url("https://example.com/search?q=rust&page=2");
        assert!(!out.contains('?'));
    }

    #[test]
    fn sanitize_selector_collapses_to_tag_and_class() {
        let filter = PrivacyFilter::default();
        assert_eq!(
            filter.sanitize_selector("button.primary#submit-btn[data-user-id=\"42\"]"),
            "button.primary"
        );
        assert_eq!(filter.sanitize_selector("#only-an-id"), "unknown");
    }
}
