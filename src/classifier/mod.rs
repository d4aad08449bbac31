//! Pure, side-effect-free pre-filter deciding whether a candidate URL is
//! worth enqueueing, and which fetch strategy hint to attach.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const SKIP_EXTENSIONS: &[&str] = &[".pdf", ".jpg", ".jpeg", ".png", ".gif", ".zip", ".exe"];
const JS_HEAVY_DOMAINS: &[&str] = &[
    "twitter.com",
    "instagram.com",
    "facebook.com",
    "tiktok.com",
    "youtube.com",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Html,
    Browser,
    Skip,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Classification::Html => "html",
            Classification::Browser => "browser",
            Classification::Skip => "skip",
        };
        f.write_str(s)
    }
}

/// Evaluate the rules in order. Equal inputs always yield equal outputs.
pub fn classify(payload: &Value) -> Classification {
    let Some(url) = payload.get("url").and_then(Value::as_str) else {
        return Classification::Skip;
    };

    if payload
        .get("render_js")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        return Classification::Browser;
    }

    let lower = url.to_lowercase();

    if SKIP_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return Classification::Skip;
    }

    if JS_HEAVY_DOMAINS.iter().any(|domain| lower.contains(domain)) {
        return Classification::Browser;
    }

    Classification::Html
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifier_table() {
        assert_eq!(
            classify(&json!({"url": "https://x.test/file.pdf"})),
            Classification::Skip
        );
        assert_eq!(
            classify(&json!({"url": "https://twitter.com/u"})),
            Classification::Browser
        );
        assert_eq!(
            classify(&json!({"url": "https://x.test", "render_js": true})),
            Classification::Browser
        );
        assert_eq!(classify(&json!({"url": "https://x.test"})), Classification::Html);
        assert_eq!(classify(&json!({})), Classification::Skip);
    }

    #[test]
    fn render_js_beats_the_extension_and_domain_rules() {
        assert_eq!(
            classify(&json!({"url": "https://x.test/a.pdf", "render_js": true})),
            Classification::Browser
        );
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        assert_eq!(
            classify(&json!({"url": "https://x.test/FILE.PDF"})),
            Classification::Skip
        );
    }

    #[test]
    fn is_deterministic() {
        let payload = json!({"url": "https://x.test"});
        assert_eq!(classify(&payload), classify(&payload));
    }
}
