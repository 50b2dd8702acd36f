//! Token scan heuristics.
//!
//! The token page renders the created token as plain text with no stable
//! attribute on the value itself, so extraction is lexical: find a heading
//! that says "Token", then look nearby for a string shaped like a token.
//! Known UI words are denylisted to keep labels out. Heuristic by necessity,
//! brittle to markup changes by the same necessity.

use crate::selectors;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

/// UI words that look token-shaped but never are.
pub const DENYLIST: &[&str] = &[
    "Read",
    "Trade",
    "Payments",
    "Admin",
    "Never",
    "Token",
    "Scopes",
    "Trading",
    "information",
    "Create",
    "FullAccess",
    "Assessments",
    "Verification",
    "Password",
    "Settings",
    "Account",
    "Login",
    "Deriv",
    "Email",
    "Name",
    "Last",
    "Used",
    "Copy",
    "Hide",
];

/// Tokens are 12-20 alphanumeric characters with no spaces.
fn token_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9]{12,20}$").expect("valid regex"))
}

/// Stricter fallback shape: exactly 15 alphanumeric characters.
fn strict_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9]{15}$").expect("valid regex"))
}

fn is_denied(text: &str) -> bool {
    let lower = text.to_lowercase();
    DENYLIST.iter().any(|word| lower.contains(&word.to_lowercase()))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Scan a rendered-page snapshot for the token value.
///
/// Primary pass: paragraphs within three ancestor levels of an `h5` reading
/// exactly "Token". Fallback: any paragraph/span/code with the strict shape.
/// First match in priority order wins.
pub fn find_token(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    scan_near_token_headings(&document).or_else(|| scan_fallback(&document))
}

fn scan_near_token_headings(document: &Html) -> Option<String> {
    let (Ok(headings), Ok(paragraphs)) = (Selector::parse("h5"), Selector::parse("p")) else {
        return None;
    };
    for heading in document.select(&headings) {
        if element_text(heading) != selectors::TOKEN_HEADING_TEXT {
            continue;
        }
        let mut node = heading.parent();
        for _ in 0..3 {
            let Some(ancestor) = node else { break };
            if let Some(scope) = ElementRef::wrap(ancestor) {
                for paragraph in scope.select(&paragraphs) {
                    let text = element_text(paragraph);
                    if token_pattern().is_match(&text) && !is_denied(&text) {
                        return Some(text);
                    }
                }
            }
            node = ancestor.parent();
        }
    }
    None
}

fn scan_fallback(document: &Html) -> Option<String> {
    let Ok(candidates) = Selector::parse("p, span, code") else {
        return None;
    };
    for element in document.select(&candidates) {
        let text = element_text(element);
        if strict_pattern().is_match(&text) && !is_denied(&text) {
            return Some(text);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_token_next_to_token_heading() {
        let html = r#"
            <div><div>
                <h5>Token</h5>
                <p>ab12CD34ef56</p>
            </div></div>"#;
        assert_eq!(find_token(html), Some("ab12CD34ef56".to_string()));
    }

    #[test]
    fn walks_up_to_three_ancestor_levels() {
        let html = r#"
            <section>
                <div><div><h5>Token</h5></div></div>
                <p>ab12CD34ef56xx</p>
            </section>"#;
        assert_eq!(find_token(html), Some("ab12CD34ef56xx".to_string()));
    }

    #[test]
    fn denylist_rejects_ui_words() {
        // Shape-wise valid (12-20 alphanumerics) but contains denylisted words.
        let html = r#"
            <div>
                <h5>Token</h5>
                <p>Verification</p>
                <p>FullAccess123456</p>
            </div>"#;
        assert_eq!(find_token(html), None);
    }

    #[test]
    fn denylist_is_case_insensitive() {
        let html = r#"<div><h5>Token</h5><p>fullaccess123456</p></div>"#;
        assert_eq!(find_token(html), None);
    }

    #[test]
    fn short_labels_never_match() {
        let html = r#"<div><h5>Token</h5><p>Admin</p><span>ReadThis scope</span></div>"#;
        assert_eq!(find_token(html), None);
    }

    #[test]
    fn fallback_requires_exactly_fifteen_chars() {
        let html = r#"<main><span>xYz123AbC456deF</span><span>toolong12345678901234</span></main>"#;
        assert_eq!(find_token(html), Some("xYz123AbC456deF".to_string()));
    }

    #[test]
    fn primary_match_beats_fallback_match() {
        let html = r#"
            <div>
                <code>fallback0123456</code>
                <div><h5>Token</h5><p>primary12345</p></div>
            </div>"#;
        assert_eq!(find_token(html), Some("primary12345".to_string()));
    }

    #[test]
    fn heading_text_must_be_exact() {
        let html = r#"<div><h5>Tokens</h5><p>ab12CD34ef56</p></div>"#;
        // "Tokens" is not the anchor heading; the 12-char value also fails
        // the 15-char fallback shape.
        assert_eq!(find_token(html), None);
    }
}
