//! Contact, link and language extraction from creator bios

use regex::Regex;
use std::sync::OnceLock;

fn email_regex() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("Invalid regex pattern")
    })
}

/// Full URLs first, then bare hosts of common link-in-bio services
fn link_regex() -> &'static Regex {
    static LINK_RE: OnceLock<Regex> = OnceLock::new();
    LINK_RE.get_or_init(|| {
        Regex::new(r"(?i)https?://\S+|linktr\.ee/\S+|bio\.link/\S+|beacons\.ai/\S+")
            .expect("Invalid regex pattern")
    })
}

fn cjk_regex() -> &'static Regex {
    static CJK_RE: OnceLock<Regex> = OnceLock::new();
    CJK_RE.get_or_init(|| Regex::new(r"[\x{4e00}-\x{9fff}]").expect("Invalid regex pattern"))
}

fn latin_regex() -> &'static Regex {
    static LATIN_RE: OnceLock<Regex> = OnceLock::new();
    LATIN_RE.get_or_init(|| Regex::new(r"[a-zA-Z]").expect("Invalid regex pattern"))
}

/// First email-like substring, or empty
pub fn extract_email(bio: &str) -> String {
    email_regex()
        .find(bio)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// First URL-like substring, or empty
///
/// Trailing punctuation that usually ends a sentence is not part of the link.
pub fn extract_link(bio: &str) -> String {
    link_regex()
        .find(bio)
        .map(|m| {
            m.as_str()
                .trim_end_matches(['.', ',', ';', ')', '!', '?'])
                .to_string()
        })
        .unwrap_or_default()
}

/// Coarse language guess: "zh" when CJK ideographs outnumber Latin letters
///
/// Returns empty for text with neither.
pub fn detect_language(text: &str) -> String {
    let cjk = cjk_regex().find_iter(text).count();
    let latin = latin_regex().find_iter(text).count();

    match (cjk, latin) {
        (0, 0) => String::new(),
        (c, l) if c > l => "zh".to_string(),
        _ => "en".to_string(),
    }
}

/// Platform tag when present, otherwise the bio classifier
pub fn resolve_language(platform_tag: Option<&str>, bio: &str) -> String {
    match platform_tag.map(str::trim) {
        Some(tag) if !tag.is_empty() => tag.to_string(),
        _ => detect_language(bio),
    }
}

/// Platform bio link when present, otherwise the first link in the bio
pub fn resolve_link(platform_link: Option<&str>, bio: &str) -> String {
    match platform_link.map(str::trim) {
        Some(link) if !link.is_empty() => link.to_string(),
        _ => extract_link(bio),
    }
}
