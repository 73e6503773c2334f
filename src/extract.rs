//! Heuristic extraction of user key, memory content, tag, and search query
//! from free-form text.
//!
//! Each extractor walks a fixed, priority-ordered list of patterns and returns
//! the first trimmed, non-empty capture. Nothing here fails; no match is `None`.
//! Structured tool-call arguments from the model always take precedence over
//! these guesses.

use regex::Regex;
use std::sync::LazyLock;

use crate::agent::UserSession;

/// Characters allowed in user keys and tags.
const IDENT: &str = r"['\x22]?([A-Za-z0-9_.\-]+)";

fn compile(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("extractor patterns are valid"))
        .collect()
}

static USER_KEY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        // "my user key is alice_01", "user id: bob", "username = carol"
        format!(
            r"(?i)\b(?:user\s*(?:key|id|name)|userid|username|account\s*(?:key|id)|identifier)(?:\s+is\s+|\s*[:=]\s*|\s+){IDENT}"
        ),
        // "list memories for user bob"
        format!(r"(?i)\bfor\s+(?:user|account)\s+{IDENT}"),
        // "User: john_doe"
        format!(r"(?i)\buser\s*[:=]\s*{IDENT}"),
    ])
});

/// "I am alice_smith", "I'm 'bob'". Group 1 is a quoted key, group 2 a bare word.
static INTRODUCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(?:^|[\s,.;!?])(?:i\s+am|i'm)\s+(?:['"]([A-Za-z0-9_.\-]+)['"]|([A-Za-z0-9_.\-]+))"#,
    )
    .expect("introduction pattern is valid")
});

/// Words that follow "user key" and friends in ordinary sentences.
const NOT_A_USER_KEY: &[&str] = &[
    "a", "an", "the", "my", "your", "our", "and", "or", "to", "of", "for", "not", "is", "so",
    "here", "field", "please", "again", "also", "in", "at", "on", "from",
];

static CONTENT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        // "I want to remember that ...", "I'd like to save ..."
        r"(?i)\b(?:i\s+want\s+to|i\s+need\s+to|i'd\s+like\s+to|i\s+would\s+like\s+to|want\s+to|need\s+to)\s+(?:remember|save|store)(?:\s+(?:that|this))?\s*:?\s+(.+)".to_string(),
        // "Remember that ...", "please save this memory: ...", "..., store that ..."
        r"(?i)(?:^|[,.;!?]\s*|\bplease\s+|\balso\s+|\band\s+)(?:remember|save|store|create|add)(?:\s+(?:that|this|about|(?:a\s+)?(?:new\s+)?memory)\b)*\s*:?\s+(.+)".to_string(),
        // "memory: ...", "content is ..."
        r"(?i)\b(?:memory|content)(?:\s+is\s+|\s*:\s*)(.+)".to_string(),
    ])
});

/// A tag instruction at the end of a memory: ", tag it as work", "with tag travel".
static TRAILING_TAG_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)[\s,;]*(?:\band\s+)?(?:\btag(?:ged)?\s+(?:it\s+)?as|\b(?:with|using)\s+(?:the\s+)?tag|\b(?:tag|category|label)(?:\s+is\s+|\s*[:=]))\s*['"]?[A-Za-z0-9_.\-]+['"]?[\s.!]*$"#,
    )
    .expect("tag clause pattern is valid")
});

static QUERY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        // "search for memories about travel", "show me memories containing Paris"
        r"(?i)\b(?:search|find|look|show)(?:\s+(?:for|me|my|all|up|through))*\s+memories\s+(?:about|containing|with|on|regarding)\s+(.+)".to_string(),
        // "what memories about work ..."
        r"(?i)\bwhat\s+(?:memories|content)\s+(?:about|containing|with)\s+(.+)".to_string(),
        // "memories about travel"
        r"(?i)\bmemories\s+(?:about|containing|regarding)\s+(.+)".to_string(),
    ])
});

static TAG_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        // "tag is work", "category: travel"
        format!(r"(?i)\b(?:tag|category|label)(?:\s+is\s+|\s*[:=]\s*){IDENT}"),
        // "with tag work", "using the tag travel"
        format!(r"(?i)\b(?:with|using)\s+(?:the\s+)?tag\s+{IDENT}"),
        // "tag it as work", "tagged as personal"
        format!(r"(?i)\btag(?:ged)?\s+(?:it\s+)?as\s+{IDENT}"),
        // "tagged work"
        format!(r"(?i)\btagged\s+{IDENT}"),
    ])
});

/// First non-empty, trimmed capture across `patterns`, in order, that passes `accept`.
fn first_capture(
    patterns: &[Regex],
    input: &str,
    accept: impl Fn(&str) -> bool,
) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(input)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty() && accept(s))
            .map(str::to_string)
    })
}

/// Identifiers end at sentence punctuation: "alice_01." is "alice_01".
fn clean_ident(raw: &str) -> &str {
    raw.trim_end_matches(['.', '-'])
}

fn is_stopword(candidate: &str) -> bool {
    NOT_A_USER_KEY.contains(&candidate.to_ascii_lowercase().as_str())
}

/// Bare words after "I am" are usually adjectives or ages, so only accept
/// ones shaped like an account key: `alice_01`, `bob.smith`, `user123`.
fn looks_like_key(candidate: &str) -> bool {
    let has_separator = candidate.contains(['_', '.', '-']);
    let has_digit = candidate.chars().any(|c| c.is_ascii_digit());
    let has_letter = candidate.chars().any(|c| c.is_ascii_alphabetic());
    has_letter && (has_separator || has_digit)
}

fn explicit_user_key(input: &str) -> Option<String> {
    USER_KEY_PATTERNS.iter().find_map(|re| {
        re.captures(input)
            .and_then(|caps| caps.get(1))
            .map(|m| clean_ident(m.as_str()))
            .filter(|s| !s.is_empty() && !is_stopword(s))
            .map(str::to_string)
    })
}

fn introduced_user_key(input: &str) -> Option<String> {
    INTRODUCTION.captures_iter(input).find_map(|caps| {
        if let Some(quoted) = caps.get(1) {
            let key = clean_ident(quoted.as_str());
            return (!key.is_empty() && !is_stopword(key)).then(|| key.to_string());
        }
        let bare = clean_ident(caps.get(2)?.as_str());
        looks_like_key(bare).then(|| bare.to_string())
    })
}

/// The user key mentioned in `input`, else the session's current user.
///
/// Explicit phrasings ("user key is X", "for user X") win over introductions
/// ("I am X"); an introduction only counts when X is quoted or key-shaped.
pub fn extract_user_key(input: &str, session: &UserSession) -> Option<String> {
    explicit_user_key(input)
        .or_else(|| introduced_user_key(input))
        .or_else(|| session.current_user.clone())
}

/// The text after an imperative like "remember that ..." or "save ...",
/// without a trailing tag instruction.
pub fn extract_memory_content(input: &str) -> Option<String> {
    let content = first_capture(&CONTENT_PATTERNS, input, |_| true)?;
    let stripped = TRAILING_TAG_CLAUSE.replace(&content, "");
    let stripped = stripped.trim();
    (!stripped.is_empty()).then(|| stripped.to_string())
}

/// The subject of a "search/find/show ... memories about X" request. Plain
/// "show my memories" style requests have no subject and yield `None`.
pub fn extract_search_query(input: &str) -> Option<String> {
    first_capture(&QUERY_PATTERNS, input, |_| true)
        .map(|q| q.trim_end_matches(['?', '!', '.']).trim_end().to_string())
        .filter(|q| !q.is_empty())
}

/// The tag in "tag is X", "tagged as X", or "with tag X".
pub fn extract_tag(input: &str) -> Option<String> {
    first_capture(&TAG_PATTERNS, input, |_| true).map(|t| clean_ident(&t).to_string())
}
