//! Token extraction over message bodies.

use once_cell::sync::Lazy;
use regex::Regex;

static MENTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\p{L}\p{N}_@])@([A-Za-z0-9_]+)").expect("valid mention regex")
});
static HASHTAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\p{L}\p{N}_#])#([\p{L}\p{N}_]+)").expect("valid hashtag regex")
});

/// First capture of every match, deduplicated case-insensitively.
fn captured_tokens(re: &Regex, text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for token in re.captures_iter(text).filter_map(|caps| caps.get(1)) {
        let token = token.as_str();
        if !found.iter().any(|seen| seen.eq_ignore_ascii_case(token)) {
            found.push(token.to_string());
        }
    }
    found
}

/// Usernames mentioned as `@name`, without the sigil, in order of first appearance.
pub fn mentioned_usernames(text: &str) -> Vec<String> {
    captured_tokens(&MENTION_RE, text)
}

/// Hashtags written as `#tag`, without the sigil, in order of first appearance.
pub fn hashtags(text: &str) -> Vec<String> {
    captured_tokens(&HASHTAG_RE, text)
        .into_iter()
        .filter(|tag| !tag.chars().all(|c| c.is_ascii_digit()))
        .collect()
}
