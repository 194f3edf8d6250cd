//! Text shaping applied before publishing a post.

use std::sync::LazyLock;

use regex::Regex;

use crate::constants::SMALL_POST_LIMIT;

static IMAGES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[.*?\]\((.*?)\)").expect("valid image regex"));
static MENTIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(@.*?)\]\(@.*?\)").expect("valid mention regex"));
static LINKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]\((.*?)\)").expect("valid link regex"));
static HEADERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\n)#+ ").expect("valid header regex"));

/// Flattens markdown to plain text: images and links become their target,
/// mentions become the bare `@name`, heading markers are dropped.
pub fn escape_markdown(text: &str) -> String {
    let text = IMAGES.replace_all(text, "$1");
    let text = MENTIONS.replace_all(&text, "$1");
    let text = LINKS.replace_all(&text, "$1");
    HEADERS.replace_all(&text, "").into_owned()
}

/// Splits `text` into chunks of at most `limit` characters.
///
/// Every chunk but the last ends in a `n/` marker and the last in `n/n`.
/// The chunks come back last-first, so publishing them in order leaves the
/// opening chunk as the newest record.
pub fn split_in_small_posts(text: &str, limit: usize) -> Vec<String> {
    let text = escape_markdown(text);
    if text.chars().count() <= limit {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut next = String::new();
    for word in text.split(' ').filter(|w| !w.is_empty()) {
        let marker = format!("{}/", chunks.len() + 1);
        let needed = next.chars().count() + word.chars().count() + marker.len() + 1;
        if needed < limit {
            next.push_str(word);
            next.push(' ');
        } else {
            chunks.push(format!("{next}{marker}"));
            next = format!("{word} ");
        }
    }

    let total = chunks.len() + 1;
    let last_marker = if total > 1 { format!("{total}/{total}") } else { String::new() };
    chunks.push(format!("{next}{last_marker}"));
    chunks.reverse();
    chunks
}

/// [`split_in_small_posts`] at the default post size.
pub fn split_default(text: &str) -> Vec<String> {
    split_in_small_posts(text, SMALL_POST_LIMIT)
}
