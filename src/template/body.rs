use crate::domain::ContentRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

/// Excerpt budget, in user-perceived characters.
pub const EXCERPT_LENGTH: usize = 180;

pub const FALLBACK_BODY: &str =
    "A new post has just been published. Open it on the blog to read the full article.";

/// One place a record may keep its body.
pub type BodySource = fn(&ContentRecord) -> Option<&str>;

/// Where to look for a body, in order of preference.
pub const BODY_SOURCES: [BodySource; 5] = [
    canonical_content,
    generic_body,
    plain_text,
    description,
    stored_excerpt,
];

fn canonical_content(record: &ContentRecord) -> Option<&str> {
    record.content.as_deref()
}

fn generic_body(record: &ContentRecord) -> Option<&str> {
    record.body.as_deref()
}

fn plain_text(record: &ContentRecord) -> Option<&str> {
    record.text.as_deref()
}

fn description(record: &ContentRecord) -> Option<&str> {
    record.description.as_deref()
}

fn stored_excerpt(record: &ContentRecord) -> Option<&str> {
    record.excerpt.as_deref()
}

/// The first non-blank body found along [`BODY_SOURCES`].
pub fn find_body(record: &ContentRecord) -> Option<&str> {
    BODY_SOURCES
        .iter()
        .filter_map(|source| source(record))
        .find(|body| !body.trim().is_empty())
}

/// [`find_body`], or [`FALLBACK_BODY`] when the record has none.
pub fn extract_body(record: &ContentRecord) -> &str {
    find_body(record).unwrap_or(FALLBACK_BODY)
}

static MARKDOWN_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").expect("image pattern is valid"));

const MARKDOWN_CONTROL: [char; 5] = ['#', '*', '`', '[', ']'];

/// Plain-text preview of a markdown body: images removed, control characters
/// stripped, whitespace collapsed, cut to [`EXCERPT_LENGTH`] and suffixed
/// with `...`.
pub fn excerpt(markdown: &str) -> String {
    let without_images = MARKDOWN_IMAGE.replace_all(markdown, "");
    let stripped: String = without_images
        .chars()
        .filter(|c| !MARKDOWN_CONTROL.contains(c))
        .collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut excerpt: String = collapsed.graphemes(true).take(EXCERPT_LENGTH).collect();
    excerpt.push_str("...");
    excerpt
}
