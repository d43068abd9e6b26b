//! Plain-text extraction for listing descriptions.
//!
//! Descriptions arrive as small HTML fragments (`<p>`, `<br>`, `<ul>`), often
//! with Windows line breaks between paragraphs. Text nodes are concatenated
//! as-is; the only whitespace change is dropping literal `\r\n` pairs.

use std::sync::LazyLock;

use regex::Regex;

static COMMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));

static SCRIPTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("valid script regex")
});

static TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<[A-Za-z!/?](?:[^>"']|"[^"]*"|'[^']*')*>"#).expect("valid tags regex")
});

/// Strips markup from an HTML fragment and returns its text.
///
/// Character references are decoded after tags are removed, so an escaped
/// `&lt;b&gt;` survives as literal text.
///
/// Returns an empty string when the fragment has no text nodes.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let without_comments = COMMENTS.replace_all(html, "");
    let without_scripts = SCRIPTS.replace_all(&without_comments, "");
    let without_tags = TAGS.replace_all(&without_scripts, "");
    html_escape::decode_html_entities(&without_tags).replace("\r\n", "")
}
