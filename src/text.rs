//! HTML-to-plain-text normalization for imageboard post bodies.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

/// `>>123456` backlinks to other posts.
static BACKLINK: Lazy<Regex> = Lazy::new(|| Regex::new(r">>\d+").unwrap());

/// A `>` at the start of the text or right after whitespace.
static QUOTE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^|\s)>").unwrap());

/// A complete tag or comment. A `<` that never closes is plain text.
static MARKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->|</?[A-Za-z][^<>]*>").unwrap());

/// Convert raw, possibly HTML-laden text into clean plain text.
///
/// Entities are decoded, tags are replaced by spaces, imageboard backlinks (`>>123`)
/// and quote markers (`>` at the start or after whitespace) are removed, and
/// whitespace is collapsed. Never fails: malformed markup is parsed permissively.
///
/// Any `>` preceded by whitespace is dropped, not only the ones opening a quoted line,
/// so `a > b` becomes `a b`.
#[must_use]
pub fn normalize(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    // The first pass decodes entities, the second strips markup that was only
    // present in escaped form (`&lt;b&gt;`).
    let decoded = html_text(raw);
    let stripped = strip_escaped_markup(&decoded);

    let without_backlinks = BACKLINK.replace_all(&stripped, "");
    let without_quotes = QUOTE_MARKER.replace_all(&without_backlinks, "$1");

    without_quotes.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// [`normalize`] for optional source fields; absent input yields an empty string.
#[must_use]
pub fn normalize_opt(raw: Option<&str>) -> String {
    raw.map(normalize).unwrap_or_default()
}

/// Remove complete tags from already-decoded text and decode what entities remain.
///
/// Stray `<` characters are re-escaped before parsing so that `x<y and more` keeps its
/// tail instead of being read as an unclosed `<y>` element.
fn strip_escaped_markup(decoded: &str) -> String {
    let without_tags = MARKUP.replace_all(decoded, " ");
    html_text(&without_tags.replace('<', "&lt;"))
}

/// Text content of an HTML fragment, with a space at every node boundary.
fn html_text(fragment: &str) -> String {
    let document = Html::parse_fragment(fragment);
    document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
}
