// src/fetch/locate.rs
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

static LIST_ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse("li").expect("li selector"));
static TABLE_ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("tr selector"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("anchor selector"));

/// Normalize caption text for matching: lowercase, then drop the literal
/// substrings `"\r\n"`, `" "`, and `"s"`.
///
/// Stripping every "s" is what lets singular/plural caption drift between
/// digest editions still match. It also strips the "s" from the search
/// pattern itself, so unrelated captions sharing the same letters can match
/// coincidentally; table selection has only been validated against the real
/// caption text, and the behavior is kept as is.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .replace("\r\n", "")
        .replace(' ', "")
        .replace('s', "")
}

/// Scan `document` for the menu entry whose caption contains `caption`
/// (after [`normalize`]) and return its link joined onto `base`.
///
/// List items are scanned before table rows, so a matching `<li>` wins over a
/// matching `<tr>`. Only leaf elements count: an element containing another
/// element of its own kind is a container of entries, not an entry. `None`
/// means the menu no longer carries the caption, which callers treat as a
/// site layout change rather than an error.
pub fn find_table_url(document: &Html, caption: &str, base: &Url) -> Option<Url> {
    let pattern = normalize(caption);
    for kind in [&*LIST_ITEM, &*TABLE_ROW] {
        for element in document.select(kind) {
            if let Some(href) = leaf_entry_link(element, kind, &pattern) {
                debug!(href, "caption matched");
                return base.join(&href).ok();
            }
        }
    }
    None
}

/// `Some(href)` if `element` is a leaf of its kind, its text matches
/// `pattern`, and it contains a hyperlink.
fn leaf_entry_link(element: ElementRef<'_>, kind: &Selector, pattern: &str) -> Option<String> {
    if element.select(kind).next().is_some() {
        return None;
    }
    let text: String = element.text().collect();
    if !normalize(&text).contains(pattern) {
        return None;
    }
    element
        .select(&ANCHOR)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
}
