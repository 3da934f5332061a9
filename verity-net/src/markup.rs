//! Text extraction from HTML and Atom markup
//!
//! Both go through `scraper`'s lenient HTML parser. Atom feeds parse
//! well enough for our needs: unknown elements such as `<entry>` and
//! `<published>` become generic nodes and `<title>` keeps its text in place.

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// Maximum characters kept from extracted text
pub const MAX_TEXT_LENGTH: usize = 4000;

/// Visible text of an HTML fragment, tags and entities resolved
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let parts: Vec<&str> = fragment
        .root_element()
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) => {
                let in_excluded = node.ancestors().any(|ancestor| {
                    ancestor
                        .value()
                        .as_element()
                        .map(|el| matches!(el.name(), "script" | "style" | "noscript"))
                        .unwrap_or(false)
                });
                (!in_excluded).then_some(&**text)
            }
            _ => None,
        })
        .collect();

    truncate_chars(&normalize_whitespace(&parts.concat()), MAX_TEXT_LENGTH)
}

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate on a character boundary, marking the cut
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// One `<entry>` of an Atom feed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub published: Option<String>,
    /// `rel="alternate"` link, or the first link when none is marked
    pub link: Option<String>,
    pub authors: Vec<String>,
}

/// Entries of an Atom feed, in document order
pub fn parse_atom_entries(xml: &str) -> Vec<AtomEntry> {
    let document = Html::parse_document(xml);
    let entry_selector = Selector::parse("entry").unwrap();
    let link_selector = Selector::parse("link").unwrap();
    let author_selector = Selector::parse("author > name").unwrap();

    document
        .select(&entry_selector)
        .map(|entry| {
            let links: Vec<ElementRef> = entry.select(&link_selector).collect();
            let link = links
                .iter()
                .find(|l| l.value().attr("rel") == Some("alternate"))
                .or_else(|| links.first())
                .and_then(|l| l.value().attr("href"))
                .map(str::to_string);

            AtomEntry {
                id: child_text(entry, "id"),
                title: child_text(entry, "title"),
                summary: child_text(entry, "summary"),
                published: child_text(entry, "published"),
                link,
                authors: entry
                    .select(&author_selector)
                    .map(|n| normalize_whitespace(&n.text().collect::<String>()))
                    .filter(|n| !n.is_empty())
                    .collect(),
            }
        })
        .collect()
}

fn child_text(element: ElementRef, name: &str) -> Option<String> {
    let selector = Selector::parse(name).ok()?;
    element
        .select(&selector)
        .next()
        .map(|el| normalize_whitespace(&el.text().collect::<String>()))
        .filter(|text| !text.is_empty())
}
