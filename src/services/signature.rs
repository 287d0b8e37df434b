// src/services/signature.rs

//! Signature extraction.
//!
//! Reduces a fetched document to a stable hex digest. All extractors are pure
//! functions of their inputs so they can be tested without a network.

use scraper::{Html, Node};
use sha2::{Digest, Sha256};

use crate::models::{SignatureKind, Source};
use crate::services::fetcher::FetchedPage;
use crate::utils::resolve;

/// Elements whose text never reaches the reader.
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Compute the signature of `page` using the source's configured kind.
///
/// `raw_hash` sees the body bytes as received; the HTML kinds see the body
/// decoded with its declared charset.
pub fn extract(source: &Source, page: &FetchedPage) -> String {
    match source.kind {
        SignatureKind::PageHash => page_hash(&page.text()),
        SignatureKind::LinkHash => link_hash(&source.url, &page.text(), &source.link_keywords),
        SignatureKind::RawHash => raw_hash(&page.body),
    }
}

/// Hash of the visible text of an HTML document.
pub fn page_hash(html: &str) -> String {
    let document = Html::parse_document(html);
    sha256_hex(visible_text(&document).as_bytes())
}

/// Hash of the absolute URL of the first link whose href contains every
/// keyword, or an empty string if no link matches.
pub fn link_hash(base_url: &str, html: &str, keywords: &[String]) -> String {
    let document = Html::parse_document(html);
    match first_matching_link(&document, keywords) {
        Some(href) => sha256_hex(resolve(base_url, &href).as_bytes()),
        None => String::new(),
    }
}

/// Hash of the raw document bytes.
pub fn raw_hash(content: &[u8]) -> String {
    sha256_hex(content)
}

/// Collect visible text nodes in document order.
///
/// Each node has its whitespace runs collapsed to one space and is trimmed;
/// empty nodes are dropped and the rest are joined with newlines.
fn visible_text(document: &Html) -> String {
    let mut chunks = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
            Node::Element(el) => HIDDEN_ELEMENTS.contains(&el.name()),
            _ => false,
        });
        if hidden {
            continue;
        }

        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if !normalized.is_empty() {
            chunks.push(normalized);
        }
    }

    chunks.join("\n")
}

fn first_matching_link(document: &Html, keywords: &[String]) -> Option<String> {
    let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();

    document.tree.root().descendants().find_map(|node| {
        let Node::Element(el) = node.value() else {
            return None;
        };
        if el.name() != "a" {
            return None;
        }
        let href = el.attr("href")?;
        let lowered = href.to_lowercase();
        keywords
            .iter()
            .all(|k| lowered.contains(k.as_str()))
            .then(|| href.to_string())
    })
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords() -> Vec<String> {
        vec!["warzone".to_string(), "patchnotes".to_string()]
    }

    #[test]
    fn test_page_hash_is_deterministic() {
        let html = "<html><body><h1>Title</h1><p>Body text</p></body></html>";
        assert_eq!(page_hash(html), page_hash(html));
        assert_eq!(page_hash(html).len(), 64);
    }

    #[test]
    fn test_page_hash_ignores_scripts_and_styles() {
        let plain = "<html><body><p>Release 1.2</p></body></html>";
        let noisy = r#"<html><head><style>p { color: red; }</style>
            <script>var build = "a81f";</script></head>
            <body><p>Release 1.2</p><noscript>Enable JS</noscript>
            <script>track(Date.now())</script></body></html>"#;
        assert_eq!(page_hash(plain), page_hash(noisy));
    }

    #[test]
    fn test_page_hash_ignores_whitespace_and_markup_noise() {
        let a = "<html><body><div><p>Release   notes</p>\n\n<p>Fixed a bug</p></div></body></html>";
        let b = "<html><body>\n  <p class=\"x\">  Release\tnotes </p><span>Fixed a bug</span>\n</body></html>";
        assert_eq!(page_hash(a), page_hash(b));
    }

    #[test]
    fn test_page_hash_detects_text_change() {
        let before = "<html><body><p>Version 1</p></body></html>";
        let after = "<html><body><p>Version 2</p></body></html>";
        assert_ne!(page_hash(before), page_hash(after));
    }

    #[test]
    fn test_visible_text_joins_nodes_with_newlines() {
        let document = Html::parse_document("<p> a  b </p><p>c</p><script>x</script>");
        assert_eq!(visible_text(&document), "a b\nc");
    }

    #[test]
    fn test_link_hash_without_match_is_empty() {
        let html = r#"<a href="/news">News</a><a href="/warzone/store">Store</a>"#;
        assert_eq!(
            link_hash("https://www.callofduty.com/patchnotes", html, &keywords()),
            ""
        );
    }

    #[test]
    fn test_link_hash_takes_first_match_case_insensitively() {
        let first = r#"<a href="/news">x</a>
            <a href="/PatchNotes/2024/05/Warzone-S4">S4</a>
            <a href="/patchnotes/2024/04/warzone-s3">S3</a>"#;
        let expected = sha256_hex(b"https://www.callofduty.com/PatchNotes/2024/05/Warzone-S4");
        assert_eq!(
            link_hash("https://www.callofduty.com/patchnotes", first, &keywords()),
            expected
        );
    }

    #[test]
    fn test_link_hash_resolves_relative_href() {
        let relative = r#"<a href="warzone-s4">S4</a>"#;
        let absolute = r#"<a href="https://www.callofduty.com/patchnotes/warzone-s4">S4</a>"#;
        let base = "https://www.callofduty.com/patchnotes/";
        let kw = vec!["warzone".to_string()];
        assert_eq!(link_hash(base, relative, &kw), link_hash(base, absolute, &kw));
        assert_ne!(link_hash(base, relative, &kw), sha256_hex(b"warzone-s4"));
    }

    #[test]
    fn test_link_hash_differs_for_different_targets() {
        let base = "https://www.callofduty.com/patchnotes";
        let a = r#"<a href="/patchnotes/warzone-s3">S3</a>"#;
        let b = r#"<a href="/patchnotes/warzone-s4">S4</a>"#;
        assert_ne!(link_hash(base, a, &keywords()), link_hash(base, b, &keywords()));
    }

    #[test]
    fn test_raw_hash_sees_markup() {
        assert_ne!(raw_hash(b"<p>a</p>"), raw_hash(b"<p> a</p>"));
        assert_eq!(
            raw_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_extract_dispatches_on_kind() {
        let html = r#"<p>Hi</p><a href="/warzone/patchnotes">n</a>"#;
        let url = "https://example.com/";

        let page = Source::new("p", url, SignatureKind::PageHash);
        let link = Source::new("l", url, SignatureKind::LinkHash);
        let raw = Source::new("r", url, SignatureKind::RawHash);

        let fetched = FetchedPage::new(html);
        assert_eq!(extract(&page, &fetched), page_hash(html));
        assert_eq!(extract(&link, &fetched), link_hash(url, html, &keywords()));
        assert_eq!(extract(&raw, &fetched), raw_hash(html.as_bytes()));
    }

    #[test]
    fn test_latin1_single_byte_change_is_detected() {
        let before = FetchedPage::with_charset(b"<p>Version \xe4</p>".to_vec(), "iso-8859-1");
        let after = FetchedPage::with_charset(b"<p>Version \xf6</p>".to_vec(), "iso-8859-1");
        let url = "https://example.se/";

        let raw = Source::new("r", url, SignatureKind::RawHash);
        assert_ne!(extract(&raw, &before), extract(&raw, &after));
        assert_eq!(extract(&raw, &before), raw_hash(b"<p>Version \xe4</p>"));

        let page = Source::new("p", url, SignatureKind::PageHash);
        assert_ne!(extract(&page, &before), extract(&page, &after));
        assert_eq!(
            extract(&page, &before),
            page_hash("<html><body><p>Version \u{e4}</p></body></html>")
        );
    }
}
