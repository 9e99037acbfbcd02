//! Turn raw origin content into structured records.
//!
//! Every extractor is a pure function over a string so it can be tested
//! without a network. A candidate that cannot be read is skipped; only
//! content of the wrong format fails as a whole.

pub mod html;
pub mod page;
pub mod player;
pub mod rest;
pub mod sitemap;

use scraper::{ElementRef, Html};

/// Image attributes in priority order. Lazy-load attributes come first
/// because themes put a placeholder in `src` until the image scrolls in.
pub const IMAGE_SOURCE_ATTRS: &[&str] = &["data-src", "data-lazy-src", "src"];

/// First usable image source of `img`, following [`IMAGE_SOURCE_ATTRS`].
pub fn image_source<'a>(img: ElementRef<'a>) -> Option<&'a str> {
    IMAGE_SOURCE_ATTRS
        .iter()
        .filter_map(|attr| img.value().attr(attr))
        .map(str::trim)
        .find(|src| !src.is_empty() && !src.starts_with("data:"))
}

/// Text content of an element with whitespace collapsed.
pub fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

/// Plain text of an HTML fragment. Entities are decoded by the parser.
pub fn strip_tags(fragment: &str) -> String {
    let doc = Html::parse_fragment(fragment);
    collapse_whitespace(&doc.root_element().text().collect::<String>())
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `max_chars` characters, marking the cut with `…`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    #[test]
    fn image_source_prefers_lazy_attributes() {
        let doc = Html::parse_fragment(
            r#"<img src="data:image/gif;base64,R0lG" data-src="https://cdn/real.jpg">
               <img src="https://cdn/direct.jpg">
               <img src="data:image/svg+xml,x">"#,
        );
        let sel = Selector::parse("img").unwrap();
        let srcs: Vec<_> = doc.select(&sel).map(image_source).collect();
        assert_eq!(
            srcs,
            vec![Some("https://cdn/real.jpg"), Some("https://cdn/direct.jpg"), None]
        );
    }

    #[test]
    fn strip_tags_decodes_entities() {
        assert_eq!(
            strip_tags("<p>Amor &amp; guerra&#8230;</p>\n<p> segunda   parte</p>"),
            "Amor & guerra… segunda parte"
        );
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("ñandú", 10), "ñandú");
        assert_eq!(truncate_chars("ñandú rápido", 5), "ñandú…");
    }
}
