//! Listing cards on HTML index pages.

use std::collections::HashSet;
use std::sync::LazyLock;

use ala_core::{ContentType, Listing};
use scraper::{Html, Selector};

use super::{element_text, image_source};
use crate::site::OriginSite;

static CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article, .TPost, .MovieList .TPostMv, .item").unwrap());
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2, h3, .Title, .title").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static IMAGE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());

/// Extract listing cards in document order.
///
/// A card needs a non-empty title and a first anchor pointing at the origin.
/// Nested containers describing the same item collapse into one listing.
pub fn extract_listings(body: &str, content_type: ContentType, site: &OriginSite) -> Vec<Listing> {
    let doc = Html::parse_document(body);
    let mut seen = HashSet::new();
    let mut listings = Vec::new();

    for card in doc.select(&CONTAINER) {
        let Some(title) = card
            .select(&TITLE)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty())
        else {
            continue;
        };

        let Some(link) = card
            .select(&ANCHOR)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| site.resolve(href))
        else {
            continue;
        };

        if !seen.insert(link.clone()) {
            continue;
        }

        let poster = card
            .select(&IMAGE)
            .next()
            .and_then(image_source)
            .and_then(|src| site.absolutize(src));

        listings.push(Listing::new(content_type, title, link, poster));
    }

    listings
}
