//! XML sitemaps (`<urlset>` with optional image extension, or `<sitemapindex>`).

use std::collections::HashSet;
use std::sync::LazyLock;

use ala_core::{ContentType, Listing};
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use url::Url;

use crate::OriginError;
use crate::site::OriginSite;
use crate::slug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub loc: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// Child sitemap locations.
    Index(Vec<String>),
    Urls(Vec<SitemapEntry>),
}

// Archive, listing-root and pagination pages: not individual items.
static NON_ITEM_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^/(?:$|(?:series|peliculas|movies|doramas)/?$|(?:.+/)?page/\d+/?$|(?:category|categoria|genero|genre|tag|etiqueta|author)(?:/|$))",
    )
    .unwrap()
});

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    Loc,
    ImageLoc,
}

pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument, OriginError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut is_index: Option<bool> = None;
    let mut field = Field::None;
    let mut loc: Option<String> = None;
    let mut image: Option<String> = None;
    let mut entries = Vec::new();
    let mut children = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"urlset" => is_index = Some(false),
                b"sitemapindex" => is_index = Some(true),
                b"url" | b"sitemap" => {
                    loc = None;
                    image = None;
                }
                b"loc" => field = Field::Loc,
                b"image:loc" => field = Field::ImageLoc,
                _ => {}
            },
            // A self-closing root is a document with no children.
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"urlset" if is_index.is_none() => is_index = Some(false),
                b"sitemapindex" if is_index.is_none() => is_index = Some(true),
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"loc" | b"image:loc" => field = Field::None,
                b"url" => {
                    if let Some(loc) = loc.take() {
                        entries.push(SitemapEntry {
                            loc,
                            image: image.take(),
                        });
                    }
                }
                b"sitemap" => {
                    if let Some(loc) = loc.take() {
                        children.push(loc);
                    }
                }
                _ => {}
            },
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| OriginError::Parse(format!("sitemap text: {e}")))?;
                store(field, text.trim(), &mut loc, &mut image);
            }
            Ok(Event::CData(c)) => {
                let bytes = c.into_inner();
                let text = String::from_utf8_lossy(&bytes);
                store(field, text.trim(), &mut loc, &mut image);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(OriginError::Parse(format!(
                    "sitemap at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
    }

    match is_index {
        Some(true) => Ok(SitemapDocument::Index(children)),
        Some(false) => Ok(SitemapDocument::Urls(entries)),
        None => Err(OriginError::Parse("not a sitemap document".into())),
    }
}

// Only the first image of a <url> is paired with it.
fn store(field: Field, text: &str, loc: &mut Option<String>, image: &mut Option<String>) {
    if text.is_empty() {
        return;
    }
    match field {
        Field::Loc if loc.is_none() => *loc = Some(text.to_string()),
        Field::ImageLoc if image.is_none() => *image = Some(text.to_string()),
        _ => {}
    }
}

/// Whether `url` looks like an individual item rather than an archive page.
pub fn is_item_url(url: &str) -> bool {
    Url::parse(url)
        .map(|u| !NON_ITEM_PATH.is_match(u.path()))
        .unwrap_or(false)
}

/// Sitemap entries → listings titled from their slugs.
pub fn listings_from_entries(
    entries: &[SitemapEntry],
    content_type: ContentType,
    site: &OriginSite,
) -> Vec<Listing> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter_map(|entry| {
            let url = site.resolve(&entry.loc)?;
            if !is_item_url(&url) || !seen.insert(url.clone()) {
                return None;
            }
            let title = slug::title_from_url(&url)?;
            let poster = entry.image.as_deref().and_then(|i| site.absolutize(i));
            Some(Listing::new(content_type, title, url, poster))
        })
        .collect()
}
