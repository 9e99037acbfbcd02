//! Catalog queries: search filter and pagination over a cached listing set.

use ala_core::{ContentType, Listing};
use ala_origin::ListingRequest;
use serde::Deserialize;
use tracing::debug;

use crate::cache::ListingCache;
use crate::manifest;

pub const PAGE_SIZE: usize = 40;

/// Catalog extras, from either the query string or the `{extras}.json` path
/// segment. All values arrive as strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub skip: Option<String>,
    pub genre: Option<String>,
}

impl CatalogQuery {
    /// Parse the protocol's path form, e.g. `search=queen&skip=40`.
    pub fn from_extras(extras: &str) -> Self {
        let mut query = Self::default();
        for (key, value) in url::form_urlencoded::parse(extras.as_bytes()) {
            let value = Some(value.into_owned());
            match key.as_ref() {
                "search" => query.search = value,
                "skip" => query.skip = value,
                "genre" => query.genre = value,
                _ => {}
            }
        }
        query
    }

    /// Anything that is not a non-negative integer counts as 0. Offsets too
    /// large for `usize` saturate, which pages past the end.
    pub fn skip(&self) -> usize {
        match self.skip.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
                s.parse().unwrap_or(usize::MAX)
            }
            _ => 0,
        }
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn genre_term(&self) -> Option<&str> {
        self.genre.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Case-insensitive substring match on the display name, then one page
/// starting at `skip`.
pub fn filter_and_page<'a>(
    listings: &'a [Listing],
    search: Option<&str>,
    skip: usize,
) -> Vec<&'a Listing> {
    let needle = search.map(str::to_lowercase);
    listings
        .iter()
        .filter(|l| match &needle {
            Some(n) => l.display_name.to_lowercase().contains(n.as_str()),
            None => true,
        })
        .skip(skip)
        .take(PAGE_SIZE)
        .collect()
}

/// One page of `content_type`'s catalog. Origin trouble shows up as an
/// empty page, never as an error.
///
/// Only series declare a genre extra. A genre outside the declared options
/// yields an empty page without touching the cache; movies ignore it.
pub async fn catalog_page(
    cache: &ListingCache,
    content_type: ContentType,
    query: &CatalogQuery,
) -> Vec<Listing> {
    let genre = match (content_type, query.genre_term()) {
        (ContentType::Series, Some(given)) => match manifest::declared_genre(given) {
            Some(option) => Some(option),
            None => {
                debug!(genre = given, "undeclared genre");
                return Vec::new();
            }
        },
        _ => None,
    };
    let request = ListingRequest::new(content_type, genre);
    let Some(snapshot) = cache.get(&request).await else {
        return Vec::new();
    };
    filter_and_page(&snapshot.listings, query.search_term(), query.skip())
        .into_iter()
        .cloned()
        .collect()
}
