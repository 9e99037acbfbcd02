//! Listing sources: independent strategies for producing the full listing set
//! of a content type, and the chain that tries them in order.

use std::collections::HashSet;
use std::sync::Arc;

use ala_core::{ContentType, Listing};
use tracing::{debug, info, warn};

use crate::OriginError;
use crate::extract::{html, rest, sitemap};
use crate::fetch::Fetcher;
use crate::site::OriginSite;
use crate::slug::slugify;

/// What a catalog needs listed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingRequest {
    pub content_type: ContentType,
    /// Genre name as given by the player; `None` lists everything.
    pub genre: Option<String>,
}

impl ListingRequest {
    pub fn new(content_type: ContentType, genre: Option<&str>) -> Self {
        let genre = genre
            .map(|g| g.trim().to_lowercase())
            .filter(|g| !g.is_empty());
        Self {
            content_type,
            genre,
        }
    }
}

#[async_trait::async_trait]
pub trait ListingSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// All listings this source knows for `request`, in source order.
    async fn fetch_listings(&self, request: &ListingRequest) -> Result<Vec<Listing>, OriginError>;
}

/// Tries each source in order until one returns a non-empty result.
///
/// Fails only when every source failed; if at least one answered with
/// nothing, the chain answers with nothing too.
pub struct SourceChain {
    sources: Vec<Box<dyn ListingSource>>,
}

impl SourceChain {
    pub fn new(sources: Vec<Box<dyn ListingSource>>) -> Self {
        Self { sources }
    }

    /// HTML listing pages, then the REST API, then the sitemap.
    pub fn standard(fetcher: Arc<dyn Fetcher>, site: Arc<OriginSite>) -> Self {
        Self::new(vec![
            Box::new(HtmlPagesSource::new(fetcher.clone(), site.clone())),
            Box::new(RestSource::new(fetcher.clone(), site.clone())),
            Box::new(SitemapSource::new(fetcher, site)),
        ])
    }
}

#[async_trait::async_trait]
impl ListingSource for SourceChain {
    fn name(&self) -> &'static str {
        "chain"
    }

    async fn fetch_listings(&self, request: &ListingRequest) -> Result<Vec<Listing>, OriginError> {
        let mut last_error = None;
        let mut answered = false;

        for source in &self.sources {
            match source.fetch_listings(request).await {
                Ok(listings) if !listings.is_empty() => {
                    info!(
                        source = source.name(),
                        content_type = %request.content_type,
                        genre = ?request.genre,
                        count = listings.len(),
                        "listings fetched"
                    );
                    return Ok(listings);
                }
                Ok(_) => {
                    debug!(source = source.name(), "source returned no listings");
                    answered = true;
                }
                Err(e) => {
                    warn!(source = source.name(), error = %e, "listing source failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !answered => Err(e),
            _ => Ok(Vec::new()),
        }
    }
}

/// Scrapes the theme's paginated listing (or genre archive) pages, walking
/// `…/page/N/` until a page fails or adds nothing new.
pub struct HtmlPagesSource {
    fetcher: Arc<dyn Fetcher>,
    site: Arc<OriginSite>,
}

impl HtmlPagesSource {
    pub fn new(fetcher: Arc<dyn Fetcher>, site: Arc<OriginSite>) -> Self {
        Self { fetcher, site }
    }

    fn page_url(&self, request: &ListingRequest, page: u32) -> String {
        match &request.genre {
            Some(genre) => self.site.genre_page_url(&slugify(genre), page),
            None => self.site.listing_page_url(request.content_type, page),
        }
    }
}

#[async_trait::async_trait]
impl ListingSource for HtmlPagesSource {
    fn name(&self) -> &'static str {
        "html"
    }

    async fn fetch_listings(&self, request: &ListingRequest) -> Result<Vec<Listing>, OriginError> {
        let mut seen = HashSet::new();
        let mut all = Vec::new();

        for page in 1..=self.site.layout().max_listing_pages {
            let url = self.page_url(request, page);
            let body = match self.fetcher.get_text(&url).await {
                Ok(body) => body,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    debug!(url = %url, error = %e, "stopping pagination");
                    break;
                }
            };

            let before = all.len();
            for listing in html::extract_listings(&body, request.content_type, &self.site) {
                if seen.insert(listing.origin_url.clone()) {
                    all.push(listing);
                }
            }
            if all.len() == before {
                break;
            }
            if page == self.site.layout().max_listing_pages {
                warn!(url = %url, "listing walk hit the page cap");
            }
        }

        Ok(all)
    }
}

/// Reads the WordPress REST API collections of the content type's post types.
pub struct RestSource {
    fetcher: Arc<dyn Fetcher>,
    site: Arc<OriginSite>,
}

impl RestSource {
    pub fn new(fetcher: Arc<dyn Fetcher>, site: Arc<OriginSite>) -> Self {
        Self { fetcher, site }
    }

    async fn fetch_post_type(
        &self,
        post_type: &str,
        content_type: ContentType,
    ) -> Result<Vec<Listing>, OriginError> {
        let layout = self.site.layout();
        let mut all = Vec::new();

        for page in 1..=layout.max_listing_pages {
            let url = self.site.rest_collection_url(post_type, page);
            // WordPress answers 400 past the last page.
            let posts = match self.fetcher.get_json(&url).await.and_then(|v| rest::parse_posts(&v)) {
                Ok(posts) => posts,
                Err(e) if page == 1 => return Err(e),
                Err(_) => break,
            };

            let full_page = posts.len() >= layout.rest_per_page as usize;
            all.extend(
                posts
                    .iter()
                    .filter_map(|p| rest::post_to_listing(p, content_type, &self.site)),
            );
            if !full_page {
                break;
            }
        }

        Ok(all)
    }
}

#[async_trait::async_trait]
impl ListingSource for RestSource {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn fetch_listings(&self, request: &ListingRequest) -> Result<Vec<Listing>, OriginError> {
        let post_types = self.site.layout().for_type(request.content_type).rest_post_types;
        let wanted_genre = request.genre.as_deref().map(slugify);
        let mut last_error = None;
        let mut answered = false;

        for post_type in post_types {
            let listings = match self.fetch_post_type(post_type, request.content_type).await {
                Ok(listings) => listings,
                Err(e) => {
                    debug!(post_type, error = %e, "REST post type unavailable");
                    last_error = Some(e);
                    continue;
                }
            };

            let listings: Vec<Listing> = match &wanted_genre {
                Some(wanted) => listings
                    .into_iter()
                    .filter(|l| l.genres.iter().any(|g| slugify(g) == *wanted))
                    .collect(),
                None => listings,
            };
            if !listings.is_empty() {
                return Ok(listings);
            }
            answered = true;
        }

        match last_error {
            Some(e) if !answered => Err(e),
            _ => Ok(Vec::new()),
        }
    }
}

/// Reads the content type's XML sitemap, following one level of sitemap index.
pub struct SitemapSource {
    fetcher: Arc<dyn Fetcher>,
    site: Arc<OriginSite>,
}

impl SitemapSource {
    pub fn new(fetcher: Arc<dyn Fetcher>, site: Arc<OriginSite>) -> Self {
        Self { fetcher, site }
    }
}

#[async_trait::async_trait]
impl ListingSource for SitemapSource {
    fn name(&self) -> &'static str {
        "sitemap"
    }

    async fn fetch_listings(&self, request: &ListingRequest) -> Result<Vec<Listing>, OriginError> {
        // Sitemaps carry no genre information.
        if request.genre.is_some() {
            return Ok(Vec::new());
        }

        let url = self.site.sitemap_url(request.content_type);
        let body = self.fetcher.get_text(&url).await?;

        let entries = match sitemap::parse_sitemap(&body)? {
            sitemap::SitemapDocument::Urls(entries) => entries,
            sitemap::SitemapDocument::Index(children) => {
                let mut entries = Vec::new();
                let limit = self.site.layout().max_sitemap_children;
                for child in children.iter().filter(|c| self.site.owns(c)).take(limit) {
                    let parsed = match self.fetcher.get_text(child).await {
                        Ok(body) => sitemap::parse_sitemap(&body),
                        Err(e) => Err(e),
                    };
                    match parsed {
                        Ok(sitemap::SitemapDocument::Urls(mut more)) => entries.append(&mut more),
                        Ok(sitemap::SitemapDocument::Index(_)) => {
                            debug!(url = %child, "ignoring nested sitemap index");
                        }
                        Err(e) => warn!(url = %child, error = %e, "child sitemap skipped"),
                    }
                }
                entries
            }
        };

        Ok(sitemap::listings_from_entries(
            &entries,
            request.content_type,
            &self.site,
        ))
    }
}
