//! Where things live on the origin site.

use ala_core::ContentType;
use url::Url;

use crate::OriginError;

/// Per content type locations.
#[derive(Debug, Clone)]
pub struct TypeLayout {
    /// HTML listing root, with trailing slash.
    pub listing_path: &'static str,
    pub sitemap_path: &'static str,
    /// WordPress REST post types, in lookup order.
    pub rest_post_types: &'static [&'static str],
}

#[derive(Debug, Clone)]
pub struct SiteLayout {
    pub series: TypeLayout,
    pub movie: TypeLayout,
    pub genre_path: &'static str,
    /// Safety cap on pagination; listing walks normally end at the first
    /// page that fails or adds nothing new.
    pub max_listing_pages: u32,
    pub rest_per_page: u32,
    pub max_sitemap_children: usize,
}

impl SiteLayout {
    pub fn for_type(&self, content_type: ContentType) -> &TypeLayout {
        match content_type {
            ContentType::Series => &self.series,
            ContentType::Movie => &self.movie,
        }
    }
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self {
            series: TypeLayout {
                listing_path: "/",
                sitemap_path: "/series-sitemap.xml",
                rest_post_types: &["series", "doramas"],
            },
            movie: TypeLayout {
                listing_path: "/peliculas/",
                sitemap_path: "/movies-sitemap.xml",
                rest_post_types: &["movies", "peliculas"],
            },
            genre_path: "/genero/",
            max_listing_pages: 50,
            rest_per_page: 100,
            max_sitemap_children: 5,
        }
    }
}

/// The configured origin: base URL plus its layout.
#[derive(Debug, Clone)]
pub struct OriginSite {
    base: Url,
    layout: SiteLayout,
}

impl OriginSite {
    pub fn new(base: Url) -> Result<Self, OriginError> {
        Self::with_layout(base, SiteLayout::default())
    }

    pub fn with_layout(base: Url, layout: SiteLayout) -> Result<Self, OriginError> {
        if !matches!(base.scheme(), "http" | "https") || base.host_str().is_none() {
            return Err(OriginError::Parse(format!("origin base is not a web URL: {base}")));
        }
        Ok(Self { base, layout })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn layout(&self) -> &SiteLayout {
        &self.layout
    }

    /// Absolute URL for a path on the origin.
    pub fn url(&self, path: &str) -> String {
        self.absolutize(path)
            .unwrap_or_else(|| format!("{}{}", self.base.as_str().trim_end_matches('/'), path))
    }

    /// Resolve `href` against the base. Protocol-relative links get the base scheme.
    pub fn absolutize(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        self.base.join(href).ok().map(String::from)
    }

    /// Resolve `href` and keep it only when it points at the origin.
    pub fn resolve(&self, href: &str) -> Option<String> {
        self.absolutize(href).filter(|u| self.owns(u))
    }

    /// Whether `url` is on the origin host (a leading `www.` is ignored).
    pub fn owns(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return false;
        }
        match (parsed.host_str(), self.base.host_str()) {
            (Some(a), Some(b)) => strip_www(a).eq_ignore_ascii_case(strip_www(b)),
            _ => false,
        }
    }

    pub fn listing_page_url(&self, content_type: ContentType, page: u32) -> String {
        self.url(&paged(self.layout.for_type(content_type).listing_path, page))
    }

    pub fn genre_page_url(&self, genre_slug: &str, page: u32) -> String {
        let path = format!("{}{genre_slug}/", self.layout.genre_path);
        self.url(&paged(&path, page))
    }

    pub fn sitemap_url(&self, content_type: ContentType) -> String {
        self.url(self.layout.for_type(content_type).sitemap_path)
    }

    pub fn rest_collection_url(&self, post_type: &str, page: u32) -> String {
        self.url(&format!(
            "/wp-json/wp/v2/{post_type}?per_page={}&page={page}&_embed",
            self.layout.rest_per_page
        ))
    }

    pub fn rest_slug_url(&self, post_type: &str, slug: &str) -> String {
        self.url(&format!(
            "/wp-json/wp/v2/{post_type}?slug={}&_embed",
            urlencoding::encode(slug)
        ))
    }

    pub fn rest_post_url(&self, post_type: &str, id: u64) -> String {
        self.url(&format!("/wp-json/wp/v2/{post_type}/{id}?_embed"))
    }
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

fn paged(path: &str, page: u32) -> String {
    if page <= 1 {
        path.to_string()
    } else {
        format!("{}/page/{page}/", path.trim_end_matches('/'))
    }
}
