//! Detail records for a single origin URL.

use std::sync::Arc;

use ala_core::{ContentType, MetaLink, MetaRecord};
use tracing::{debug, warn};

use crate::OriginError;
use crate::extract::{page, rest};
use crate::fetch::Fetcher;
use crate::site::OriginSite;
use crate::slug;

pub const ORIGIN_LINK_NAME: &str = "Ver en Asia Live Action";

/// Resolves a [`MetaRecord`] for an origin URL.
///
/// Lookup order: REST API (numeric id, then slug) → detail page → a record
/// titled from the URL slug. Only the last step never touches the network.
pub struct MetaResolver {
    fetcher: Arc<dyn Fetcher>,
    site: Arc<OriginSite>,
}

impl MetaResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>, site: Arc<OriginSite>) -> Self {
        Self { fetcher, site }
    }

    /// `None` only when nothing, not even a title, can be derived.
    pub async fn resolve(
        &self,
        identifier: &str,
        content_type: ContentType,
        origin_url: &str,
    ) -> Option<MetaRecord> {
        let slug_title = slug::title_from_url(origin_url);

        let mut meta = match self.from_rest(content_type, origin_url).await {
            Some(post) => Some(rest::post_to_meta(&post, identifier, content_type)),
            None => match self.from_page(identifier, content_type, origin_url).await {
                Ok(meta) => meta,
                Err(e) => {
                    warn!(url = %origin_url, error = %e, "detail page unavailable");
                    None
                }
            },
        };

        if meta.is_none() {
            debug!(url = %origin_url, "deriving meta from slug");
            meta = slug_title
                .clone()
                .map(|title| MetaRecord::new(identifier, content_type, title));
        }

        let mut meta = meta?;
        if meta.display_name.trim().is_empty() {
            meta.display_name = slug_title?;
        }
        meta.links.push(MetaLink {
            name: ORIGIN_LINK_NAME.to_string(),
            category: "Web".to_string(),
            url: origin_url.to_string(),
        });
        Some(meta)
    }

    async fn from_rest(&self, content_type: ContentType, origin_url: &str) -> Option<rest::RestPost> {
        match find_post(self.fetcher.as_ref(), &self.site, content_type, origin_url).await {
            Ok(post) => post,
            Err(e) => {
                debug!(url = %origin_url, error = %e, "REST lookup failed");
                None
            }
        }
    }

    async fn from_page(
        &self,
        identifier: &str,
        content_type: ContentType,
        origin_url: &str,
    ) -> Result<Option<MetaRecord>, OriginError> {
        let body = self.fetcher.get_text(origin_url).await?;
        let details = page::extract_details(&body, &self.site);

        let Some(title) = details.title else {
            return Ok(None);
        };
        let mut meta = MetaRecord::new(identifier, content_type, title);
        meta.poster_url = details.poster_url;
        meta.description = details.description;
        meta.release_year = details.year;
        for genre in &details.genres {
            meta.push_genre(genre);
        }
        Ok(Some(meta))
    }
}

/// The REST post for `origin_url`, if the API knows it. Numeric `?p=` ids are
/// tried before the slug, each across the type's post types in order.
pub async fn find_post(
    fetcher: &dyn Fetcher,
    site: &OriginSite,
    content_type: ContentType,
    origin_url: &str,
) -> Result<Option<rest::RestPost>, OriginError> {
    let post_types = site.layout().for_type(content_type).rest_post_types;
    let mut last_error = None;

    if let Some(id) = slug::numeric_post_id(origin_url) {
        for post_type in post_types {
            match fetcher.get_json(&site.rest_post_url(post_type, id)).await {
                Ok(value) => {
                    if let Some(post) = rest::parse_post(&value) {
                        return Ok(Some(post));
                    }
                }
                Err(e) => last_error = Some(e),
            }
        }
    }

    if let Some(slug) = slug::slug_from_url(origin_url) {
        for post_type in post_types {
            let url = site.rest_slug_url(post_type, &slug);
            match fetcher.get_json(&url).await.and_then(|v| rest::parse_posts(&v)) {
                Ok(posts) => {
                    if let Some(post) = posts.into_iter().next() {
                        return Ok(Some(post));
                    }
                    last_error = None;
                }
                Err(e) => last_error = Some(e),
            }
        }
    }

    match last_error {
        Some(e) => Err(e),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use url::Url;

    struct Pages(HashMap<&'static str, String>);

    #[async_trait::async_trait]
    impl Fetcher for Pages {
        async fn get_text(&self, url: &str) -> Result<String, OriginError> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| OriginError::Fetch(format!("unreachable: {url}")))
        }
    }

    fn resolver(pages: &[(&'static str, String)]) -> MetaResolver {
        let site = OriginSite::new(Url::parse("https://asialiveaction.com").unwrap()).unwrap();
        MetaResolver::new(
            Arc::new(Pages(pages.iter().cloned().collect())),
            Arc::new(site),
        )
    }

    const URL: &str = "https://asialiveaction.com/series/queen-of-tears-sub-espanol/";

    #[tokio::test]
    async fn prefers_rest_lookup_by_slug() {
        let body = serde_json::json!([{
            "title": { "rendered": "Queen of Tears" },
            "date": "2024-03-09T20:00:00",
            "excerpt": { "rendered": "<p>Sinopsis</p>" },
            "link": URL
        }])
        .to_string();
        let resolver = resolver(&[(
            "https://asialiveaction.com/wp-json/wp/v2/series?slug=queen-of-tears-sub-espanol&_embed",
            body,
        )]);

        let meta = resolver.resolve("ala_x", ContentType::Series, URL).await.unwrap();
        assert_eq!(meta.display_name, "Queen of Tears");
        assert_eq!(meta.release_year.as_deref(), Some("2024"));
        assert_eq!(meta.description.as_deref(), Some("Sinopsis"));
        assert_eq!(meta.links.len(), 1);
        assert_eq!(meta.links[0].url, URL);
    }

    #[tokio::test]
    async fn looks_up_numeric_ids() {
        let url = "https://asialiveaction.com/?p=77";
        let body = serde_json::json!({ "id": 77, "title": { "rendered": "Parasite" } }).to_string();
        let resolver = resolver(&[("https://asialiveaction.com/wp-json/wp/v2/peliculas/77?_embed", body)]);

        let meta = resolver.resolve("ala_y", ContentType::Movie, url).await.unwrap();
        assert_eq!(meta.display_name, "Parasite");
        assert_eq!(meta.content_type, ContentType::Movie);
    }

    #[tokio::test]
    async fn falls_back_to_detail_page() {
        let html = r#"<html><body><h1 class="entry-title">Queen of Tears</h1>
            <div class="sinopsis"><p>Drama de 2024.</p></div>
            <a rel="category tag" href="/genero/romance/">Romance</a></body></html>"#;
        let resolver = resolver(&[(URL, html.to_string())]);

        let meta = resolver.resolve("ala_x", ContentType::Series, URL).await.unwrap();
        assert_eq!(meta.display_name, "Queen of Tears");
        assert_eq!(meta.description.as_deref(), Some("Drama de 2024."));
        assert_eq!(meta.genres, vec!["Romance"]);
    }

    #[tokio::test]
    async fn derives_title_from_slug_when_origin_is_down() {
        let meta = resolver(&[])
            .resolve("ala_x", ContentType::Series, URL)
            .await
            .unwrap();
        assert_eq!(meta.display_name, "Queen Of Tears");
        assert_eq!(meta.poster_url, None);
        assert_eq!(meta.links[0].url, URL);
    }

    #[tokio::test]
    async fn nothing_derivable_yields_none() {
        let got = resolver(&[])
            .resolve("ala_x", ContentType::Series, "https://asialiveaction.com/")
            .await;
        assert!(got.is_none());
    }
}
