//! Stream candidates for an item page.

use std::sync::Arc;

use ala_core::{ContentType, StreamCandidate, StreamTarget};
use tracing::{debug, warn};
use url::Url;

use crate::extract::player::{self, PlayerRef};
use crate::fetch::Fetcher;
use crate::meta::find_post;
use crate::site::OriginSite;

pub const SOURCE_LABEL: &str = "Asia Live Action";
pub const DIRECT_LABEL: &str = "Asia Live Action (direct)";
pub const FALLBACK_DESCRIPTION: &str = "Abrir en el navegador";

pub struct StreamResolver {
    fetcher: Arc<dyn Fetcher>,
    site: Arc<OriginSite>,
}

impl StreamResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>, site: Arc<OriginSite>) -> Self {
        Self { fetcher, site }
    }

    /// Players found on the item page, followed by exactly one external link
    /// to the page itself. Never empty for a parseable `origin_url`.
    ///
    /// When the page cannot be fetched and the content type is known, the
    /// rendered post body from the REST API is scanned instead.
    pub async fn resolve(
        &self,
        content_type: Option<ContentType>,
        origin_url: &str,
    ) -> Vec<StreamCandidate> {
        let Ok(page_url) = Url::parse(origin_url) else {
            return Vec::new();
        };

        let markup = match self.fetcher.get_text(origin_url).await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(url = %origin_url, error = %e, "item page unavailable");
                match content_type {
                    Some(ct) => self.rest_content(ct, origin_url).await,
                    None => None,
                }
            }
        };

        let refs = markup
            .map(|m| player::extract_player_refs(&m, &page_url))
            .unwrap_or_default();
        debug!(url = %origin_url, players = refs.len(), "player scan");

        let mut streams = candidates(refs);
        streams.push(StreamCandidate::new(
            SOURCE_LABEL,
            FALLBACK_DESCRIPTION,
            StreamTarget::External(origin_url.to_string()),
        ));
        streams
    }

    async fn rest_content(&self, content_type: ContentType, origin_url: &str) -> Option<String> {
        match find_post(self.fetcher.as_ref(), &self.site, content_type, origin_url).await {
            Ok(post) => post.and_then(|p| p.content_html),
            Err(e) => {
                debug!(url = %origin_url, error = %e, "REST content unavailable");
                None
            }
        }
    }
}

fn candidates(refs: Vec<PlayerRef>) -> Vec<StreamCandidate> {
    let mut embeds = 0;
    refs.into_iter()
        .map(|r| match r {
            PlayerRef::Embed(url) => {
                embeds += 1;
                StreamCandidate::new(
                    SOURCE_LABEL,
                    format!("Player {embeds}"),
                    StreamTarget::External(url),
                )
            }
            PlayerRef::Direct(url) => {
                StreamCandidate::new(DIRECT_LABEL, "Direct stream", StreamTarget::Playable(url))
            }
        })
        .collect()
}
