use std::sync::Arc;
use std::time::Duration;

use ala_origin::{Fetcher, MetaResolver, OriginSite, SourceChain, StreamResolver};

use crate::cache::{Clock, ListingCache, SystemClock};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub site: Arc<OriginSite>,
    pub cache: Arc<ListingCache>,
    pub meta: Arc<MetaResolver>,
    pub streams: Arc<StreamResolver>,
}

impl AppState {
    pub fn new(fetcher: Arc<dyn Fetcher>, site: OriginSite, cache_ttl: Duration) -> Self {
        Self::with_clock(fetcher, site, cache_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(
        fetcher: Arc<dyn Fetcher>,
        site: OriginSite,
        cache_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let site = Arc::new(site);
        let source = Arc::new(SourceChain::standard(fetcher.clone(), site.clone()));
        Self {
            cache: Arc::new(ListingCache::new(source, clock, cache_ttl)),
            meta: Arc::new(MetaResolver::new(fetcher.clone(), site.clone())),
            streams: Arc::new(StreamResolver::new(fetcher, site.clone())),
            site,
        }
    }
}
