//! Everything that talks to, or interprets content from, the origin site.

pub mod extract;
pub mod fetch;
pub mod meta;
pub mod site;
pub mod slug;
pub mod source;
pub mod stream;

pub use fetch::{Fetcher, HttpFetcher};
pub use meta::MetaResolver;
pub use site::{OriginSite, SiteLayout, TypeLayout};
pub use source::{
    HtmlPagesSource, ListingRequest, ListingSource, RestSource, SitemapSource, SourceChain,
};
pub use stream::StreamResolver;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OriginError {
    #[error("network error: {0}")]
    Fetch(String),
    #[error("origin returned {status} for {url}")]
    Status { status: u16, url: String },
    #[error("parse error: {0}")]
    Parse(String),
}
