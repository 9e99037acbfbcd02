//! WordPress REST API post objects (`/wp-json/wp/v2/...`, requested with `_embed`).

use ala_core::{ContentType, Listing, MetaRecord};
use serde_json::Value;

use super::{collapse_whitespace, strip_tags, truncate_chars};
use crate::OriginError;
use crate::site::OriginSite;

pub const EXCERPT_MAX_CHARS: usize = 300;

/// The fields this addon reads from a post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestPost {
    pub id: Option<u64>,
    pub link: Option<String>,
    pub title: String,
    pub excerpt: Option<String>,
    /// Rendered post body, still HTML.
    pub content_html: Option<String>,
    pub year: Option<String>,
    pub poster_url: Option<String>,
    pub genres: Vec<String>,
}

/// Map a single post object. Returns `None` for anything without a title.
pub fn parse_post(post: &Value) -> Option<RestPost> {
    let title = rendered(post, "title").map(|t| strip_tags(&t))?;
    if title.is_empty() {
        return None;
    }

    let excerpt = rendered(post, "excerpt")
        .map(|e| collapse_whitespace(&strip_tags(&e)))
        .filter(|e| !e.is_empty())
        .map(|e| truncate_chars(&e, EXCERPT_MAX_CHARS));

    let year = post["date"]
        .as_str()
        .and_then(|d| d.get(..4))
        .filter(|y| y.chars().all(|c| c.is_ascii_digit()))
        .map(|y| y.to_string());

    let poster_url = post["_embedded"]["wp:featuredmedia"]
        .as_array()
        .and_then(|media| media.first())
        .and_then(|m| m["source_url"].as_str())
        .map(|s| s.to_string());

    Some(RestPost {
        id: post["id"].as_u64(),
        link: post["link"].as_str().map(|s| s.to_string()),
        title,
        excerpt,
        content_html: rendered(post, "content"),
        year,
        poster_url,
        genres: embedded_terms(post),
    })
}

/// Map a collection response. Posts that cannot be read are skipped; a body
/// that is not an array is a parse failure.
pub fn parse_posts(body: &Value) -> Result<Vec<RestPost>, OriginError> {
    let posts = body
        .as_array()
        .ok_or_else(|| OriginError::Parse("REST collection is not an array".into()))?;
    Ok(posts.iter().filter_map(parse_post).collect())
}

pub fn post_to_listing(post: &RestPost, content_type: ContentType, site: &OriginSite) -> Option<Listing> {
    let link = post.link.as_deref().and_then(|l| site.resolve(l))?;
    Some(
        Listing::new(content_type, post.title.clone(), link, post.poster_url.clone())
            .with_genres(post.genres.clone()),
    )
}

pub fn post_to_meta(post: &RestPost, identifier: &str, content_type: ContentType) -> MetaRecord {
    let mut meta = MetaRecord::new(identifier, content_type, post.title.clone());
    meta.poster_url = post.poster_url.clone();
    meta.description = post.excerpt.clone();
    meta.release_year = post.year.clone();
    for genre in &post.genres {
        meta.push_genre(genre);
    }
    meta
}

fn rendered(post: &Value, field: &str) -> Option<String> {
    match &post[field] {
        Value::String(s) => Some(s.clone()),
        other => other["rendered"].as_str().map(|s| s.to_string()),
    }
}

// `wp:term` is a list of term groups, one per taxonomy. Tags are not genres.
fn embedded_terms(post: &Value) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let Some(groups) = post["_embedded"]["wp:term"].as_array() else {
        return names;
    };
    for term in groups.iter().filter_map(Value::as_array).flatten() {
        if term["taxonomy"].as_str() == Some("post_tag") {
            continue;
        }
        let Some(name) = term["name"].as_str().map(strip_tags) else {
            continue;
        };
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}
