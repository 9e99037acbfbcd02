//! Player references inside item markup.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

/// Substrings that mark an iframe as a video player.
pub const PLAYER_KEYWORDS: &[&str] = &["player", "embed", "video", "watch", "stream"];

/// Extensions of directly playable streaming containers.
pub const DIRECT_EXTENSIONS: &[&str] = &[".mp4", ".m3u8"];

static IFRAME: LazyLock<Selector> = LazyLock::new(|| Selector::parse("iframe").unwrap());
static MEDIA_SOURCE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("source[src], video[src]").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerRef {
    /// Embedded player page.
    Embed(String),
    /// Media file the player can open itself.
    Direct(String),
}

/// Scan markup for embeds and direct media links, in document order per kind
/// (embeds first). `page_url` resolves relative references.
pub fn extract_player_refs(markup: &str, page_url: &Url) -> Vec<PlayerRef> {
    let doc = Html::parse_document(markup);
    let mut seen = HashSet::new();
    let mut refs = Vec::new();

    for iframe in doc.select(&IFRAME) {
        let src = ["data-src", "data-lazy-src", "src"]
            .iter()
            .filter_map(|attr| iframe.value().attr(attr))
            .map(str::trim)
            .find(|s| !s.is_empty() && *s != "about:blank");
        let Some(url) = src.and_then(|s| absolute(s, page_url)) else {
            continue;
        };
        if looks_like_player(&url) && seen.insert(url.clone()) {
            refs.push(PlayerRef::Embed(url));
        }
    }

    let sources = doc
        .select(&MEDIA_SOURCE)
        .filter_map(|el| el.value().attr("src"));
    let anchors = doc.select(&ANCHOR).filter_map(|el| el.value().attr("href"));
    for raw in sources.chain(anchors) {
        let Some(url) = absolute(raw.trim(), page_url) else {
            continue;
        };
        if is_direct_media(&url) && seen.insert(url.clone()) {
            refs.push(PlayerRef::Direct(url));
        }
    }

    refs
}

pub fn looks_like_player(url: &str) -> bool {
    let lower = url.to_lowercase();
    PLAYER_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Path ends in a direct media extension (query and fragment ignored).
pub fn is_direct_media(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let path = parsed.path().to_lowercase();
    DIRECT_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

fn absolute(raw: &str, page_url: &Url) -> Option<String> {
    if raw.is_empty() || raw.starts_with("javascript:") || raw.starts_with('#') {
        return None;
    }
    let url = page_url.join(raw).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://asialiveaction.com/series/queen-of-tears/").unwrap()
    }

    #[test]
    fn finds_embeds_by_keyword() {
        let html = r#"
            <iframe src="https://ok.example/videoembed/123"></iframe>
            <iframe src="about:blank" data-src="//fembed.example/v/abc"></iframe>
            <iframe src="https://www.facebook.com/plugins/like.php"></iframe>
            <iframe src="https://STREAMTAPE.example/e/xyz"></iframe>
            <iframe src="https://ok.example/videoembed/123"></iframe>
            <iframe></iframe>"#;
        let refs = extract_player_refs(html, &page());
        assert_eq!(
            refs,
            vec![
                PlayerRef::Embed("https://ok.example/videoembed/123".into()),
                PlayerRef::Embed("https://fembed.example/v/abc".into()),
                PlayerRef::Embed("https://streamtape.example/e/xyz".into()),
            ]
        );
    }

    #[test]
    fn finds_direct_media_files() {
        let html = r#"
            <video src="/media/trailer.mp4"></video>
            <video><source src="https://cdn.example/hls/master.m3u8?token=abc" type="application/x-mpegURL"></video>
            <a href="https://cdn.example/file.MP4#t=10">Descargar</a>
            <a href="https://cdn.example/file.mkv">MKV</a>
            <a href="javascript:void(0)">x</a>"#;
        let refs = extract_player_refs(html, &page());
        assert_eq!(
            refs,
            vec![
                PlayerRef::Direct("https://asialiveaction.com/media/trailer.mp4".into()),
                PlayerRef::Direct("https://cdn.example/hls/master.m3u8?token=abc".into()),
                PlayerRef::Direct("https://cdn.example/file.MP4#t=10".into()),
            ]
        );
    }

    #[test]
    fn plain_page_has_no_players() {
        assert!(extract_player_refs("<p>Sinopsis</p>", &page()).is_empty());
    }
}
