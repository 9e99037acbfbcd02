//! Human-readable titles from URL slugs, and slugs from titles.

use url::Url;

/// Trailing slug tokens that mark language or quality rather than the title.
const MARKER_TOKENS: &[&str] = &[
    "sub",
    "subtitulado",
    "espanol",
    "español",
    "esp",
    "latino",
    "castellano",
    "online",
    "hd",
];

/// Last non-empty path segment of `url`, percent-decoded.
pub fn slug_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()?;
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    Some(decoded)
}

/// Numeric post id carried as `?p=123`.
pub fn numeric_post_id(url: &str) -> Option<u64> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(k, _)| k == "p")
        .and_then(|(_, v)| v.parse().ok())
}

/// De-kebab a slug, drop trailing marker tokens, capitalize each word.
pub fn title_from_slug(slug: &str) -> String {
    let mut words: Vec<&str> = slug
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .collect();

    while words.len() > 1
        && words
            .last()
            .is_some_and(|w| MARKER_TOKENS.contains(&w.to_lowercase().as_str()))
    {
        words.pop();
    }

    words
        .iter()
        .map(|w| capitalize(w))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn title_from_url(url: &str) -> Option<String> {
    slug_from_url(url)
        .map(|s| title_from_slug(&s))
        .filter(|t| !t.is_empty())
}

/// WordPress-style slug: lowercase, accents folded, runs of other characters
/// collapsed to a single `-`.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.trim().chars().flat_map(char::to_lowercase) {
        let c = fold_accent(c);
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
