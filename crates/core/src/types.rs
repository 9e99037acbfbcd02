use serde::{Deserialize, Serialize};

/// Content type as used by the addon protocol (`/catalog/{type}/...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Series,
    Movie,
}

impl ContentType {
    pub const ALL: [ContentType; 2] = [Self::Series, Self::Movie];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Series => "series",
            Self::Movie => "movie",
        }
    }

    /// Parse a protocol path segment. Unknown types yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "series" => Some(Self::Series),
            "movie" => Some(Self::Movie),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized, displayable reference to one item on the origin site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    #[serde(rename = "id")]
    pub identifier: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "poster", skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(rename = "posterShape")]
    pub poster_shape: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(skip)]
    pub origin_url: String,
}

impl Listing {
    /// Build a listing for `origin_url`; the identifier is derived from the URL.
    pub fn new(
        content_type: ContentType,
        display_name: impl Into<String>,
        origin_url: impl Into<String>,
        poster_url: Option<String>,
    ) -> Self {
        let origin_url = origin_url.into();
        Self {
            identifier: crate::identity::encode(&origin_url),
            content_type,
            display_name: display_name.into(),
            poster_url,
            poster_shape: "poster",
            genres: Vec::new(),
            origin_url,
        }
    }

    pub fn with_genres(mut self, genres: Vec<String>) -> Self {
        self.genres = genres;
        self
    }
}

/// Detail record for a single item, derived on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaRecord {
    #[serde(rename = "id")]
    pub identifier: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "poster", skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(rename = "posterShape")]
    pub poster_shape: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "releaseInfo", skip_serializing_if = "Option::is_none")]
    pub release_year: Option<String>,
    pub genres: Vec<String>,
    pub links: Vec<MetaLink>,
}

impl MetaRecord {
    pub fn new(
        identifier: impl Into<String>,
        content_type: ContentType,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            content_type,
            display_name: display_name.into(),
            poster_url: None,
            poster_shape: "poster",
            description: None,
            release_year: None,
            genres: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Add a genre unless an equal one (ignoring case) is already present.
    pub fn push_genre(&mut self, genre: &str) {
        let genre = genre.trim();
        if genre.is_empty() {
            return;
        }
        let folded = genre.to_lowercase();
        if !self.genres.iter().any(|g| g.to_lowercase() == folded) {
            self.genres.push(genre.to_string());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaLink {
    pub name: String,
    pub category: String,
    pub url: String,
}

/// Where a stream candidate points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StreamTarget {
    /// Directly playable media file.
    #[serde(rename = "url")]
    Playable(String),
    /// Page to be opened outside the player (embeds, the origin page).
    #[serde(rename = "externalUrl")]
    External(String),
}

impl StreamTarget {
    pub fn url(&self) -> &str {
        match self {
            Self::Playable(u) | Self::External(u) => u,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamCandidate {
    #[serde(rename = "name")]
    pub label: String,
    pub description: String,
    #[serde(flatten)]
    pub target: StreamTarget,
}

impl StreamCandidate {
    pub fn new(label: impl Into<String>, description: impl Into<String>, target: StreamTarget) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
            target,
        }
    }
}
