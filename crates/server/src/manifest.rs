//! The addon manifest served at `/manifest.json`.

use ala_core::ContentType;
use ala_core::identity::NAMESPACE;
use ala_origin::OriginSite;
use ala_origin::slug::slugify;
use serde::Serialize;

pub const ADDON_ID: &str = "com.asialiveaction.stremio";
pub const SERIES_CATALOG: &str = "ala_series";
pub const MOVIE_CATALOG: &str = "ala_movies";

pub const GENRE_OPTIONS: &[&str] = &[
    "Romance",
    "Acción",
    "Comedia",
    "Drama",
    "Thriller",
    "Misterio",
    "Fantasía",
    "Histórico",
];

const LOGO_PATH: &str = "/wp-content/uploads/2020/01/cropped-favicon-1-192x192.png";
const BACKGROUND_PATH: &str = "/wp-content/uploads/2023/01/banner.jpg";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub id: &'static str,
    pub version: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub logo: String,
    pub background: String,
    pub resources: Vec<&'static str>,
    pub types: Vec<ContentType>,
    pub id_prefixes: Vec<&'static str>,
    pub catalogs: Vec<CatalogDecl>,
    pub behavior_hints: BehaviorHints,
}

#[derive(Debug, Serialize)]
pub struct CatalogDecl {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub id: &'static str,
    pub name: &'static str,
    pub extra: Vec<ExtraDecl>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraDecl {
    pub name: &'static str,
    pub is_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<&'static str>>,
}

#[derive(Debug, Serialize)]
pub struct BehaviorHints {
    pub adult: bool,
    pub p2p: bool,
}

impl ExtraDecl {
    fn optional(name: &'static str) -> Self {
        Self {
            name,
            is_required: false,
            options: None,
        }
    }
}

pub fn build(site: &OriginSite) -> Manifest {
    Manifest {
        id: ADDON_ID,
        version: env!("CARGO_PKG_VERSION"),
        name: "Asia Live Action",
        description: "Doramas, series y películas asiáticas desde asialiveaction.com",
        logo: site.url(LOGO_PATH),
        background: site.url(BACKGROUND_PATH),
        resources: vec!["catalog", "meta", "stream"],
        types: ContentType::ALL.to_vec(),
        id_prefixes: vec![NAMESPACE],
        catalogs: vec![
            CatalogDecl {
                content_type: ContentType::Series,
                id: SERIES_CATALOG,
                name: "Doramas y Series",
                extra: vec![
                    ExtraDecl::optional("search"),
                    ExtraDecl::optional("skip"),
                    ExtraDecl {
                        options: Some(GENRE_OPTIONS.to_vec()),
                        ..ExtraDecl::optional("genre")
                    },
                ],
            },
            CatalogDecl {
                content_type: ContentType::Movie,
                id: MOVIE_CATALOG,
                name: "Películas Asiáticas",
                extra: vec![ExtraDecl::optional("search"), ExtraDecl::optional("skip")],
            },
        ],
        behavior_hints: BehaviorHints {
            adult: false,
            p2p: false,
        },
    }
}

/// Whether `catalog_id` is declared for `content_type`.
pub fn catalog_declared(content_type: ContentType, catalog_id: &str) -> bool {
    matches!(
        (content_type, catalog_id),
        (ContentType::Series, SERIES_CATALOG) | (ContentType::Movie, MOVIE_CATALOG)
    )
}

/// The declared genre option matching `genre` by slug, so `accion` and
/// `Acción` name the same one.
pub fn declared_genre(genre: &str) -> Option<&'static str> {
    let wanted = slugify(genre);
    GENRE_OPTIONS
        .iter()
        .copied()
        .find(|option| slugify(option) == wanted)
}
