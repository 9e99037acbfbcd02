use ala_core::error::ApiError;
use ala_core::{ContentType, Listing, MetaRecord, StreamCandidate};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::Uri;
use axum::response::Redirect;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::catalog::{self, CatalogQuery};
use crate::error::AppError;
use crate::manifest::{self, Manifest};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/manifest.json", get(get_manifest))
        .route("/catalog/{content_type}/{catalog}", get(get_catalog))
        .route(
            "/catalog/{content_type}/{catalog}/{extras}",
            get(get_catalog_with_extras),
        )
        .route("/meta/{content_type}/{id}", get(get_meta))
        .route("/stream/{content_type}/{id}", get(get_streams))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct CatalogResponse {
    pub metas: Vec<Listing>,
}

#[derive(Serialize)]
pub struct MetaResponse {
    pub meta: MetaBody,
}

/// Serializes as the record, or as `{}` when nothing could be resolved.
#[derive(Serialize)]
#[serde(untagged)]
pub enum MetaBody {
    Found(Box<MetaRecord>),
    Empty {},
}

#[derive(Serialize)]
pub struct StreamResponse {
    pub streams: Vec<StreamCandidate>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn root() -> Redirect {
    Redirect::temporary("/manifest.json")
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let catalogs = state.cache.status().await;
    Json(serde_json::json!({
        "status": "ok",
        "catalogs": catalogs,
    }))
}

async fn get_manifest(State(state): State<AppState>) -> Json<Manifest> {
    Json(manifest::build(&state.site))
}

async fn get_catalog(
    State(state): State<AppState>,
    Path((content_type, catalog)): Path<(String, String)>,
    query: Result<Query<CatalogQuery>, QueryRejection>,
) -> Result<Json<CatalogResponse>, AppError> {
    let catalog_id = json_stem(&catalog)?;
    let query = match query {
        Ok(Query(query)) => query,
        Err(e) => {
            warn!(error = %e, "unreadable catalog query, ignoring extras");
            CatalogQuery::default()
        }
    };
    Ok(Json(catalog_response(&state, &content_type, catalog_id, &query).await))
}

// The protocol's path form: `/catalog/{type}/{id}/search=x&skip=40.json`.
async fn get_catalog_with_extras(
    State(state): State<AppState>,
    Path((content_type, catalog_id, _)): Path<(String, String, String)>,
    uri: Uri,
) -> Result<Json<CatalogResponse>, AppError> {
    // Read the raw segment so percent-escaped `&` and `=` survive until the
    // form parser decodes them.
    let raw = uri.path().rsplit('/').next().unwrap_or_default();
    let extras = json_stem(raw)?;
    let query = CatalogQuery::from_extras(extras);
    Ok(Json(catalog_response(&state, &content_type, &catalog_id, &query).await))
}

async fn catalog_response(
    state: &AppState,
    content_type: &str,
    catalog_id: &str,
    query: &CatalogQuery,
) -> CatalogResponse {
    let declared = ContentType::parse(content_type)
        .filter(|ct| manifest::catalog_declared(*ct, catalog_id));
    let Some(content_type) = declared else {
        warn!(content_type, catalog_id, "unknown catalog");
        return CatalogResponse { metas: Vec::new() };
    };

    CatalogResponse {
        metas: catalog::catalog_page(&state.cache, content_type, query).await,
    }
}

async fn get_meta(
    State(state): State<AppState>,
    Path((content_type, id)): Path<(String, String)>,
) -> Result<Json<MetaResponse>, AppError> {
    let identifier = json_stem(&id)?;
    let empty = Json(MetaResponse {
        meta: MetaBody::Empty {},
    });
    let Some(content_type) = ContentType::parse(&content_type) else {
        warn!(content_type, "meta requested for an unknown content type");
        return Ok(empty);
    };
    let Some(origin_url) = owned_origin_url(&state, identifier) else {
        return Ok(empty);
    };

    match state.meta.resolve(identifier, content_type, &origin_url).await {
        Some(record) => Ok(Json(MetaResponse {
            meta: MetaBody::Found(Box::new(record)),
        })),
        None => {
            warn!(url = %origin_url, "no meta could be derived");
            Ok(empty)
        }
    }
}

async fn get_streams(
    State(state): State<AppState>,
    Path((content_type, id)): Path<(String, String)>,
) -> Result<Json<StreamResponse>, AppError> {
    let identifier = json_stem(&id)?;
    let Some(origin_url) = owned_origin_url(&state, identifier) else {
        return Ok(Json(StreamResponse { streams: Vec::new() }));
    };

    let streams = state
        .streams
        .resolve(ContentType::parse(&content_type), &origin_url)
        .await;
    Ok(Json(StreamResponse { streams }))
}

async fn not_found(uri: Uri) -> AppError {
    AppError(ApiError::NotFound(format!("no route for {}", uri.path())))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resource segments end in `.json`; anything else is not a route.
fn json_stem(segment: &str) -> Result<&str, AppError> {
    segment
        .strip_suffix(".json")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError(ApiError::NotFound(format!("no resource {segment}"))))
}

/// Decode an identifier, keeping it only if it points at the origin site.
fn owned_origin_url(state: &AppState, identifier: &str) -> Option<String> {
    let origin_url = match ala_core::decode(identifier) {
        Ok(url) => url,
        Err(e) => {
            warn!(identifier, error = %e, "undecodable identifier");
            return None;
        }
    };
    if !state.site.owns(&origin_url) {
        warn!(url = %origin_url, "identifier points outside the origin site");
        return None;
    }
    Some(origin_url)
}
