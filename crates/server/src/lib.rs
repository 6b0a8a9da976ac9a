//! HTTP facade over the collection stores.
//!
//! Routes mirror the store surface one-to-one: glyph and dream creation
//! plus full listings.  All state lives in the shared [`GlyphDb`]; handlers
//! hold no caches, so every GET observes every prior POST.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use tracing::{error, info};

use glyphdb_store::{DreamSeed, GenericGlyph, GlyphDb, NewDream, NewGlyph, StoreError};

/// Store failure surfaced over HTTP as a 500 with a JSON error body.
struct ApiError(StoreError);

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "store operation failed");
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

pub fn router(db: Arc<GlyphDb>) -> Router {
    Router::new()
        .route("/gGlyphs", post(add_glyph).get(list_glyphs))
        .route("/dGlyphs", post(add_dream).get(list_dreams))
        .with_state(db)
}

async fn add_glyph(
    State(db): State<Arc<GlyphDb>>,
    Json(draft): Json<NewGlyph>,
) -> Result<Json<GenericGlyph>, ApiError> {
    Ok(Json(db.add_glyph(draft).await?))
}

async fn list_glyphs(
    State(db): State<Arc<GlyphDb>>,
) -> Result<Json<Vec<GenericGlyph>>, ApiError> {
    Ok(Json(db.list_glyphs().await?))
}

async fn add_dream(
    State(db): State<Arc<GlyphDb>>,
    Json(draft): Json<NewDream>,
) -> Result<Json<DreamSeed>, ApiError> {
    Ok(Json(db.add_dream(draft).await?))
}

async fn list_dreams(
    State(db): State<Arc<GlyphDb>>,
) -> Result<Json<Vec<DreamSeed>>, ApiError> {
    Ok(Json(db.list_dreams().await?))
}

/// Bind and serve until the task is cancelled or the listener fails.
pub async fn serve(db: Arc<GlyphDb>, bind_addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %listener.local_addr()?, "glyph api listening");
    axum::serve(listener, router(db)).await?;
    Ok(())
}
