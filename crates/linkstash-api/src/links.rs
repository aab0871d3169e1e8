use axum::{
    Extension, Json,
    extract::{Query, State, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
};
use linkstash_types::NewLink;
use linkstash_types::api::{
    AddLinkRequest, Claims, DeleteLinkQuery, LinkResponse, LinksResponse, MarkReadRequest,
    SuccessResponse, ToggleFavoriteRequest,
};
use tracing::debug;

use crate::error::ApiError;
use crate::state::{AppState, blocking};

/// GET /api/links
pub async fn list_links(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<LinksResponse>, ApiError> {
    let links = blocking(move || Ok(state.links.list_links(&claims.sub)?)).await?;
    Ok(Json(LinksResponse {
        success: true,
        links,
    }))
}

/// POST /api/links
pub async fn add_link(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<AddLinkRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let new = NewLink::parse(&req.url, req.title.as_deref(), req.category.as_deref())?;

    let link =
        blocking(move || Ok(state.links.add_link(&claims.sub, &claims.username, new)?)).await?;

    Ok((
        StatusCode::CREATED,
        Json(LinkResponse {
            success: true,
            link,
        }),
    ))
}

/// DELETE /api/links?id=...
pub async fn delete_link(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    query: Result<Query<DeleteLinkQuery>, QueryRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Query(query) = query?;
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::Validation("Link id is required".into()))?;

    debug!("{} removing link {}", claims.username, id);
    blocking(move || Ok(state.links.remove_link(&claims.sub, &id)?)).await?;

    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/links/mark-read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<MarkReadRequest>, JsonRejection>,
) -> Result<Json<LinkResponse>, ApiError> {
    let Json(req) = payload?;

    let link =
        blocking(move || Ok(state.links.set_read(&claims.sub, &req.link_id, req.is_read)?))
            .await?;

    Ok(Json(LinkResponse {
        success: true,
        link,
    }))
}

/// POST /api/links/toggle-favorite
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<ToggleFavoriteRequest>, JsonRejection>,
) -> Result<Json<LinkResponse>, ApiError> {
    let Json(req) = payload?;

    let link = blocking(move || {
        Ok(state
            .links
            .set_favorite(&claims.sub, &req.link_id, req.is_favorite)?)
    })
    .await?;

    Ok(Json(LinkResponse {
        success: true,
        link,
    }))
}
