//! IdTag registry handlers

use axum::{
    extract::{Path, State},
    Json,
};

use super::commands::status_for_domain;
use super::dto::CreateIdTagBody;
use crate::domain::IdTag;
use crate::interfaces::http::common::{api_error, ApiResponse, ApiResult};
use crate::interfaces::http::ApiState;

pub async fn list_id_tags(State(state): State<ApiState>) -> ApiResult<Vec<IdTag>> {
    match state.services.authorization.list_id_tags().await {
        Ok(tags) => Ok(Json(ApiResponse::success(tags))),
        Err(e) => Err(api_error(status_for_domain(&e), e.to_string())),
    }
}

/// Insert or replace a tag.
pub async fn create_id_tag(
    State(state): State<ApiState>,
    Json(body): Json<CreateIdTagBody>,
) -> ApiResult<IdTag> {
    let tag = IdTag::from(body);
    match state.services.authorization.add_id_tag(tag.clone()).await {
        Ok(()) => Ok(Json(ApiResponse::success(tag))),
        Err(e) => Err(api_error(status_for_domain(&e), e.to_string())),
    }
}

pub async fn block_id_tag(
    State(state): State<ApiState>,
    Path(id_tag): Path<String>,
) -> ApiResult<String> {
    match state.services.authorization.block_id_tag(&id_tag).await {
        Ok(()) => Ok(Json(ApiResponse::success(id_tag))),
        Err(e) => Err(api_error(status_for_domain(&e), e.to_string())),
    }
}
