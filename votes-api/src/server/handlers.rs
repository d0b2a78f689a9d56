// HTTP request handlers
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use votes_engine::VoteReceipt;
use votes_shared::types::{RankedResource, ResourceId, UserId, Vote, VoteDirection};

use crate::server::extract::{ApiJson, ApiQuery};
use crate::server::response::{ApiResponse, HandlerError};
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceQuery {
    pub resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequestBody {
    pub resource_id: ResourceId,
    pub direction: VoteDirection,
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub n: Option<usize>,
}

/// Vote and resulting counters returned by the mutating endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteContent {
    pub vote: Option<Vote>,
    pub up_votes: u64,
    pub down_votes: u64,
}

impl From<VoteReceipt> for VoteContent {
    fn from(receipt: VoteReceipt) -> Self {
        Self {
            vote: receipt.vote,
            up_votes: receipt.counts.up,
            down_votes: receipt.counts.down,
        }
    }
}

fn current_user(state: &AppState, headers: &HeaderMap) -> Result<UserId, HandlerError> {
    Ok(state.identity.current_user(headers)?)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "Votes service is running")
}

/// GET /api/votes?resourceId=...
pub async fn get_vote(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<ResourceQuery>,
) -> Result<ApiResponse<Vote>, HandlerError> {
    let user_id = current_user(&state, &headers)?;
    let vote = state.coordinator.get_vote(user_id, query.resource_id).await?;
    Ok(ApiResponse::ok("Vote retrieved successfully.", vote))
}

/// POST /api/votes
pub async fn create_vote(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<VoteRequestBody>,
) -> Result<ApiResponse<VoteContent>, HandlerError> {
    let user_id = current_user(&state, &headers)?;
    let receipt = state
        .coordinator
        .create_vote(user_id, body.resource_id, body.direction)
        .await?;
    Ok(ApiResponse::ok("Vote recorded successfully.", receipt.into()))
}

/// PUT /api/votes
pub async fn change_vote(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<VoteRequestBody>,
) -> Result<ApiResponse<VoteContent>, HandlerError> {
    let user_id = current_user(&state, &headers)?;
    let receipt = state
        .coordinator
        .change_vote(user_id, body.resource_id, body.direction)
        .await?;
    Ok(ApiResponse::ok("Vote updated successfully.", receipt.into()))
}

/// DELETE /api/votes?resourceId=...
pub async fn remove_vote(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<ResourceQuery>,
) -> Result<ApiResponse<VoteContent>, HandlerError> {
    let user_id = current_user(&state, &headers)?;
    let receipt = state.coordinator.remove_vote(user_id, query.resource_id).await?;
    Ok(ApiResponse::ok("Vote deleted successfully.", receipt.into()))
}

/// GET /api/sections/{name}/top?n=5
pub async fn top_resources(
    State(state): State<AppState>,
    Path(section): Path<String>,
    ApiQuery(query): ApiQuery<TopQuery>,
) -> Result<Json<Vec<RankedResource>>, HandlerError> {
    let n = query.n.unwrap_or(state.top_n_default);
    Ok(Json(state.ranking.top_n(&section, n).await?))
}
