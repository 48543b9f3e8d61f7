// handlers/protected/clients.rs - /api/clients handlers

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use uuid::Uuid;

use crate::api::{ClientRequest, ClientResponse};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/clients
pub async fn clients_get(State(state): State<AppState>) -> ApiResult<Vec<ClientResponse>> {
    let clients = state.clients.get_all().await?;
    Ok(ApiResponse::success(clients.into_iter().map(ClientResponse::from).collect()))
}

/// POST /api/clients
pub async fn clients_post(
    State(state): State<AppState>,
    payload: Result<Json<ClientRequest>, JsonRejection>,
) -> ApiResult<ClientResponse> {
    let Json(request) = payload?;
    let client = state.clients.create(request.validated_for_create()?).await?;
    Ok(ApiResponse::created(client.into()))
}

/// GET /api/clients/:id
pub async fn client_get(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<ClientResponse> {
    let Path(id) = id?;
    let client = state.clients.get_by_id(id).await?;
    Ok(ApiResponse::success(client.into()))
}

/// PUT /api/clients/:id - only name, email and phone change
pub async fn client_put(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ClientRequest>, JsonRejection>,
) -> ApiResult<ClientResponse> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let client = state.clients.update(id, request.validated_for_update()?).await?;
    Ok(ApiResponse::success(client.into()))
}

/// DELETE /api/clients/:id - closes and detaches the client's active contracts first
pub async fn client_delete(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;
    state.clients.delete(id).await?;
    Ok(ApiResponse::no_content())
}
