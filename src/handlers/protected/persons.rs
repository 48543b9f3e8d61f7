// handlers/protected/persons.rs - /api/persons handlers

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use uuid::Uuid;

use crate::api::{ClientResponse, PersonRequest};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/persons
pub async fn persons_get(State(state): State<AppState>) -> ApiResult<Vec<ClientResponse>> {
    let persons = state.persons.get_all().await?;
    Ok(ApiResponse::success(persons.into_iter().map(ClientResponse::from).collect()))
}

/// POST /api/persons
pub async fn persons_post(
    State(state): State<AppState>,
    payload: Result<Json<PersonRequest>, JsonRejection>,
) -> ApiResult<ClientResponse> {
    let Json(request) = payload?;
    let person = state.persons.create(request.validated()?).await?;
    Ok(ApiResponse::created(person.into()))
}

/// GET /api/persons/:id
pub async fn person_get(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<ClientResponse> {
    let Path(id) = id?;
    let person = state.persons.get_by_id(id).await?;
    Ok(ApiResponse::success(person.into()))
}

/// DELETE /api/persons/:id
pub async fn person_delete(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;
    state.persons.delete(id).await?;
    Ok(ApiResponse::no_content())
}
