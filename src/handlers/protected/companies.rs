// handlers/protected/companies.rs - /api/companies handlers

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use uuid::Uuid;

use crate::api::{ClientResponse, CompanyRequest};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/companies
pub async fn companies_get(State(state): State<AppState>) -> ApiResult<Vec<ClientResponse>> {
    let companies = state.companies.get_all().await?;
    Ok(ApiResponse::success(companies.into_iter().map(ClientResponse::from).collect()))
}

/// POST /api/companies
pub async fn companies_post(
    State(state): State<AppState>,
    payload: Result<Json<CompanyRequest>, JsonRejection>,
) -> ApiResult<ClientResponse> {
    let Json(request) = payload?;
    let company = state.companies.create(request.validated()?).await?;
    Ok(ApiResponse::created(company.into()))
}

/// GET /api/companies/:id
pub async fn company_get(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<ClientResponse> {
    let Path(id) = id?;
    let company = state.companies.get_by_id(id).await?;
    Ok(ApiResponse::success(company.into()))
}

/// DELETE /api/companies/:id
pub async fn company_delete(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;
    state.companies.delete(id).await?;
    Ok(ApiResponse::no_content())
}
