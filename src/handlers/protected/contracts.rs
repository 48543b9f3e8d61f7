// handlers/protected/contracts.rs - /api/contracts handlers

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::api::{ActiveContractsQuery, ContractRequest, ContractResponse, CostUpdateQuery};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{self, Contract};
use crate::state::AppState;

/// POST /api/contracts - startDate defaults to now
pub async fn contracts_post(
    State(state): State<AppState>,
    payload: Result<Json<ContractRequest>, JsonRejection>,
) -> ApiResult<ContractResponse> {
    let Json(request) = payload?;
    let valid = request.validated(models::now())?;
    let contract = state
        .contracts
        .create_for_client(valid.client_id, valid.start_date, valid.end_date, valid.cost_amount)
        .await?;
    let response = with_client_name(&state, contract).await?;
    Ok(ApiResponse::created(response))
}

/// PUT /api/contracts/:id/cost?newAmount=
pub async fn contract_cost_put(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    query: Result<Query<CostUpdateQuery>, QueryRejection>,
) -> ApiResult<ContractResponse> {
    let Path(id) = id?;
    let Query(query) = query?;
    let contract = state.contracts.update_cost_amount(id, query.validated()?).await?;
    let response = with_client_name(&state, contract).await?;
    Ok(ApiResponse::success(response))
}

/// GET /api/contracts/client/:clientId?updateDate=
pub async fn client_contracts_get(
    State(state): State<AppState>,
    client_id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ActiveContractsQuery>, QueryRejection>,
) -> ApiResult<Vec<ContractResponse>> {
    let Path(client_id) = client_id?;
    let Query(query) = query?;
    let updated_since = query.updated_since()?;

    let client_name = state.store.find_client(client_id).await?.map(|client| client.name);
    let contracts = state.contracts.get_active_contracts(client_id, updated_since).await?;
    Ok(ApiResponse::success(
        contracts
            .into_iter()
            .map(|contract| ContractResponse::new(contract, client_name.clone()))
            .collect(),
    ))
}

/// GET /api/contracts/client/:clientId/total
pub async fn client_contracts_total_get(
    State(state): State<AppState>,
    client_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Decimal> {
    let Path(client_id) = client_id?;
    let total = state.contracts.get_total_active_contract_amount(client_id).await?;
    Ok(ApiResponse::success(total))
}

async fn with_client_name(state: &AppState, contract: Contract) -> Result<ContractResponse, ApiError> {
    let client_name = match contract.client_id {
        Some(client_id) => state.store.find_client(client_id).await?.map(|client| client.name),
        None => None,
    };
    Ok(ContractResponse::new(contract, client_name))
}
