// handlers/public/system.rs - GET / and GET /health handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - service name, version and the routes it serves
pub async fn root_get() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Client and contract management API",
            "endpoints": {
                "auth": ["POST /api/auth/login"],
                "clients": [
                    "GET /api/clients",
                    "POST /api/clients",
                    "GET /api/clients/:id",
                    "PUT /api/clients/:id",
                    "DELETE /api/clients/:id"
                ],
                "persons": [
                    "GET /api/persons",
                    "POST /api/persons",
                    "GET /api/persons/:id",
                    "DELETE /api/persons/:id"
                ],
                "companies": [
                    "GET /api/companies",
                    "POST /api/companies",
                    "GET /api/companies/:id",
                    "DELETE /api/companies/:id"
                ],
                "contracts": [
                    "POST /api/contracts",
                    "PUT /api/contracts/:id/cost?newAmount=",
                    "GET /api/contracts/client/:clientId?updateDate=",
                    "GET /api/contracts/client/:clientId/total"
                ]
            }
        }
    }))
}

/// GET /health - 200 when the store answers, 503 otherwise
pub async fn health_get(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "UP", "store": "reachable" }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "data": { "status": "DOWN", "store": "unreachable" }
                })),
            )
        }
    }
}
