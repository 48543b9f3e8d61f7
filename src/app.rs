use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::config;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, require_auth};
use crate::state::AppState;

/// The full HTTP surface, ready for `axum::serve` or in-process `oneshot` calls.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        // Public
        .merge(public_routes())
        // Protected API
        .merge(protected_routes())
        // Global middleware
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
        .layer(DefaultBodyLimit::max(config().api.max_request_size_bytes));

    with_cors(router)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::root_get))
        .route("/health", get(public::health_get))
        .route("/api/auth/login", post(public::login_post))
}

fn protected_routes() -> Router<AppState> {
    Router::new()
        .merge(client_routes())
        .merge(contract_routes())
        .route_layer(from_fn(require_auth))
}

fn client_routes() -> Router<AppState> {
    use protected::{clients, companies, persons};

    Router::new()
        .route("/api/clients", get(clients::clients_get).post(clients::clients_post))
        .route(
            "/api/clients/:id",
            get(clients::client_get)
                .put(clients::client_put)
                .delete(clients::client_delete),
        )
        .route("/api/persons", get(persons::persons_get).post(persons::persons_post))
        .route("/api/persons/:id", get(persons::person_get).delete(persons::person_delete))
        .route("/api/companies", get(companies::companies_get).post(companies::companies_post))
        .route(
            "/api/companies/:id",
            get(companies::company_get).delete(companies::company_delete),
        )
}

fn contract_routes() -> Router<AppState> {
    use protected::contracts;

    Router::new()
        .route("/api/contracts", post(contracts::contracts_post))
        .route("/api/contracts/:id/cost", put(contracts::contract_cost_put))
        .route("/api/contracts/client/:client_id", get(contracts::client_contracts_get))
        .route(
            "/api/contracts/client/:client_id/total",
            get(contracts::client_contracts_total_get),
        )
}

fn with_cors(router: Router<AppState>) -> Router<AppState> {
    let security = &config().security;
    if !security.enable_cors {
        return router;
    }

    if security.cors_origins.is_empty() {
        return router.layer(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();
    router.layer(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
    )
}
