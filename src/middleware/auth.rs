use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::Principal;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated user context attached to the request extensions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser(pub Principal);

/// Attach an `AuthUser` when the request carries a valid bearer token.
///
/// Never rejects: a missing or invalid token leaves the request
/// unauthenticated and `require_auth` decides what that means per route.
pub async fn jwt_auth_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    if let Some(token) = extract_bearer_token(request.headers()) {
        if state.jwt.is_valid(&token) {
            let principal = state
                .jwt
                .username(&token)
                .ok()
                .and_then(|username| state.authenticator.load_user(&username));
            match principal {
                Some(principal) => {
                    tracing::debug!("Authenticated request for user {}", principal.username);
                    request.extensions_mut().insert(AuthUser(principal));
                }
                None => tracing::warn!("Valid JWT for unknown user"),
            }
        } else {
            tracing::warn!("Invalid JWT token received");
        }
    }

    next.run(request).await
}

/// Reject requests that `jwt_auth_middleware` did not authenticate.
pub async fn require_auth(request: Request, next: Next) -> Response {
    if request.extensions().get::<AuthUser>().is_none() {
        return ApiError::unauthorized("Authentication required").into_response();
    }
    next.run(request).await
}

/// Bearer token from the Authorization header, if any
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(extract_bearer_token(&headers("Bearer abc.def")), Some("abc.def".to_string()));
        assert_eq!(extract_bearer_token(&headers("Bearer   ")), None);
        assert_eq!(extract_bearer_token(&headers("Basic dXNlcjpwdw==")), None);
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }
}
