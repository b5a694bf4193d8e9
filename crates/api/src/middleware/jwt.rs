use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Decodes a Bearer token when one is present and stashes the claims in
/// the request extensions for the GraphQL context and REST handlers.
/// Requests without a valid token pass through unauthenticated; each
/// resolver decides whether it needs an identity.
pub async fn jwt_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(&request) {
        if let Ok(claims) = state.jwt_service().verify_token(token) {
            request.extensions_mut().insert(claims);
        }
    }

    next.run(request).await
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
