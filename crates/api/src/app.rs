use std::time::Duration;

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse, GraphQLSubscription};
use axum::{
    extract::State,
    middleware,
    response::Html,
    routing::{get, post},
    Extension, Router,
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::Claims;
use crate::error::AppError;
use crate::gql::AppSchema;
use crate::middleware::jwt_middleware;
use crate::routes;
use crate::state::AppState;

/// Build the Axum router with the health endpoint, GraphQL and the
/// avatar REST routes.
pub fn build_router(state: AppState, schema: AppSchema) -> Router {
    Router::new()
        // Simple liveness check; also proves DB connectivity.
        .route("/health", get(health))
        // graphql post & subscription
        .route(
            "/graphql",
            post(graphql_handler).get_service(GraphQLSubscription::new(schema.clone())),
        )
        .route("/graphiql", get(graphiql))
        .route(
            "/api/avatars",
            post(routes::avatars::upload).delete(routes::avatars::remove),
        )
        .route("/api/avatars/:file_name", get(routes::avatars::serve))
        .layer(Extension(schema))
        // Decodes a Bearer token into request extensions when present.
        .layer(middleware::from_fn_with_state(state.clone(), jwt_middleware))
        // App state (PgPool, broadcasters, etc.)
        .with_state(state)
        // Useful default middlewares
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CorsLayer::permissive()) // tighten later
}

/// Forwards the decoded claims (if any) into the GraphQL context so
/// resolvers can tell who is calling.
async fn graphql_handler(
    Extension(schema): Extension<AppSchema>,
    claims: Option<Extension<Claims>>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let mut req = req.into_inner();
    if let Some(Extension(claims)) = claims {
        req = req.data(claims);
    }
    schema.execute(req).await.into()
}

async fn graphiql() -> Html<String> {
    Html(
        GraphiQLSource::build()
            .endpoint("/graphql")
            .subscription_endpoint("/graphql")
            .finish(),
    )
}

/// Liveness + quick DB probe.
async fn health(State(state): State<AppState>) -> Result<&'static str, AppError> {
    infra::db::ping(&state.db).await?;
    Ok("ok")
}
