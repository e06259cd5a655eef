//! HTTP route table.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{handlers, middleware, state::AppState};

/// Build the application router.
///
/// `/health` and `/api/v1/login` are public; everything else goes through
/// the bearer token middleware.
pub fn router(state: AppState) -> Router {
    let authenticated_routes = Router::new()
        // Account management routes
        .route(
            "/api/v1/accounts",
            post(handlers::accounts::create_account).get(handlers::accounts::list_accounts),
        )
        .route(
            "/api/v1/accounts/{id}",
            get(handlers::accounts::get_account).delete(handlers::accounts::close_account),
        )
        // Ledger routes
        .route(
            "/api/v1/accounts/{id}/deposit",
            post(handlers::transactions::deposit),
        )
        .route(
            "/api/v1/accounts/{id}/withdraw",
            post(handlers::transactions::withdraw),
        )
        .route(
            "/api/v1/accounts/{id}/transactions",
            get(handlers::transactions::list_transactions),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/v1/login", post(handlers::auth::login))
        .merge(authenticated_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
