use axum::Router;
use tower_http::trace::TraceLayer;

use crate::routes::{auth, health, home, valuation};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .merge(home::router())
        .merge(auth::router())
        .nest("/health", health::router())
        .nest("/api/valuation", valuation::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
