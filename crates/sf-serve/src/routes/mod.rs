pub mod status;

use crate::AppState;
use axum::Router;

pub fn router(state: AppState) -> Router {
    let api = Router::new().merge(status::router(state));

    Router::new().nest("/api", api)
}
