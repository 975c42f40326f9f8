use axum::{
    Router,
    http::{HeaderValue, header},
    routing::get,
};
use tower_http::{
    cors::CorsLayer, services::ServeDir,
    set_header::SetResponseHeaderLayer, trace::TraceLayer,
};

use crate::{
    handlers::{boards, health, images},
    infra::app_state::AppState,
};

pub mod paths {
    pub const PING: &str = "/ping";
    pub const BOARDS: &str = "/boards";
    pub const CATEGORY_BOARDS: &str = "/boards/{category}";
    pub const IMAGES: &str = "/";
}

pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route(paths::PING, get(health::ping))
        .route(paths::BOARDS, get(boards::list_all_boards))
        .route(paths::CATEGORY_BOARDS, get(boards::list_category_boards))
        .route(paths::IMAGES, get(images::select_images))
}

/// Full application: API routes, static image files under the public prefix
/// and the HTTP middleware stack.
pub fn create_app(state: AppState) -> Router {
    let config = state.config_handle();

    let router = create_api_router()
        .nest_service(
            &config.catalog.public_prefix,
            ServeDir::new(&config.catalog.storage_root),
        )
        .with_state(state);

    let router = if config.dev_mode {
        router.layer(CorsLayer::permissive())
    } else {
        router.layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
    };

    router.layer(TraceLayer::new_for_http())
}
