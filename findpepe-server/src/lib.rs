//! # findpepe server
//!
//! HTTP surface over [`findpepe_core`]: board discovery, filtered and
//! paginated image selection, and static serving of the image files under
//! their public prefix.

pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;
pub use routes::create_app;
