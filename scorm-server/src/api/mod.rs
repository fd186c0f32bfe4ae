//! HTTP API handlers for scorm-server

pub mod courses;
pub mod health;
pub mod runtime;
pub mod tracking;
pub mod upload;

pub use courses::course_routes;
pub use health::health_routes;
pub use runtime::runtime_routes;
pub use tracking::tracking_routes;
pub use upload::upload_routes;
