//! REST API over the entity store.

pub mod files;
pub mod model_test;
pub mod protocol;
pub mod routes;
#[allow(clippy::module_inception)]
pub mod server;

pub use protocol::{HealthResponse, Status};
pub use routes::build_routes;
pub use server::{AppState, StudioServer};
