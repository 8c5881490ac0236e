//! REST Driving Adapter
//!
//! JSON mirror of the gRPC lifecycle surface, served with axum.

pub mod handlers;
pub mod router;

pub use handlers::RestState;
pub use router::build_router;
