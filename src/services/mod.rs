pub mod api;
pub mod liveness;
