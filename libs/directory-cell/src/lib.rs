pub mod models;
pub mod registry;
pub mod handlers;
pub mod router;

pub use models::*;
pub use registry::*;
