//! 面向前端的 HTTP API

mod handlers;
mod middleware;
mod router;
mod types;

pub use middleware::AppState;
pub use router::create_router;
