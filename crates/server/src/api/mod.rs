pub mod handlers;
pub mod middleware;
pub mod presign;
pub mod routes;
pub mod ws;

pub use routes::create_router;
pub use ws::{ConnectionHub, WsNotifier};
