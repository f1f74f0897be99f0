//! Web API 层。
//!
//! 提供 Axum 路由，将 HTTP 请求委托给应用层的用例服务，并把 `/ws` 连接交给实时会话。

mod error;
mod routes;
mod state;
mod websocket;

pub use error::{ApiError, ErrorBody};
pub use routes::router;
pub use state::AppState;
pub use websocket::CONNECTION_ID_HEADER;
