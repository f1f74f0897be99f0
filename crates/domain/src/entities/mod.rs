//! 领域实体定义
//!
//! 包含系统的核心实体：用户、聊天、消息，以及实时连接的会话生命周期。

pub mod chat;
pub mod message;
pub mod user;
pub mod websocket;

// 重新导出核心实体
pub use chat::{Chat, NewChat};
pub use message::{Message, NewMessage};
pub use user::{NewUser, User};
pub use websocket::{CloseReason, SessionLifecycle, SessionState};
