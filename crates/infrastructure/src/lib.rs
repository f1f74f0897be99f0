//! 基础设施层实现。
//!
//! 提供内存仓储、实时连接注册表、通知扇出与连接会话，实现应用层定义的接口。

pub mod broadcast;
pub mod builder;
pub mod repository;
pub mod session;
pub mod websocket;

pub use broadcast::{BroadcastDispatcher, DispatcherStats};
pub use builder::Infrastructure;
pub use repository::{InMemoryChatRepository, InMemoryMessageRepository, InMemoryUserRepository};
pub use session::{
    ConnectionSession, InboundFrame, OutboundFrame, SessionOutcome, SessionSettings,
};
pub use websocket::{ConnectionRegistry, OutboundReceiver, OutboundSender, RegistryStats};
