//! 即时通讯系统核心领域模型
//!
//! 包含用户、会话（聊天）、消息等核心实体，实时连接的生命周期状态机，
//! 以及持久化成功后产生的领域事件。

pub mod entities;
pub mod errors;
pub mod events;
pub mod value_objects;

// 重新导出常用类型
pub use entities::*;
pub use errors::*;
pub use events::*;
pub use value_objects::*;
