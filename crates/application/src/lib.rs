//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务，处理输入校验、写入边界，
//! 以及对外部适配器（例如持久化存储、实时通知推送）的抽象。

pub mod broadcaster;
pub mod clock;
pub mod dto;
pub mod envelope;
pub mod error;
pub mod repository;
pub mod services;

pub use broadcaster::{
    BroadcastError, DeliveryFailure, DeliveryFailureCause, DispatchReport, NotificationPublisher,
};
pub use clock::{Clock, SystemClock};
pub use dto::{ChatDetailsDto, ChatDto, ChatLookupDto, MessageDto, UserDto, UserSummaryDto};
pub use envelope::NotificationEnvelope;
pub use error::ApplicationError;
pub use repository::{ChatRepository, MessageRepository, UserRepository};
pub use services::{ChatService, ChatServiceDependencies, UserService, UserServiceDependencies};
