use std::sync::Arc;

use application::{ChatRepository, MessageRepository, NotificationPublisher, UserRepository};
use config::RealtimeConfig;

use crate::{
    broadcast::BroadcastDispatcher,
    repository::{InMemoryChatRepository, InMemoryMessageRepository, InMemoryUserRepository},
    session::SessionSettings,
    websocket::ConnectionRegistry,
};

/// 进程内共享的基础设施组件
///
/// 注册表只在这里创建一次，然后显式传给分发器、会话和 HTTP 状态。
#[derive(Clone)]
pub struct Infrastructure {
    pub users: Arc<InMemoryUserRepository>,
    pub chats: Arc<InMemoryChatRepository>,
    pub messages: Arc<InMemoryMessageRepository>,
    pub registry: Arc<ConnectionRegistry>,
    pub dispatcher: Arc<BroadcastDispatcher>,
    pub session_settings: SessionSettings,
}

impl Infrastructure {
    pub fn in_memory(realtime: &RealtimeConfig) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = Arc::new(BroadcastDispatcher::new(registry.clone()));

        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            chats: Arc::new(InMemoryChatRepository::new()),
            messages: Arc::new(InMemoryMessageRepository::new()),
            registry,
            dispatcher,
            session_settings: SessionSettings::from(realtime),
        }
    }

    pub fn user_repository(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    pub fn chat_repository(&self) -> Arc<dyn ChatRepository> {
        self.chats.clone()
    }

    pub fn message_repository(&self) -> Arc<dyn MessageRepository> {
        self.messages.clone()
    }

    pub fn publisher(&self) -> Arc<dyn NotificationPublisher> {
        self.dispatcher.clone()
    }
}
