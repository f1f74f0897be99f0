use std::sync::Arc;

use application::{
    ChatService, ChatServiceDependencies, Clock, UserService, UserServiceDependencies,
};
use infrastructure::{BroadcastDispatcher, ConnectionRegistry, Infrastructure, SessionSettings};
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub chat_service: Arc<ChatService>,
    pub registry: Arc<ConnectionRegistry>,
    pub dispatcher: Arc<BroadcastDispatcher>,
    pub session_settings: SessionSettings,
    /// 进程关闭信号，所有会话都监听它
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        user_service: Arc<UserService>,
        chat_service: Arc<ChatService>,
        registry: Arc<ConnectionRegistry>,
        dispatcher: Arc<BroadcastDispatcher>,
        session_settings: SessionSettings,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            user_service,
            chat_service,
            registry,
            dispatcher,
            session_settings,
            shutdown,
        }
    }

    /// 用基础设施组件装配用例服务
    pub fn from_infrastructure(
        infra: &Infrastructure,
        clock: Arc<dyn Clock>,
        shutdown: CancellationToken,
    ) -> Self {
        let user_service = UserService::new(UserServiceDependencies {
            user_repository: infra.user_repository(),
            clock: clock.clone(),
        });

        let chat_service = ChatService::new(ChatServiceDependencies {
            chat_repository: infra.chat_repository(),
            message_repository: infra.message_repository(),
            user_repository: infra.user_repository(),
            clock,
            publisher: infra.publisher(),
        });

        Self::new(
            Arc::new(user_service),
            Arc::new(chat_service),
            infra.registry.clone(),
            infra.dispatcher.clone(),
            infra.session_settings,
            shutdown,
        )
    }
}
