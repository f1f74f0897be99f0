mod chat_service;
mod user_service;

pub use chat_service::{
    ChatService, ChatServiceDependencies, CreateChatRequest, SendMessageRequest,
};
pub use user_service::{CreateUserRequest, UserService, UserServiceDependencies};
