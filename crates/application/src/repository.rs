//! 持久化存储的抽象
//!
//! ID 由存储层在写入时分配，因此创建接口接收 `New*` 草稿并返回完整实体。

use async_trait::async_trait;
use domain::{
    Chat, ChatId, Message, NewChat, NewMessage, NewUser, RepositoryError, User, UserEmail, UserId,
    Username,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 用户名或邮箱已存在时返回 `RepositoryError::Conflict`
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    async fn find_by_username(&self, username: Username) -> Result<Option<User>, RepositoryError>;
    async fn find_by_email(&self, email: UserEmail) -> Result<Option<User>, RepositoryError>;
    /// 返回给定 ID 中存在的用户，不存在的 ID 被忽略
    async fn find_many(&self, ids: Vec<UserId>) -> Result<Vec<User>, RepositoryError>;
    async fn list(&self) -> Result<Vec<User>, RepositoryError>;
    /// 用户名包含给定片段的用户
    async fn search_by_username(&self, fragment: String) -> Result<Vec<User>, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn create(&self, chat: NewChat) -> Result<Chat, RepositoryError>;
    async fn find_by_id(&self, id: ChatId) -> Result<Option<Chat>, RepositoryError>;
    /// 成员集合与给定集合完全一致的聊天
    async fn find_by_exact_members(
        &self,
        user_ids: Vec<UserId>,
    ) -> Result<Option<Chat>, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, message: NewMessage) -> Result<Message, RepositoryError>;
    /// 按发送时间升序返回聊天内的全部消息
    async fn list_by_chat(&self, chat_id: ChatId) -> Result<Vec<Message>, RepositoryError>;
}
