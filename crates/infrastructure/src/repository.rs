//! 内存仓储实现
//!
//! ID 由单调递增的计数器分配，从 1 开始。

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use application::{ChatRepository, MessageRepository, UserRepository};
use async_trait::async_trait;
use domain::{
    Chat, ChatId, Message, MessageId, NewChat, NewMessage, NewUser, RepositoryError, User,
    UserEmail, UserId, Username,
};
use tokio::sync::RwLock;

#[derive(Default)]
struct IdSequence(AtomicI64);

impl IdSequence {
    fn next(&self) -> i64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[derive(Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
    ids: Arc<IdSequence>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        let taken = users
            .values()
            .any(|existing| existing.username == user.username || existing.email == user.email);
        if taken {
            return Err(RepositoryError::Conflict);
        }

        let user = user.into_user(UserId(self.ids.next()));
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: Username) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.username == username).cloned())
    }

    async fn find_by_email(&self, email: UserEmail) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn find_many(&self, ids: Vec<UserId>) -> Result<Vec<User>, RepositoryError> {
        let users = self.users.read().await;
        let mut found: Vec<User> = ids.iter().filter_map(|id| users.get(id).cloned()).collect();
        found.sort_by_key(|user| user.id);
        found.dedup_by_key(|user| user.id);
        Ok(found)
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let mut all: Vec<User> = self.users.read().await.values().cloned().collect();
        all.sort_by_key(|user| user.id);
        Ok(all)
    }

    async fn search_by_username(&self, fragment: String) -> Result<Vec<User>, RepositoryError> {
        let needle = fragment.to_lowercase();
        let mut matched: Vec<User> = self
            .users
            .read()
            .await
            .values()
            .filter(|user| user.username.as_str().to_lowercase().contains(&needle))
            .cloned()
            .collect();
        matched.sort_by_key(|user| user.id);
        Ok(matched)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryChatRepository {
    chats: Arc<RwLock<HashMap<ChatId, Chat>>>,
    ids: Arc<IdSequence>,
}

impl InMemoryChatRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn create(&self, chat: NewChat) -> Result<Chat, RepositoryError> {
        let chat = chat.into_chat(ChatId(self.ids.next()));
        self.chats.write().await.insert(chat.id, chat.clone());
        Ok(chat)
    }

    async fn find_by_id(&self, id: ChatId) -> Result<Option<Chat>, RepositoryError> {
        Ok(self.chats.read().await.get(&id).cloned())
    }

    async fn find_by_exact_members(
        &self,
        user_ids: Vec<UserId>,
    ) -> Result<Option<Chat>, RepositoryError> {
        let chats = self.chats.read().await;
        // 多个匹配时取最早创建的
        Ok(chats
            .values()
            .filter(|chat| chat.has_exact_members(&user_ids))
            .min_by_key(|chat| chat.id)
            .cloned())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryMessageRepository {
    messages: Arc<RwLock<HashMap<ChatId, Vec<Message>>>>,
    ids: Arc<IdSequence>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn create(&self, message: NewMessage) -> Result<Message, RepositoryError> {
        let message = message.into_message(MessageId(self.ids.next()));
        self.messages
            .write()
            .await
            .entry(message.chat_id)
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    async fn list_by_chat(&self, chat_id: ChatId) -> Result<Vec<Message>, RepositoryError> {
        let mut messages = self
            .messages
            .read()
            .await
            .get(&chat_id)
            .cloned()
            .unwrap_or_default();
        messages.sort_by_key(|message| (message.sent_at, message.id));
        Ok(messages)
    }
}
