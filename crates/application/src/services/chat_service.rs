use std::sync::Arc;

use domain::{ChatEvent, ChatId, DomainError, MessageContent, NewChat, NewMessage, UserId};

use crate::{
    broadcaster::NotificationPublisher,
    clock::Clock,
    dto::{ChatDetailsDto, ChatDto, ChatLookupDto, MessageDto, UserSummaryDto},
    error::ApplicationError,
    repository::{ChatRepository, MessageRepository, UserRepository},
};

#[derive(Debug, Clone)]
pub struct CreateChatRequest {
    pub name: String,
    pub is_group: bool,
    pub user_ids: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct SendMessageRequest {
    pub chat_id: i64,
    pub sender_id: i64,
    pub content: String,
}

pub struct ChatServiceDependencies {
    pub chat_repository: Arc<dyn ChatRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub clock: Arc<dyn Clock>,
    pub publisher: Arc<dyn NotificationPublisher>,
}

/// 聊天用例，同时是实时通知的事件生产者
///
/// 只有在存储写入成功后才发布通知；发布失败只记录日志，不影响写操作的结果。
pub struct ChatService {
    deps: ChatServiceDependencies,
}

impl ChatService {
    pub fn new(deps: ChatServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn create_chat(&self, request: CreateChatRequest) -> Result<ChatDto, ApplicationError> {
        let requested: Vec<UserId> = request.user_ids.into_iter().map(UserId).collect();
        // 不存在的用户 ID 被静默忽略
        let members = self.deps.user_repository.find_many(requested).await?;
        let member_ids = members.iter().map(|user| user.id).collect();

        let draft = NewChat::new(
            request.name,
            request.is_group,
            member_ids,
            self.deps.clock.now(),
        )?;
        let chat = self.deps.chat_repository.create(draft).await?;

        tracing::info!(chat_id = %chat.id, is_group = chat.is_group, "chat created");

        match self.deps.publisher.publish(ChatEvent::from(&chat)).await {
            Ok(report) if !report.is_complete() => {
                tracing::warn!(
                    chat_id = %chat.id,
                    failed = report.failures.len(),
                    recipients = report.recipients,
                    "NewChat notification partially delivered"
                );
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(chat_id = %chat.id, error = %err, "failed to publish NewChat");
            }
        }

        Ok(ChatDto::from(&chat))
    }

    pub async fn get_chat(&self, chat_id: i64) -> Result<ChatDetailsDto, ApplicationError> {
        let chat = self
            .deps
            .chat_repository
            .find_by_id(ChatId(chat_id))
            .await?
            .ok_or(DomainError::ChatNotFound)?;

        let users = self
            .deps
            .user_repository
            .find_many(chat.member_ids.clone())
            .await?;
        let messages = self.deps.message_repository.list_by_chat(chat.id).await?;

        Ok(ChatDetailsDto {
            id: chat.id.0,
            name: chat.name,
            is_group: chat.is_group,
            users: users.iter().map(UserSummaryDto::from).collect(),
            messages: messages.iter().map(MessageDto::from).collect(),
        })
    }

    pub async fn send_message(
        &self,
        request: SendMessageRequest,
    ) -> Result<MessageDto, ApplicationError> {
        let sender_id = UserId(request.sender_id);
        let chat_id = ChatId(request.chat_id);

        self.deps
            .user_repository
            .find_by_id(sender_id)
            .await?
            .ok_or(DomainError::SenderNotFound)?;

        self.deps
            .chat_repository
            .find_by_id(chat_id)
            .await?
            .ok_or(DomainError::ChatNotFound)?;

        let content = MessageContent::new(request.content)?;
        let message = self
            .deps
            .message_repository
            .create(NewMessage {
                chat_id,
                sender_id,
                content,
                sent_at: self.deps.clock.now(),
            })
            .await?;

        tracing::info!(chat_id = %chat_id, sender_id = %sender_id, message_id = %message.id, "message stored");

        match self.deps.publisher.publish(ChatEvent::from(&message)).await {
            Ok(report) if !report.is_complete() => {
                tracing::warn!(
                    chat_id = %chat_id,
                    failed = report.failures.len(),
                    recipients = report.recipients,
                    "NewMessage notification partially delivered"
                );
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(chat_id = %chat_id, error = %err, "failed to publish NewMessage");
            }
        }

        Ok(MessageDto::from(&message))
    }

    pub async fn list_messages(&self, chat_id: i64) -> Result<Vec<MessageDto>, ApplicationError> {
        let messages = self
            .deps
            .message_repository
            .list_by_chat(ChatId(chat_id))
            .await?;
        Ok(messages.iter().map(MessageDto::from).collect())
    }

    pub async fn find_chat_by_members(
        &self,
        user_ids: Vec<i64>,
    ) -> Result<ChatLookupDto, ApplicationError> {
        let user_ids = user_ids.into_iter().map(UserId).collect();
        let chat = self
            .deps
            .chat_repository
            .find_by_exact_members(user_ids)
            .await?
            .ok_or(DomainError::ChatNotFound)?;
        Ok(ChatLookupDto { chat_id: chat.id.0 })
    }
}
