use domain::{Chat, Message, Timestamp, User};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub email_confirmed: bool,
    pub created_at: Timestamp,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.0,
            username: user.username.as_str().to_owned(),
            email: user.email.as_str().to_owned(),
            email_confirmed: user.email_confirmed,
            created_at: user.created_at,
        }
    }
}

/// 列表与搜索中返回的用户摘要，不包含邮箱
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummaryDto {
    pub id: i64,
    pub username: String,
    pub created_at: Timestamp,
}

impl From<&User> for UserSummaryDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.0,
            username: user.username.as_str().to_owned(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatDto {
    pub id: i64,
    pub name: String,
    pub is_group: bool,
}

impl From<&Chat> for ChatDto {
    fn from(chat: &Chat) -> Self {
        Self {
            id: chat.id.0,
            name: chat.name.clone(),
            is_group: chat.is_group,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: i64,
    pub chat_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub sent_at: Timestamp,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.0,
            chat_id: message.chat_id.0,
            sender_id: message.sender_id.0,
            content: message.content.as_str().to_owned(),
            sent_at: message.sent_at,
        }
    }
}

/// 聊天详情：成员与消息历史
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatDetailsDto {
    pub id: i64,
    pub name: String,
    pub is_group: bool,
    pub users: Vec<UserSummaryDto>,
    pub messages: Vec<MessageDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLookupDto {
    pub chat_id: i64,
}
