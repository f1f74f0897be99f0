//! 聊天相关的领域事件
//!
//! 只在写入成功提交后产生，携带构造通知所需的字段，而不是完整实体。

use serde::{Deserialize, Serialize};

use crate::entities::{chat::Chat, message::Message};
use crate::value_objects::{ChatId, Timestamp, UserId};

/// 聊天相关的领域事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatEvent {
    /// 新建聊天
    ChatCreated {
        chat_id: ChatId,
        name: String,
        is_group: bool,
    },

    /// 消息已持久化
    MessageSent {
        chat_id: ChatId,
        sender_id: UserId,
        content: String,
        sent_at: Timestamp,
    },
}

impl ChatEvent {
    pub fn chat_created(chat_id: ChatId, name: impl Into<String>, is_group: bool) -> Self {
        ChatEvent::ChatCreated {
            chat_id,
            name: name.into(),
            is_group,
        }
    }

    pub fn message_sent(
        chat_id: ChatId,
        sender_id: UserId,
        content: impl Into<String>,
        sent_at: Timestamp,
    ) -> Self {
        ChatEvent::MessageSent {
            chat_id,
            sender_id,
            content: content.into(),
            sent_at,
        }
    }

    pub fn chat_id(&self) -> ChatId {
        match self {
            ChatEvent::ChatCreated { chat_id, .. } | ChatEvent::MessageSent { chat_id, .. } => {
                *chat_id
            }
        }
    }
}

impl From<&Chat> for ChatEvent {
    fn from(chat: &Chat) -> Self {
        ChatEvent::chat_created(chat.id, chat.name.clone(), chat.is_group)
    }
}

impl From<&Message> for ChatEvent {
    fn from(message: &Message) -> Self {
        ChatEvent::message_sent(
            message.chat_id,
            message.sender_id,
            message.content.as_str(),
            message.sent_at,
        )
    }
}
