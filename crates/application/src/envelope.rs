//! 实时通知的线上格式
//!
//! 每条通知是一个带 `Type` 标签的 JSON 对象：
//!
//! ```json
//! {"Type":"NewChat","ChatId":7,"ChatName":"Team","IsGroup":true}
//! {"Type":"NewMessage","ChatId":7,"SenderId":3,"Content":"hi","SentAt":"2024-11-30T11:03:31Z"}
//! ```
//!
//! 客户端按 `Type` 分发，未知类型解码为 [`NotificationEnvelope::Unknown`] 并被忽略。

use std::sync::Arc;

use domain::{ChatEvent, ChatId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Type")]
pub enum NotificationEnvelope {
    #[serde(rename_all = "PascalCase")]
    NewChat {
        chat_id: ChatId,
        chat_name: String,
        is_group: bool,
    },
    #[serde(rename_all = "PascalCase")]
    NewMessage {
        chat_id: ChatId,
        sender_id: UserId,
        content: String,
        sent_at: Timestamp,
    },
    /// 本版本不认识的通知类型
    #[serde(other)]
    Unknown,
}

impl NotificationEnvelope {
    /// `Type` 字段的取值
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEnvelope::NewChat { .. } => "NewChat",
            NotificationEnvelope::NewMessage { .. } => "NewMessage",
            NotificationEnvelope::Unknown => "Unknown",
        }
    }

    /// 序列化一次，供所有接收者共享
    pub fn encode(&self) -> Result<Arc<str>, serde_json::Error> {
        serde_json::to_string(self).map(Arc::from)
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl From<ChatEvent> for NotificationEnvelope {
    fn from(event: ChatEvent) -> Self {
        match event {
            ChatEvent::ChatCreated {
                chat_id,
                name,
                is_group,
            } => NotificationEnvelope::NewChat {
                chat_id,
                chat_name: name,
                is_group,
            },
            ChatEvent::MessageSent {
                chat_id,
                sender_id,
                content,
                sent_at,
            } => NotificationEnvelope::NewMessage {
                chat_id,
                sender_id,
                content,
                sent_at,
            },
        }
    }
}
