use serde::{Deserialize, Serialize};

use crate::value_objects::{ChatId, MessageContent, MessageId, Timestamp, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub content: MessageContent,
    pub sent_at: Timestamp,
}

/// 待持久化的消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub content: MessageContent,
    pub sent_at: Timestamp,
}

impl NewMessage {
    pub fn into_message(self, id: MessageId) -> Message {
        Message {
            id,
            chat_id: self.chat_id,
            sender_id: self.sender_id,
            content: self.content,
            sent_at: self.sent_at,
        }
    }
}
