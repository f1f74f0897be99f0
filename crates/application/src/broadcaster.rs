use async_trait::async_trait;
use domain::{ChatEvent, ChatId, ConnectionId, Timestamp, UserId};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("failed to encode notification: {0}")]
    Encode(#[from] serde_json::Error),
}

/// 单个接收者投递失败的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeliveryFailureCause {
    /// 出站队列已满，本条通知对该连接丢弃
    QueueFull,
    /// 会话的写任务已结束
    ChannelClosed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryFailure {
    pub connection_id: ConnectionId,
    pub cause: DeliveryFailureCause,
}

/// 一次扇出的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub kind: &'static str,
    pub recipients: usize,
    pub delivered: usize,
    pub failures: Vec<DeliveryFailure>,
}

impl DispatchReport {
    pub fn empty(kind: &'static str) -> Self {
        Self {
            kind,
            recipients: 0,
            delivered: 0,
            failures: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 写操作提交成功后的通知出口
///
/// 投递是尽力而为的：单个接收者的失败只体现在 [`DispatchReport`] 中，
/// 调用方不应因为推送失败而让写操作失败。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn publish(&self, event: ChatEvent) -> Result<DispatchReport, BroadcastError>;

    async fn publish_new_chat(
        &self,
        chat_id: ChatId,
        name: String,
        is_group: bool,
    ) -> Result<DispatchReport, BroadcastError> {
        self.publish(ChatEvent::chat_created(chat_id, name, is_group))
            .await
    }

    async fn publish_new_message(
        &self,
        chat_id: ChatId,
        sender_id: UserId,
        content: String,
        sent_at: Timestamp,
    ) -> Result<DispatchReport, BroadcastError> {
        self.publish(ChatEvent::message_sent(chat_id, sender_id, content, sent_at))
            .await
    }
}
