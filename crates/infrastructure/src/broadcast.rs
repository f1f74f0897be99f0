//! 通知扇出
//!
//! 每次发布只序列化一次，然后对注册表中的每个连接做一次非阻塞入队。
//! 队列已满时丢弃本条通知（只影响该连接），写任务的发送超时负责淘汰慢连接。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use application::{
    BroadcastError, DeliveryFailure, DeliveryFailureCause, DispatchReport, NotificationEnvelope,
    NotificationPublisher,
};
use async_trait::async_trait;
use domain::ChatEvent;
use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::websocket::ConnectionRegistry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatcherStats {
    pub published: u64,
    pub delivered: u64,
    pub dropped_full: u64,
    pub dropped_closed: u64,
}

#[derive(Default)]
struct DispatchCounters {
    published: AtomicU64,
    delivered: AtomicU64,
    dropped_full: AtomicU64,
    dropped_closed: AtomicU64,
}

pub struct BroadcastDispatcher {
    registry: Arc<ConnectionRegistry>,
    counters: DispatchCounters,
}

impl BroadcastDispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            counters: DispatchCounters::default(),
        }
    }

    pub fn stats(&self) -> DispatcherStats {
        DispatcherStats {
            published: self.counters.published.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            dropped_full: self.counters.dropped_full.load(Ordering::Relaxed),
            dropped_closed: self.counters.dropped_closed.load(Ordering::Relaxed),
        }
    }

    fn record(&self, report: &DispatchReport) {
        self.counters.published.fetch_add(1, Ordering::Relaxed);
        self.counters
            .delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        for failure in &report.failures {
            let counter = match failure.cause {
                DeliveryFailureCause::QueueFull => &self.counters.dropped_full,
                DeliveryFailureCause::ChannelClosed => &self.counters.dropped_closed,
            };
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[async_trait]
impl NotificationPublisher for BroadcastDispatcher {
    async fn publish(&self, event: ChatEvent) -> Result<DispatchReport, BroadcastError> {
        let chat_id = event.chat_id();
        let envelope = NotificationEnvelope::from(event);
        let payload = envelope.encode()?;
        let mut report = DispatchReport::empty(envelope.kind());

        self.registry
            .for_each(|connection_id, sender| {
                report.recipients += 1;
                match sender.try_send(payload.clone()) {
                    Ok(()) => report.delivered += 1,
                    Err(TrySendError::Full(_)) => report.failures.push(DeliveryFailure {
                        connection_id,
                        cause: DeliveryFailureCause::QueueFull,
                    }),
                    Err(TrySendError::Closed(_)) => report.failures.push(DeliveryFailure {
                        connection_id,
                        cause: DeliveryFailureCause::ChannelClosed,
                    }),
                }
            })
            .await;

        self.record(&report);

        for failure in &report.failures {
            warn!(
                connection_id = %failure.connection_id,
                chat_id = %chat_id,
                kind = report.kind,
                cause = ?failure.cause,
                "notification not delivered"
            );
        }
        debug!(
            chat_id = %chat_id,
            kind = report.kind,
            recipients = report.recipients,
            delivered = report.delivered,
            "notification dispatched"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use domain::{ChatId, ConnectionId, UserId};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn publish_without_connections_is_empty() {
        let dispatcher = BroadcastDispatcher::new(Arc::new(ConnectionRegistry::new()));
        let report = dispatcher
            .publish_new_chat(ChatId(1), "a".into(), false)
            .await
            .unwrap();

        assert_eq!(report, DispatchReport::empty("NewChat"));
        assert_eq!(dispatcher.stats().published, 1);
    }

    #[tokio::test]
    async fn full_queue_drops_only_for_that_connection() {
        let registry = Arc::new(ConnectionRegistry::new());
        let slow = ConnectionId::new();
        let fast = ConnectionId::new();
        let (slow_tx, _slow_rx) = mpsc::channel(1);
        let (fast_tx, mut fast_rx) = mpsc::channel(8);
        registry.register(slow, slow_tx).await;
        registry.register(fast, fast_tx).await;

        let dispatcher = BroadcastDispatcher::new(registry);
        let sent_at = Utc.with_ymd_and_hms(2024, 11, 30, 11, 3, 31).unwrap();
        dispatcher
            .publish_new_message(ChatId(1), UserId(1), "one".into(), sent_at)
            .await
            .unwrap();
        let second = dispatcher
            .publish_new_message(ChatId(1), UserId(1), "two".into(), sent_at)
            .await
            .unwrap();

        assert_eq!(second.recipients, 2);
        assert_eq!(second.delivered, 1);
        assert_eq!(
            second.failures,
            vec![DeliveryFailure {
                connection_id: slow,
                cause: DeliveryFailureCause::QueueFull,
            }]
        );

        assert!(fast_rx.recv().await.unwrap().contains("\"one\""));
        assert!(fast_rx.recv().await.unwrap().contains("\"two\""));

        let stats = dispatcher.stats();
        assert_eq!(stats.published, 2);
        assert_eq!(stats.delivered, 3);
        assert_eq!(stats.dropped_full, 1);
        assert_eq!(stats.dropped_closed, 0);
    }
}
