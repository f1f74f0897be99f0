//! 实时连接注册表
//!
//! 进程内唯一的共享可变结构：`ConnectionId → 出站队列发送端`。
//! 条目在会话注册成功时插入，在会话终止时由会话自己移除。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use domain::ConnectionId;
use serde::Serialize;
use tokio::sync::{mpsc, Notify, RwLock};
use tracing::{debug, info};

/// 每个连接的有界出站队列，元素是已序列化的通知
pub type OutboundSender = mpsc::Sender<Arc<str>>;
pub type OutboundReceiver = mpsc::Receiver<Arc<str>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub active: usize,
    pub registered_total: u64,
    pub unregistered_total: u64,
}

#[derive(Default)]
pub struct ConnectionRegistry {
    entries: RwLock<HashMap<ConnectionId, OutboundSender>>,
    registered_total: AtomicU64,
    unregistered_total: AtomicU64,
    emptied: Notify,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入新条目；标识已存在时不做任何修改并返回 `false`
    pub async fn register(&self, connection_id: ConnectionId, sender: OutboundSender) -> bool {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&connection_id) {
            debug!(connection_id = %connection_id, "duplicate registration ignored");
            return false;
        }
        entries.insert(connection_id, sender);
        self.registered_total.fetch_add(1, Ordering::Relaxed);
        info!(
            connection_id = %connection_id,
            active = entries.len(),
            "connection registered"
        );
        true
    }

    /// 移除条目；幂等，条目不存在时返回 `false`
    pub async fn unregister(&self, connection_id: ConnectionId) -> bool {
        let mut entries = self.entries.write().await;
        if entries.remove(&connection_id).is_none() {
            return false;
        }
        self.unregistered_total.fetch_add(1, Ordering::Relaxed);
        info!(
            connection_id = %connection_id,
            active = entries.len(),
            "connection unregistered"
        );
        if entries.is_empty() {
            self.emptied.notify_waiters();
        }
        true
    }

    /// 在读锁保护下遍历所有条目
    ///
    /// 遍历期间移除操作会等待，因此已完成移除的条目不会再被访问。
    /// `visit` 必须是同步的，不能在持锁期间等待。
    pub async fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(ConnectionId, &OutboundSender),
    {
        let entries = self.entries.read().await;
        for (connection_id, sender) in entries.iter() {
            visit(*connection_id, sender);
        }
    }

    /// 当前条目的快照
    pub async fn snapshot(&self) -> Vec<(ConnectionId, OutboundSender)> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(id, sender)| (*id, sender.clone()))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn contains(&self, connection_id: ConnectionId) -> bool {
        self.entries.read().await.contains_key(&connection_id)
    }

    pub async fn stats(&self) -> RegistryStats {
        RegistryStats {
            active: self.len().await,
            registered_total: self.registered_total.load(Ordering::Relaxed),
            unregistered_total: self.unregistered_total.load(Ordering::Relaxed),
        }
    }

    /// 等待所有会话注销，超时返回 `false`
    pub async fn wait_until_empty(&self, timeout: Duration) -> bool {
        let drained = async {
            loop {
                let notified = self.emptied.notified();
                tokio::pin!(notified);
                // 先登记等待者再检查，避免错过检查与等待之间的通知
                notified.as_mut().enable();
                if self.is_empty().await {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, drained).await.is_ok()
    }
}
