//! 单个实时连接的会话
//!
//! 状态机：`Accepted → Open → Closing → Terminated`。
//! 会话与具体的 WebSocket 库无关，传输层只需提供入站 `Stream` 与出站 `Sink`。
//! 只有写任务持有出站 `Sink`，关闭帧也由它发送。

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use config::RealtimeConfig;
use domain::{CloseReason, ConnectionId, SessionLifecycle, SessionState};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::websocket::{ConnectionRegistry, OutboundReceiver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub outbound_queue_capacity: usize,
    pub send_timeout: Duration,
    pub close_timeout: Duration,
}

impl From<&RealtimeConfig> for SessionSettings {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            outbound_queue_capacity: config.outbound_queue_capacity,
            send_timeout: config.send_timeout(),
            close_timeout: config.close_timeout(),
        }
    }
}

/// 传输层交给会话的入站帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    /// 二进制帧只记录长度
    Binary(usize),
    Ping,
    Pong,
    Close,
}

/// 会话交给传输层写出的帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Text(Arc<str>),
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    pub connection_id: ConnectionId,
    pub reason: CloseReason,
    pub final_state: SessionState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterExit {
    /// 会话要求停止
    Stopped,
    /// 出站队列的所有发送端都已释放
    QueueClosed,
    /// 写出失败或超时
    Failed,
}

pub struct ConnectionSession {
    lifecycle: SessionLifecycle,
    registry: Arc<ConnectionRegistry>,
    settings: SessionSettings,
    shutdown: CancellationToken,
    queue: OutboundReceiver,
    registered: bool,
}

impl ConnectionSession {
    /// 握手完成后创建会话并注册；注册成功进入 Open，否则直接进入 Closing
    pub async fn accept(
        connection_id: ConnectionId,
        registry: Arc<ConnectionRegistry>,
        settings: SessionSettings,
        shutdown: CancellationToken,
    ) -> Self {
        let (sender, queue) = mpsc::channel(settings.outbound_queue_capacity.max(1));
        let mut lifecycle = SessionLifecycle::new(connection_id);

        let registered = registry.register(connection_id, sender).await;
        if registered {
            if let Err(err) = lifecycle.open() {
                warn!(connection_id = %connection_id, error = %err, "failed to open session");
            }
        } else {
            warn!(connection_id = %connection_id, "connection id already registered, closing");
            lifecycle.begin_closing(CloseReason::RegistrationRejected);
        }

        Self {
            lifecycle,
            registry,
            settings,
            shutdown,
            queue,
            registered,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.lifecycle.connection_id()
    }

    pub fn state(&self) -> SessionState {
        self.lifecycle.state()
    }

    /// 驱动会话直到 Terminated
    pub async fn run<S, E, K>(self, mut inbound: S, outbound: K) -> SessionOutcome
    where
        S: Stream<Item = Result<InboundFrame, E>> + Unpin,
        E: Display,
        K: Sink<OutboundFrame> + Unpin + Send + 'static,
        K::Error: Display + Send,
    {
        let ConnectionSession {
            mut lifecycle,
            registry,
            settings,
            shutdown,
            queue,
            registered,
        } = self;
        let connection_id = lifecycle.connection_id();

        // 写任务只由会话自己停止，进程关闭先经过接收循环再传到写任务
        let stop = CancellationToken::new();
        let mut writer = tokio::spawn(write_loop(
            connection_id,
            queue,
            outbound,
            stop.clone(),
            settings.send_timeout,
        ));
        let mut writer_exit: Option<WriterExit> = None;

        if lifecycle.state() == SessionState::Open {
            info!(connection_id = %connection_id, "websocket session opened");
            let reason = loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break CloseReason::ServerShutdown,
                    exit = &mut writer, if writer_exit.is_none() => {
                        writer_exit = Some(writer_result(connection_id, exit));
                        break CloseReason::WriteFailed;
                    }
                    frame = inbound.next() => match frame {
                        Some(Ok(InboundFrame::Text(text))) => {
                            info!(connection_id = %connection_id, text = %text, "received text frame");
                        }
                        Some(Ok(InboundFrame::Binary(len))) => {
                            debug!(connection_id = %connection_id, len, "ignored binary frame");
                        }
                        Some(Ok(InboundFrame::Ping | InboundFrame::Pong)) => {
                            trace!(connection_id = %connection_id, "heartbeat");
                        }
                        Some(Ok(InboundFrame::Close)) => break CloseReason::PeerClosed,
                        Some(Err(err)) => {
                            warn!(connection_id = %connection_id, error = %err, "websocket read failed");
                            break CloseReason::TransportError;
                        }
                        None => break CloseReason::PeerGone,
                    }
                }
            };
            lifecycle.begin_closing(reason);
        }

        // Closing：停止写任务，由它尽力完成关闭握手
        stop.cancel();
        if writer_exit.is_none() {
            match tokio::time::timeout(settings.close_timeout, &mut writer).await {
                Ok(exit) => {
                    writer_exit = Some(writer_result(connection_id, exit));
                }
                Err(_) => {
                    warn!(connection_id = %connection_id, "close handshake timed out");
                    writer.abort();
                }
            }
        }

        lifecycle.terminate();
        if registered {
            registry.unregister(connection_id).await;
        }

        let reason = lifecycle
            .close_reason()
            .unwrap_or(CloseReason::TransportError);
        info!(
            connection_id = %connection_id,
            reason = ?reason,
            writer = ?writer_exit,
            "websocket session terminated"
        );

        SessionOutcome {
            connection_id,
            reason,
            final_state: lifecycle.state(),
        }
    }
}

fn writer_result(
    connection_id: ConnectionId,
    joined: Result<WriterExit, JoinError>,
) -> WriterExit {
    joined.unwrap_or_else(|err| {
        warn!(connection_id = %connection_id, error = %err, "writer task aborted");
        WriterExit::Failed
    })
}

async fn write_loop<K>(
    connection_id: ConnectionId,
    mut queue: OutboundReceiver,
    mut sink: K,
    stop: CancellationToken,
    send_timeout: Duration,
) -> WriterExit
where
    K: Sink<OutboundFrame> + Unpin,
    K::Error: Display + Send,
{
    let exit = loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break WriterExit::Stopped,
            next = queue.recv() => match next {
                Some(payload) => {
                    match tokio::time::timeout(send_timeout, sink.send(OutboundFrame::Text(payload))).await {
                        Ok(Ok(())) => {}
                        Ok(Err(err)) => {
                            warn!(connection_id = %connection_id, error = %err, "websocket write failed");
                            return WriterExit::Failed;
                        }
                        Err(_) => {
                            warn!(connection_id = %connection_id, "websocket write timed out");
                            return WriterExit::Failed;
                        }
                    }
                }
                None => break WriterExit::QueueClosed,
            }
        }
    };

    match tokio::time::timeout(send_timeout, sink.send(OutboundFrame::Close)).await {
        Ok(Ok(())) => {
            let _ = tokio::time::timeout(send_timeout, sink.close()).await;
        }
        Ok(Err(err)) => {
            debug!(connection_id = %connection_id, error = %err, "close frame not sent");
        }
        Err(_) => {
            debug!(connection_id = %connection_id, "close frame timed out");
        }
    }
    exit
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc as transport;

    fn settings() -> SessionSettings {
        SessionSettings {
            outbound_queue_capacity: 8,
            send_timeout: Duration::from_millis(200),
            close_timeout: Duration::from_millis(500),
        }
    }

    #[tokio::test]
    async fn accept_registers_and_opens() {
        let registry = Arc::new(ConnectionRegistry::new());
        let id = ConnectionId::new();
        let session =
            ConnectionSession::accept(id, registry.clone(), settings(), CancellationToken::new())
                .await;

        assert_eq!(session.state(), SessionState::Open);
        assert_eq!(session.connection_id(), id);
        assert!(registry.contains(id).await);
    }

    #[tokio::test]
    async fn rejected_registration_keeps_existing_entry() {
        let registry = Arc::new(ConnectionRegistry::new());
        let id = ConnectionId::new();
        let (existing, _existing_rx) = mpsc::channel(1);
        registry.register(id, existing).await;

        let session =
            ConnectionSession::accept(id, registry.clone(), settings(), CancellationToken::new())
                .await;
        assert_eq!(session.state(), SessionState::Closing);

        let (_in_tx, in_rx) = transport::unbounded::<Result<InboundFrame, String>>();
        let (out_tx, mut out_rx) = transport::unbounded::<OutboundFrame>();
        let outcome = session.run(in_rx, out_tx).await;

        assert_eq!(outcome.reason, CloseReason::RegistrationRejected);
        assert_eq!(outcome.final_state, SessionState::Terminated);
        // 不能移除属于另一个会话的条目
        assert!(registry.contains(id).await);
        assert_eq!(out_rx.next().await, Some(OutboundFrame::Close));
    }

    #[tokio::test]
    async fn queued_notifications_are_written_in_order() {
        let registry = Arc::new(ConnectionRegistry::new());
        let id = ConnectionId::new();
        let session =
            ConnectionSession::accept(id, registry.clone(), settings(), CancellationToken::new())
                .await;

        let (in_tx, in_rx) = transport::unbounded::<Result<InboundFrame, String>>();
        let (out_tx, mut out_rx) = transport::unbounded::<OutboundFrame>();
        let running = tokio::spawn(session.run(in_rx, out_tx));

        for (_, sender) in registry.snapshot().await {
            sender.try_send(Arc::from("first")).unwrap();
            sender.try_send(Arc::from("second")).unwrap();
        }
        assert_eq!(out_rx.next().await, Some(OutboundFrame::Text(Arc::from("first"))));
        assert_eq!(out_rx.next().await, Some(OutboundFrame::Text(Arc::from("second"))));

        in_tx.unbounded_send(Ok(InboundFrame::Text("hi".into()))).unwrap();
        drop(in_tx);

        let outcome = running.await.unwrap();
        assert_eq!(outcome.reason, CloseReason::PeerGone);
        assert!(!registry.contains(id).await);
    }

    #[tokio::test]
    async fn slow_writer_times_out_and_closes_session() {
        let registry = Arc::new(ConnectionRegistry::new());
        let id = ConnectionId::new();
        let settings = SessionSettings {
            send_timeout: Duration::from_millis(50),
            ..settings()
        };
        let session =
            ConnectionSession::accept(id, registry.clone(), settings, CancellationToken::new())
                .await;

        let (_in_tx, in_rx) = transport::unbounded::<Result<InboundFrame, String>>();
        // 容量为 0 且无人读取：第一次发送占用保留槽位，之后的发送一直阻塞
        let (out_tx, _out_rx) = transport::channel::<OutboundFrame>(0);
        let running = tokio::spawn(session.run(in_rx, out_tx));

        for (_, sender) in registry.snapshot().await {
            for text in ["a", "b", "c"] {
                sender.try_send(Arc::from(text)).unwrap();
            }
        }

        let outcome = running.await.unwrap();
        assert_eq!(outcome.reason, CloseReason::WriteFailed);
        assert_eq!(outcome.final_state, SessionState::Terminated);
        assert!(!registry.contains(id).await);
    }
}
