//! 实时连接会话的生命周期
//!
//! 每个被接受的连接都经历 `Accepted → Open → Closing → Terminated`。
//! 清理工作（注销连接）只由状态迁移驱动，保证每个会话恰好注销一次。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::ConnectionId;

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// 握手完成，连接标识已生成
    Accepted,
    /// 已注册，正在接收入站帧
    Open,
    /// 正在执行关闭握手
    Closing,
    /// 终态，不持有任何资源
    Terminated,
}

impl SessionState {
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Accepted, Open) | (Accepted, Closing) | (Open, Closing) | (Closing, Terminated)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == SessionState::Terminated
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Accepted => "accepted",
            SessionState::Open => "open",
            SessionState::Closing => "closing",
            SessionState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// 进入 Closing 的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloseReason {
    /// 对端发送了关闭帧
    PeerClosed,
    /// 入站流结束（对端直接断开）
    PeerGone,
    /// 读取失败
    TransportError,
    /// 写出失败或超时
    WriteFailed,
    /// 进程关闭
    ServerShutdown,
    /// 注册失败（标识重复）
    RegistrationRejected,
}

/// 单个会话的状态机
#[derive(Debug, Clone)]
pub struct SessionLifecycle {
    connection_id: ConnectionId,
    state: SessionState,
    close_reason: Option<CloseReason>,
}

impl SessionLifecycle {
    pub fn new(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            state: SessionState::Accepted,
            close_reason: None,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        self.close_reason
    }

    /// Accepted → Open
    pub fn open(&mut self) -> Result<(), DomainError> {
        self.transition(SessionState::Open)
    }

    /// 进入 Closing；只有第一次调用返回 `true`，之后的触发都是无操作。
    pub fn begin_closing(&mut self, reason: CloseReason) -> bool {
        if self.transition(SessionState::Closing).is_err() {
            return false;
        }
        self.close_reason = Some(reason);
        true
    }

    /// Closing → Terminated；只有第一次调用返回 `true`。
    pub fn terminate(&mut self) -> bool {
        self.transition(SessionState::Terminated).is_ok()
    }

    fn transition(&mut self, next: SessionState) -> Result<(), DomainError> {
        if !self.state.can_transition_to(next) {
            return Err(DomainError::InvalidSessionTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_lifecycle() {
        let mut lifecycle = SessionLifecycle::new(ConnectionId::new());
        assert_eq!(lifecycle.state(), SessionState::Accepted);

        lifecycle.open().unwrap();
        assert_eq!(lifecycle.state(), SessionState::Open);

        assert!(lifecycle.begin_closing(CloseReason::PeerClosed));
        assert_eq!(lifecycle.state(), SessionState::Closing);

        assert!(lifecycle.terminate());
        assert!(lifecycle.state().is_terminal());
        assert_eq!(lifecycle.close_reason(), Some(CloseReason::PeerClosed));
    }

    #[test]
    fn repeated_close_triggers_are_noops() {
        let mut lifecycle = SessionLifecycle::new(ConnectionId::new());
        lifecycle.open().unwrap();

        assert!(lifecycle.begin_closing(CloseReason::PeerClosed));
        assert!(!lifecycle.begin_closing(CloseReason::TransportError));
        assert_eq!(lifecycle.close_reason(), Some(CloseReason::PeerClosed));

        assert!(lifecycle.terminate());
        assert!(!lifecycle.terminate());
        assert!(!lifecycle.begin_closing(CloseReason::ServerShutdown));
        assert_eq!(lifecycle.state(), SessionState::Terminated);
    }

    #[test]
    fn terminated_is_absorbing() {
        for next in [
            SessionState::Accepted,
            SessionState::Open,
            SessionState::Closing,
            SessionState::Terminated,
        ] {
            assert!(!SessionState::Terminated.can_transition_to(next));
        }
    }

    #[test]
    fn cannot_terminate_without_closing() {
        let mut lifecycle = SessionLifecycle::new(ConnectionId::new());
        lifecycle.open().unwrap();
        assert!(!lifecycle.terminate());
        assert!(lifecycle.open().is_err());
    }

    #[test]
    fn rejected_registration_closes_from_accepted() {
        let mut lifecycle = SessionLifecycle::new(ConnectionId::new());
        assert!(lifecycle.begin_closing(CloseReason::RegistrationRejected));
        assert!(lifecycle.terminate());
    }
}
