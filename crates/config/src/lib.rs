//! 统一配置中心
//!
//! 提供应用的全局配置管理，包括：
//! - 服务监听地址
//! - 实时推送（出站队列容量、写超时、关闭与排空超时）
//!
//! 加载顺序：内置默认值 → `messenger.toml`（可选）→ `MESSENGER_` 前缀的环境变量，
//! 嵌套字段用 `__` 分隔，例如 `MESSENGER_REALTIME__OUTBOUND_QUEUE_CAPACITY=128`。

use std::path::Path;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "messenger.toml";

/// 环境变量前缀
pub const ENV_PREFIX: &str = "MESSENGER_";

/// 全局应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务配置
    pub server: ServerConfig,
    /// 实时推送配置
    pub realtime: RealtimeConfig,
}

/// 服务器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 实时推送配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// 每个连接的出站队列容量，队列满时新通知对该连接丢弃
    pub outbound_queue_capacity: usize,
    /// 单帧写出超时，超时的连接会被关闭
    pub send_timeout_ms: u64,
    /// 关闭握手超时
    pub close_timeout_ms: u64,
    /// 进程关闭时等待所有会话注销的时间
    pub shutdown_drain_ms: u64,
}

impl RealtimeConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }

    pub fn shutdown_drain(&self) -> Duration {
        Duration::from_millis(self.shutdown_drain_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_queue_capacity: 64,
            send_timeout_ms: 5_000,
            close_timeout_ms: 1_000,
            shutdown_drain_ms: 5_000,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            realtime: RealtimeConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从默认配置文件和环境变量加载配置
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// 从指定的 TOML 文件（不存在时忽略）和环境变量加载配置
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: AppConfig = Self::figment(path.as_ref())
            .extract()
            .map_err(|err| ConfigError::Load(Box::new(err)))?;
        config.validate()?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// 监听地址，形如 `127.0.0.1:8080`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::InvalidServerConfig(
                "host cannot be empty".to_string(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::InvalidServerConfig(
                "port must be greater than 0".to_string(),
            ));
        }

        let realtime = &self.realtime;
        if realtime.outbound_queue_capacity == 0 {
            return Err(ConfigError::InvalidRealtimeConfig(
                "outbound_queue_capacity must be greater than 0".to_string(),
            ));
        }
        if realtime.send_timeout_ms == 0 || realtime.close_timeout_ms == 0 {
            return Err(ConfigError::InvalidRealtimeConfig(
                "send and close timeouts must be greater than 0".to_string(),
            ));
        }
        if realtime.shutdown_drain_ms == 0 {
            return Err(ConfigError::InvalidRealtimeConfig(
                "shutdown_drain_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(Box<figment::Error>),
    #[error("Invalid server configuration: {0}")]
    InvalidServerConfig(String),
    #[error("Invalid realtime configuration: {0}")]
    InvalidRealtimeConfig(String),
}
