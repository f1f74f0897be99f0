use domain::{DomainError, RepositoryError};
use thiserror::Error;

/// 应用层错误
///
/// 通知推送失败不在此列：推送是尽力而为的，永远不会让写操作失败。
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}
