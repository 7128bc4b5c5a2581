//! Ingestion 错误类型

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 配置非法
    #[error("invalid ingestion config: {field}: {message}")]
    InvalidConfig {
        /// 字段名
        field: &'static str,
        /// 错误信息
        message: String,
    },

    /// 事件源错误
    #[error(transparent)]
    Source(#[from] contracts::ContractError),
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
