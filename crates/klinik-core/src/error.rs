//! 错误定义模块

use thiserror::Error;

/// 就诊系统统一错误类型
#[derive(Error, Debug)]
pub enum KlinikError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("数据库错误: {0}")]
    Database(String),

    #[error("表格服务错误: {0}")]
    Spreadsheet(String),

    #[error("上游数据源不可用: {0}")]
    Upstream(String),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("系统内部错误: {0}")]
    Internal(String),
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for KlinikError {
    fn from(err: sqlx::Error) -> Self {
        KlinikError::Database(err.to_string())
    }
}

/// 就诊系统统一结果类型
pub type Result<T> = std::result::Result<T, KlinikError>;
