//! 数据库连接管理

use klinik_core::{KlinikError, Result};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

/// 连接池参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSettings {
    /// 连接字符串
    pub connection_string: String,
    /// 最大连接数
    pub max_connections: u32,
    /// 连接超时时间
    pub connect_timeout: Duration,
}

/// 数据库连接池
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// 建立连接池，失败时返回配置或数据库错误
    pub async fn connect(settings: &PoolSettings) -> Result<Self> {
        if settings.connection_string.trim().is_empty() {
            return Err(KlinikError::Config(
                "database connection string is not set".to_string(),
            ));
        }

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.connect_timeout)
            .connect(&settings.connection_string)
            .await?;

        info!(
            "Connected to database (max_connections={})",
            settings.max_connections
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 等待借出的连接归还后关闭连接池
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}
