//! # 就诊数据库模块
//!
//! 以 PostgreSQL 作为主文档库，提供连接池、建表和就诊记录的增删查。

pub mod connection;
pub mod models;
pub mod queries;
pub mod store;

// 重新导出主要类型
pub use connection::{DatabasePool, PoolSettings};
pub use models::*;
pub use queries::VisitQueries;
pub use store::PostgresVisitStore;
