//! # 就诊 Web 接口
//!
//! 提供就诊记录的查询、新增、删除和统计接口。

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{create_app, AppState, WebServer};
