//! # 表格数据源模块
//!
//! 通过 Google Sheets v4 REST 接口读取补充的就诊表格，并支持按行删除。

pub mod api;
pub mod client;

pub use client::{SheetsAuth, SheetsClient, SheetsConfig};
