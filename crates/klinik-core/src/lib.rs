//! # Klinik Core
//!
//! 就诊记录系统的核心模块：数据模型、错误定义，以及把文档库与表格两个
//! 数据源合并为统一记录流的规范化、过滤、去重流程。

pub mod dedup;
pub mod error;
pub mod filter;
pub mod models;
pub mod normalize;
pub mod router;
pub mod service;
pub mod source;
pub mod summary;
pub mod treatment;
pub mod utils;

pub use error::{KlinikError, Result};
pub use filter::VisitFilter;
pub use models::*;
pub use normalize::{Normalizer, ValidationRules};
pub use service::{FetchOutcome, VisitService};
pub use source::{DocumentStore, SpreadsheetSource};
pub use summary::VisitSummary;
pub use treatment::TreatmentFlag;
