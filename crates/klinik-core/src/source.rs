//! 数据源接口
//!
//! 文档库与表格服务由调用方注入，核心逻辑只依赖这里的 trait。

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::filter::VisitFilter;
use crate::models::{NewVisit, SheetValues, VisitDocument};

/// 主数据库（文档库）
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 查询就诊记录，实现可以把过滤条件下推到存储层
    async fn find_visits(&self, filter: &VisitFilter) -> Result<Vec<VisitDocument>>;

    /// 写入一条记录并返回带原生标识的结果
    async fn insert_visit(&self, visit: &NewVisit) -> Result<VisitDocument>;

    /// 按原生标识删除，返回是否删除了记录
    async fn delete_visit(&self, id: Uuid) -> Result<bool>;
}

/// 补充数据源（表格）
#[async_trait]
pub trait SpreadsheetSource: Send + Sync {
    /// 需要读取的工作表，按优先级排列
    fn sheet_names(&self) -> Vec<String>;

    /// 读取一个工作表的表头和数据行
    async fn read_sheet(&self, sheet: &str) -> Result<SheetValues>;

    /// 删除指定行号（从 1 开始）的整行，工作表或行不存在时返回 `false`
    async fn delete_row(&self, sheet: &str, row: u32) -> Result<bool>;
}
