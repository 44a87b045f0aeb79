//! Sheets v4 接口的请求与响应结构

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `values.get` 响应
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub range: String,
    /// 全空的工作表不会返回该字段
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl ValueRange {
    /// 转为字符串网格，非字符串单元格按其 JSON 文本处理
    pub fn into_grid(self) -> Vec<Vec<String>> {
        self.values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect()
    }
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `spreadsheets.get` 响应中我们关心的部分
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpreadsheetMeta {
    #[serde(default)]
    pub sheets: Vec<SheetEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetEntry {
    pub properties: SheetProperties,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    pub sheet_id: i64,
    pub title: String,
}

impl SpreadsheetMeta {
    /// 按标题查找数值型工作表 ID
    pub fn sheet_id(&self, title: &str) -> Option<i64> {
        self.sheets
            .iter()
            .find(|s| s.properties.title == title)
            .map(|s| s.properties.sheet_id)
    }
}

/// `batchUpdate` 请求体
#[derive(Debug, Clone, Serialize)]
pub struct BatchUpdateRequest {
    pub requests: Vec<Request>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    DeleteDimension { range: DimensionRange },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionRange {
    pub sheet_id: i64,
    pub dimension: &'static str,
    pub start_index: u32,
    pub end_index: u32,
}

impl BatchUpdateRequest {
    /// 删除一整行，`row` 为从 1 开始的行号
    pub fn delete_row(sheet_id: i64, row: u32) -> Self {
        Self {
            requests: vec![Request::DeleteDimension {
                range: DimensionRange {
                    sheet_id,
                    dimension: "ROWS",
                    start_index: row.saturating_sub(1),
                    end_index: row,
                },
            }],
        }
    }
}

/// 第 1 行是表头，可删除的数据行为 `2..=last_row`
pub fn is_data_row(row: u32, last_row: u32) -> bool {
    row >= 2 && row <= last_row
}

/// 工作表名的 A1 区域写法，单引号需要成对转义
pub fn sheet_range(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}
