//! 删除路由
//!
//! 标识可以是文档库 UUID、JSON 形式的 `{"sheetName", "rowIndex"}`，
//! 或 `工作表名:行号`。每次调用只会对一个数据源发起一次删除。

use serde::Deserialize;
use std::str::FromStr;
use tracing::info;

use crate::error::{KlinikError, Result};
use crate::models::{Origin, RecordId};
use crate::source::{DocumentStore, SpreadsheetSource};

/// 表头所在行号，数据行从下一行开始
const HEADER_ROW: u32 = 1;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetRowRef {
    sheet_name: String,
    row_index: u32,
}

/// 工作表名保持原样，与读取时生成的标识一致
fn sheet_row(sheet: &str, row: u32) -> Result<RecordId> {
    if sheet.trim().is_empty() {
        return Err(KlinikError::Validation("sheet name is empty".to_string()));
    }
    if row <= HEADER_ROW {
        return Err(KlinikError::Validation(format!(
            "row {} is not a data row",
            row
        )));
    }
    Ok(RecordId::SheetRow {
        sheet: sheet.to_string(),
        row,
    })
}

impl FromStr for RecordId {
    type Err = KlinikError;

    fn from_str(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(KlinikError::Validation("record id is required".to_string()));
        }

        if let Ok(id) = uuid::Uuid::parse_str(trimmed) {
            return Ok(RecordId::Document(id));
        }

        if trimmed.starts_with('{') {
            let parsed: SheetRowRef = serde_json::from_str(trimmed).map_err(|e| {
                KlinikError::Validation(format!("malformed record id: {}", e))
            })?;
            return sheet_row(&parsed.sheet_name, parsed.row_index);
        }

        match raw.rsplit_once(':') {
            Some((sheet, row)) => {
                let row: u32 = row.trim().parse().map_err(|_| {
                    KlinikError::Validation(format!("malformed record id: {}", raw))
                })?;
                sheet_row(sheet, row)
            }
            None => Err(KlinikError::Validation(format!(
                "malformed record id: {}",
                raw
            ))),
        }
    }
}

/// 按记录来源把删除分派到对应数据源
pub async fn route_delete(
    id: &RecordId,
    documents: &dyn DocumentStore,
    spreadsheet: Option<&dyn SpreadsheetSource>,
) -> Result<Origin> {
    let deleted = match id {
        RecordId::Document(uuid) => documents.delete_visit(*uuid).await?,
        RecordId::SheetRow { sheet, row } => match spreadsheet {
            Some(source) => source.delete_row(sheet, *row).await?,
            None => {
                return Err(KlinikError::NotFound(format!(
                    "spreadsheet source is not configured: {}",
                    id
                )))
            }
        },
    };

    if !deleted {
        return Err(KlinikError::NotFound(format!("record not found: {}", id)));
    }

    info!("Deleted visit record {} from {}", id, id.origin());
    Ok(id.origin())
}
