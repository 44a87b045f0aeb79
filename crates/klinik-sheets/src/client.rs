//! Google Sheets 客户端

use async_trait::async_trait;
use klinik_core::{KlinikError, Result, SheetValues, SpreadsheetSource};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api::{is_data_row, sheet_range, BatchUpdateRequest, SpreadsheetMeta, ValueRange};

pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com/v4";

/// 认证方式
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SheetsAuth {
    /// OAuth 访问令牌，读写均可
    BearerToken { token: String },
    /// API Key，只能读取公开表格
    ApiKey { key: String },
}

/// 表格数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    pub api_base: String,
    pub spreadsheet_id: String,
    pub auth: SheetsAuth,
    /// 按优先级排列的工作表
    pub sheet_names: Vec<String>,
    pub timeout: Duration,
}

/// Sheets v4 REST 客户端
#[derive(Debug, Clone)]
pub struct SheetsClient {
    config: SheetsConfig,
    base: Url,
    client: reqwest::Client,
}

impl SheetsClient {
    pub fn new(config: SheetsConfig) -> Result<Self> {
        if config.spreadsheet_id.trim().is_empty() {
            return Err(KlinikError::Config("spreadsheet id is not set".to_string()));
        }

        let base = Url::parse(config.api_base.trim_end_matches('/'))
            .map_err(|e| KlinikError::Config(format!("invalid sheets api base: {}", e)))?;
        if base.cannot_be_a_base() {
            return Err(KlinikError::Config(format!(
                "invalid sheets api base: {}",
                config.api_base
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| KlinikError::Config(format!("failed to build http client: {}", e)))?;

        info!(
            "Sheets client ready for spreadsheet {} ({} sheets)",
            config.spreadsheet_id,
            config.sheet_names.len()
        );
        Ok(Self {
            config,
            base,
            client,
        })
    }

    /// 拼接 `{base}/spreadsheets/{segments...}`
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("spreadsheets").extend(segments);
        }
        url
    }

    pub fn values_url(&self, sheet: &str) -> Url {
        let range = sheet_range(sheet);
        self.endpoint(&[self.config.spreadsheet_id.as_str(), "values", range.as_str()])
    }

    pub fn metadata_url(&self) -> Url {
        let mut url = self.endpoint(&[self.config.spreadsheet_id.as_str()]);
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties(sheetId,title)");
        url
    }

    pub fn batch_update_url(&self) -> Url {
        let segment = format!("{}:batchUpdate", self.config.spreadsheet_id);
        self.endpoint(&[segment.as_str()])
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.auth {
            SheetsAuth::BearerToken { token } => request.bearer_auth(token),
            SheetsAuth::ApiKey { key } => request.query(&[("key", key)]),
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| KlinikError::Spreadsheet(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KlinikError::Spreadsheet(format!(
                "sheets api returned {}: {}",
                status,
                body.trim()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| KlinikError::Spreadsheet(format!("invalid sheets api response: {}", e)))
    }

    /// 读取工作表的全部单元格
    pub async fn fetch_values(&self, sheet: &str) -> Result<Vec<Vec<String>>> {
        let range: ValueRange = self.send(self.client.get(self.values_url(sheet))).await?;
        Ok(range.into_grid())
    }

    /// 读取工作表列表
    pub async fn fetch_metadata(&self) -> Result<SpreadsheetMeta> {
        self.send(self.client.get(self.metadata_url())).await
    }
}

#[async_trait]
impl SpreadsheetSource for SheetsClient {
    fn sheet_names(&self) -> Vec<String> {
        self.config.sheet_names.clone()
    }

    async fn read_sheet(&self, sheet: &str) -> Result<SheetValues> {
        let values = SheetValues::from_grid(self.fetch_values(sheet).await?);
        debug!("Read {} rows from sheet {}", values.rows.len(), sheet);
        Ok(values)
    }

    async fn delete_row(&self, sheet: &str, row: u32) -> Result<bool> {
        if let SheetsAuth::ApiKey { .. } = self.config.auth {
            return Err(KlinikError::Spreadsheet(
                "deleting rows requires an access token".to_string(),
            ));
        }

        let meta = self.fetch_metadata().await?;
        let Some(sheet_id) = meta.sheet_id(sheet) else {
            warn!("Sheet {} not found in spreadsheet", sheet);
            return Ok(false);
        };

        let values = self.read_sheet(sheet).await?;
        if !is_data_row(row, values.last_row_number()) {
            debug!(
                "Row {} is outside sheet {} (last row {})",
                row,
                sheet,
                values.last_row_number()
            );
            return Ok(false);
        }

        let body = BatchUpdateRequest::delete_row(sheet_id, row);
        let _: serde_json::Value = self
            .send(self.client.post(self.batch_update_url()).json(&body))
            .await?;

        info!("Deleted row {} from sheet {}", row, sheet);
        Ok(true)
    }
}
