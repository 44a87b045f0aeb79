//! 文档库接口的 PostgreSQL 实现

use async_trait::async_trait;
use klinik_core::{DocumentStore, NewVisit, Result, VisitDocument, VisitFilter};
use tracing::debug;
use uuid::Uuid;

use crate::connection::DatabasePool;
use crate::models::NewDbVisit;
use crate::queries::VisitQueries;

/// 基于 PostgreSQL 的就诊记录库
#[derive(Debug, Clone)]
pub struct PostgresVisitStore {
    pool: DatabasePool,
}

impl PostgresVisitStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub fn queries(&self) -> VisitQueries<'_> {
        VisitQueries::new(&self.pool)
    }

    /// 初始化表结构
    pub async fn migrate(&self) -> Result<()> {
        self.queries().create_tables().await
    }
}

#[async_trait]
impl DocumentStore for PostgresVisitStore {
    async fn find_visits(&self, filter: &VisitFilter) -> Result<Vec<VisitDocument>> {
        let docs = self.queries().find_visits(filter).await?;
        debug!("Loaded {} visits from database", docs.len());
        Ok(docs)
    }

    async fn insert_visit(&self, visit: &NewVisit) -> Result<VisitDocument> {
        let row = NewDbVisit::from_visit(visit)?;
        let id = self.queries().insert_visit(&row).await?;
        debug!("Inserted visit {}", id);
        Ok(row.to_document())
    }

    async fn delete_visit(&self, id: Uuid) -> Result<bool> {
        let affected = self.queries().delete_visit(&id).await?;
        Ok(affected > 0)
    }
}
