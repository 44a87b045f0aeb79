//! 数据库查询操作

use crate::connection::DatabasePool;
use crate::models::*;
use klinik_core::{KlinikError, Result, VisitDocument, VisitFilter};
use uuid::Uuid;

const SELECT_VISITS: &str = r#"
    SELECT id, visit_date, patient_name, record_number, gender, fee_category,
           treatments, other_notes, created_at
    FROM visits
"#;

/// 数据库查询操作接口
pub struct VisitQueries<'a> {
    pool: &'a DatabasePool,
}

impl<'a> VisitQueries<'a> {
    pub fn new(pool: &'a DatabasePool) -> Self {
        Self { pool }
    }

    /// 创建数据库表
    pub async fn create_tables(&self) -> Result<()> {
        let pool = self.pool.pool();

        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS visits (
                id UUID PRIMARY KEY,
                visit_date DATE NOT NULL,
                patient_name VARCHAR(255) NOT NULL,
                record_number VARCHAR(64) NOT NULL,
                gender VARCHAR(32),
                fee_category VARCHAR(32),
                treatments TEXT[] NOT NULL DEFAULT '{}',
                other_notes TEXT,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
        "#).execute(pool).await.map_err(|e| KlinikError::Database(e.to_string()))?;

        let indexes = [
            "CREATE INDEX IF NOT EXISTS idx_visits_visit_date ON visits(visit_date)",
            "CREATE INDEX IF NOT EXISTS idx_visits_record_number ON visits(record_number)",
        ];

        for index_sql in indexes {
            sqlx::query(index_sql)
                .execute(pool)
                .await
                .map_err(|e| KlinikError::Database(e.to_string()))?;
        }

        tracing::info!("Database tables created successfully");
        Ok(())
    }

    /// 写入就诊记录
    pub async fn insert_visit(&self, visit: &NewDbVisit) -> Result<Uuid> {
        let pool = self.pool.pool();

        let id: (Uuid,) = sqlx::query_as(r#"
            INSERT INTO visits (id, visit_date, patient_name, record_number, gender, fee_category, treatments, other_notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
        "#)
        .bind(visit.id)
        .bind(visit.visit_date)
        .bind(&visit.patient_name)
        .bind(&visit.record_number)
        .bind(&visit.gender)
        .bind(&visit.fee_category)
        .bind(&visit.treatments)
        .bind(&visit.other_notes)
        .fetch_one(pool)
        .await
        .map_err(|e| KlinikError::Database(e.to_string()))?;

        Ok(id.0)
    }

    /// 按过滤条件查询，结果按写入顺序排列
    pub async fn find_visits(&self, filter: &VisitFilter) -> Result<Vec<VisitDocument>> {
        let pool = self.pool.pool();

        let (condition, param) = match filter {
            VisitFilter::All => ("", None),
            VisitFilter::Date(date) => ("WHERE visit_date = $1::date", Some(date.as_str())),
            VisitFilter::Month(month) => (
                "WHERE to_char(visit_date, 'YYYY-MM') = $1",
                Some(month.as_str()),
            ),
        };
        let sql = format!("{} {} ORDER BY created_at, id", SELECT_VISITS, condition);

        let mut query = sqlx::query_as::<_, DbVisit>(&sql);
        if let Some(param) = param {
            query = query.bind(param);
        }

        let rows = query
            .fetch_all(pool)
            .await
            .map_err(|e| KlinikError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(VisitDocument::from).collect())
    }

    /// 删除就诊记录，返回删除的行数
    pub async fn delete_visit(&self, id: &Uuid) -> Result<u64> {
        let pool = self.pool.pool();

        let result = sqlx::query("DELETE FROM visits WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| KlinikError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
