//! 数据库模型

use chrono::{DateTime, NaiveDate, Utc};
use klinik_core::utils::{format_visit_date, VISIT_DATE_FORMAT};
use klinik_core::{KlinikError, NewVisit, Result, VisitDocument};
use sqlx::FromRow;
use uuid::Uuid;

/// 数据库就诊表
#[derive(Debug, Clone, FromRow)]
pub struct DbVisit {
    pub id: Uuid,
    pub visit_date: NaiveDate,
    pub patient_name: String,
    pub record_number: String,
    pub gender: Option<String>,
    pub fee_category: Option<String>,
    pub treatments: Vec<String>, // TEXT[]，存储规范化的项目名称
    pub other_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<DbVisit> for VisitDocument {
    fn from(db_visit: DbVisit) -> Self {
        VisitDocument {
            id: db_visit.id,
            visit_date: format_visit_date(db_visit.visit_date),
            patient_name: db_visit.patient_name,
            record_number: db_visit.record_number,
            gender: db_visit.gender.unwrap_or_default(),
            fee_category: db_visit.fee_category.unwrap_or_default(),
            treatments: db_visit.treatments,
            other_notes: db_visit.other_notes.unwrap_or_default(),
        }
    }
}

/// 新就诊记录插入模型
#[derive(Debug, Clone)]
pub struct NewDbVisit {
    pub id: Uuid,
    pub visit_date: NaiveDate,
    pub patient_name: String,
    pub record_number: String,
    pub gender: Option<String>,
    pub fee_category: Option<String>,
    pub treatments: Vec<String>,
    pub other_notes: Option<String>,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl NewDbVisit {
    pub fn from_visit(visit: &NewVisit) -> Result<Self> {
        let visit_date = NaiveDate::parse_from_str(visit.visit_date.trim(), VISIT_DATE_FORMAT)
            .map_err(|e| {
                KlinikError::Validation(format!("invalid visit date {}: {}", visit.visit_date, e))
            })?;

        Ok(Self {
            id: Uuid::new_v4(),
            visit_date,
            patient_name: visit.patient_name.trim().to_string(),
            record_number: visit.record_number.trim().to_string(),
            gender: non_empty(&visit.gender),
            fee_category: non_empty(&visit.fee_category),
            treatments: visit.treatments.names(),
            other_notes: non_empty(&visit.other_notes),
        })
    }

    /// 插入成功后对应的文档
    pub fn to_document(&self) -> VisitDocument {
        VisitDocument {
            id: self.id,
            visit_date: format_visit_date(self.visit_date),
            patient_name: self.patient_name.clone(),
            record_number: self.record_number.clone(),
            gender: self.gender.clone().unwrap_or_default(),
            fee_category: self.fee_category.clone().unwrap_or_default(),
            treatments: self.treatments.clone(),
            other_notes: self.other_notes.clone().unwrap_or_default(),
        }
    }
}
