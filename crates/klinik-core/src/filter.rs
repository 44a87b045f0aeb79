//! 就诊日期过滤

use crate::error::{KlinikError, Result};
use crate::models::VisitRecord;
use crate::utils::{is_valid_month, is_valid_visit_date};

/// 就诊日期过滤条件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VisitFilter {
    #[default]
    All,
    /// 精确匹配 `YYYY-MM-DD`
    Date(String),
    /// 匹配 `YYYY-MM` 前缀
    Month(String),
}

impl VisitFilter {
    /// 由查询参数构造，同时给出时以精确日期为准
    pub fn from_params(date: Option<&str>, month: Option<&str>) -> Result<Self> {
        let date = date.map(str::trim).filter(|d| !d.is_empty());
        let month = month.map(str::trim).filter(|m| !m.is_empty());

        if let Some(date) = date {
            if !is_valid_visit_date(date) {
                return Err(KlinikError::Validation(format!("invalid date: {}", date)));
            }
            return Ok(VisitFilter::Date(date.to_string()));
        }

        if let Some(month) = month {
            if !is_valid_month(month) {
                return Err(KlinikError::Validation(format!("invalid month: {}", month)));
            }
            return Ok(VisitFilter::Month(month.to_string()));
        }

        Ok(VisitFilter::All)
    }

    pub fn matches(&self, record: &VisitRecord) -> bool {
        match self {
            VisitFilter::All => true,
            VisitFilter::Date(date) => record.visit_date == *date,
            VisitFilter::Month(month) => record.visit_date.starts_with(month.as_str()),
        }
    }

    pub fn apply(&self, records: Vec<VisitRecord>) -> Vec<VisitRecord> {
        if *self == VisitFilter::All {
            return records;
        }
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordId;
    use uuid::Uuid;

    fn record(date: &str) -> VisitRecord {
        VisitRecord {
            source_id: RecordId::Document(Uuid::new_v4()),
            visit_date: date.to_string(),
            patient_name: "Ani".to_string(),
            record_number: "RM1".to_string(),
            gender: String::new(),
            fee_category: String::new(),
            treatments: Default::default(),
            other_notes: String::new(),
        }
    }

    fn dates(records: &[VisitRecord]) -> Vec<&str> {
        records.iter().map(|r| r.visit_date.as_str()).collect()
    }

    #[test]
    fn test_from_params() {
        assert_eq!(VisitFilter::from_params(None, None).unwrap(), VisitFilter::All);
        assert_eq!(VisitFilter::from_params(Some(""), Some(" ")).unwrap(), VisitFilter::All);
        assert_eq!(
            VisitFilter::from_params(Some("2025-03-10"), Some("2025-04")).unwrap(),
            VisitFilter::Date("2025-03-10".to_string())
        );
        assert_eq!(
            VisitFilter::from_params(None, Some("2025-04")).unwrap(),
            VisitFilter::Month("2025-04".to_string())
        );
        assert!(VisitFilter::from_params(Some("2025-3-1"), None).is_err());
        assert!(VisitFilter::from_params(None, Some("2025-13")).is_err());
    }

    #[test]
    fn test_month_filter() {
        let records = vec![record("2025-03-10"), record("2025-04-01")];
        let filtered = VisitFilter::Month("2025-03".to_string()).apply(records);
        assert_eq!(dates(&filtered), vec!["2025-03-10"]);
    }

    #[test]
    fn test_date_filter() {
        let records = vec![record("2025-03-10"), record("2025-03-11"), record("2025-03-10")];
        let filtered = VisitFilter::Date("2025-03-10".to_string()).apply(records);
        assert_eq!(dates(&filtered), vec!["2025-03-10", "2025-03-10"]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let records = vec![record("2025-03-10"), record("2025-04-01"), record("2025-03-31")];
        let filter = VisitFilter::Month("2025-03".to_string());

        let once = filter.apply(records);
        let twice = filter.apply(once.clone());
        assert_eq!(once, twice);
        assert_eq!(VisitFilter::All.apply(twice.clone()), twice);
    }
}
