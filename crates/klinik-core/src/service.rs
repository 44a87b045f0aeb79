//! 就诊记录合并服务
//!
//! 读取流程：两个数据源并发读取，各自规范化后按文档库在前、表格在后的
//! 顺序拼接，再依次过滤、去重。单个数据源（或单个工作表）读取失败只记录
//! 告警，其余数据照常返回；所有数据源都失败时才整体报错。

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::dedup::deduplicate;
use crate::error::{KlinikError, Result};
use crate::filter::VisitFilter;
use crate::models::{NewVisit, Origin, RecordId, TreatmentInput, VisitRecord};
use crate::normalize::Normalizer;
use crate::router::route_delete;
use crate::source::{DocumentStore, SpreadsheetSource};
use crate::summary::VisitSummary;

/// 一次读取的结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchOutcome {
    #[serde(rename = "data")]
    pub records: Vec<VisitRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// 单个数据源的读取结果
struct SourceRead {
    records: Vec<VisitRecord>,
    warnings: Vec<String>,
    failed: bool,
}

/// 就诊记录服务
#[derive(Clone)]
pub struct VisitService {
    documents: Arc<dyn DocumentStore>,
    spreadsheet: Option<Arc<dyn SpreadsheetSource>>,
    normalizer: Normalizer,
}

impl VisitService {
    pub fn new(documents: Arc<dyn DocumentStore>, normalizer: Normalizer) -> Self {
        Self {
            documents,
            spreadsheet: None,
            normalizer,
        }
    }

    /// 挂接表格数据源
    pub fn with_spreadsheet(mut self, spreadsheet: Arc<dyn SpreadsheetSource>) -> Self {
        self.spreadsheet = Some(spreadsheet);
        self
    }

    pub fn has_spreadsheet(&self) -> bool {
        self.spreadsheet.is_some()
    }

    /// 读取、过滤并去重
    pub async fn fetch(&self, filter: &VisitFilter) -> Result<FetchOutcome> {
        let (documents, spreadsheet) =
            tokio::join!(self.read_documents(filter), self.read_spreadsheet());

        let all_failed = documents.failed && spreadsheet.as_ref().map_or(true, |s| s.failed);
        if all_failed {
            let mut reasons = documents.warnings;
            if let Some(sheet) = spreadsheet {
                reasons.extend(sheet.warnings);
            }
            return Err(KlinikError::Upstream(reasons.join("; ")));
        }

        let mut records = documents.records;
        let mut warnings = documents.warnings;
        if let Some(sheet) = spreadsheet {
            records.extend(sheet.records);
            warnings.extend(sheet.warnings);
        }

        let records = deduplicate(filter.apply(records));
        info!(
            "Fetched {} visit records ({} warnings) for {:?}",
            records.len(),
            warnings.len(),
            filter
        );

        Ok(FetchOutcome { records, warnings })
    }

    /// 在读取结果上计算统计
    pub async fn summary(&self, filter: &VisitFilter) -> Result<(VisitSummary, Vec<String>)> {
        let outcome = self.fetch(filter).await?;
        Ok((VisitSummary::from_records(&outcome.records), outcome.warnings))
    }

    /// 写入文档库
    pub async fn create(&self, visit: NewVisit) -> Result<VisitRecord> {
        let flags = visit.validate()?;
        let canonical = NewVisit {
            visit_date: visit.visit_date.trim().to_string(),
            patient_name: visit.patient_name.trim().to_string(),
            record_number: visit.record_number.trim().to_string(),
            gender: visit.gender.trim().to_string(),
            fee_category: visit.fee_category.trim().to_string(),
            treatments: TreatmentInput::List(
                flags.iter().map(|f| f.column_name().to_string()).collect(),
            ),
            other_notes: visit.other_notes.trim().to_string(),
        };

        let stored = self.documents.insert_visit(&canonical).await?;
        let id = stored.id;
        let record = self.normalizer.normalize_document(stored).ok_or_else(|| {
            KlinikError::Internal(format!("stored visit {} failed normalization", id))
        })?;

        info!("Created visit record {}", record.source_id);
        Ok(record)
    }

    /// 解析标识并删除对应记录
    pub async fn delete(&self, raw_id: &str) -> Result<RecordId> {
        let id: RecordId = raw_id.parse()?;
        debug!("Routing delete for {} to {}", id, id.origin());

        route_delete(&id, self.documents.as_ref(), self.spreadsheet.as_deref()).await?;
        Ok(id)
    }

    async fn read_documents(&self, filter: &VisitFilter) -> SourceRead {
        match self.documents.find_visits(filter).await {
            Ok(docs) => {
                let fetched = docs.len();
                let records: Vec<VisitRecord> = docs
                    .into_iter()
                    .filter_map(|doc| self.normalizer.normalize_document(doc))
                    .collect();
                debug!(
                    "Document store: {} of {} documents accepted",
                    records.len(),
                    fetched
                );
                SourceRead {
                    records,
                    warnings: Vec::new(),
                    failed: false,
                }
            }
            Err(e) => {
                warn!("Failed to read {}: {}", Origin::DocumentStore, e);
                SourceRead {
                    records: Vec::new(),
                    warnings: vec![format!("{}: {}", Origin::DocumentStore, e)],
                    failed: true,
                }
            }
        }
    }

    async fn read_spreadsheet(&self) -> Option<SourceRead> {
        let source = self.spreadsheet.as_ref()?;
        let sheets = source.sheet_names();

        let mut read = SourceRead {
            records: Vec::new(),
            warnings: Vec::new(),
            failed: false,
        };
        let mut failures = 0;

        for sheet in &sheets {
            match source.read_sheet(sheet).await {
                Ok(values) => {
                    read.records
                        .extend(self.normalizer.normalize_sheet(sheet, &values));
                }
                Err(e) => {
                    warn!("Failed to read sheet {}: {}", sheet, e);
                    read.warnings
                        .push(format!("{} {}: {}", Origin::Spreadsheet, sheet, e));
                    failures += 1;
                }
            }
        }

        read.failed = !sheets.is_empty() && failures == sheets.len();
        Some(read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SheetValues, VisitDocument};
    use crate::normalize::ValidationRules;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct FakeDocuments {
        docs: Mutex<Vec<VisitDocument>>,
        broken: bool,
    }

    #[async_trait]
    impl DocumentStore for FakeDocuments {
        async fn find_visits(&self, _filter: &VisitFilter) -> Result<Vec<VisitDocument>> {
            if self.broken {
                return Err(KlinikError::Database("connection refused".to_string()));
            }
            Ok(self.docs.lock().await.clone())
        }

        async fn insert_visit(&self, visit: &NewVisit) -> Result<VisitDocument> {
            let doc = VisitDocument {
                id: Uuid::new_v4(),
                visit_date: visit.visit_date.clone(),
                patient_name: visit.patient_name.clone(),
                record_number: visit.record_number.clone(),
                gender: visit.gender.clone(),
                fee_category: visit.fee_category.clone(),
                treatments: visit.treatments.names(),
                other_notes: visit.other_notes.clone(),
            };
            self.docs.lock().await.push(doc.clone());
            Ok(doc)
        }

        async fn delete_visit(&self, id: Uuid) -> Result<bool> {
            let mut docs = self.docs.lock().await;
            let before = docs.len();
            docs.retain(|d| d.id != id);
            Ok(docs.len() < before)
        }
    }

    #[derive(Default)]
    struct FakeSheets {
        order: Vec<String>,
        sheets: Mutex<HashMap<String, SheetValues>>,
        deleted: Mutex<Vec<(String, u32)>>,
    }

    impl FakeSheets {
        fn with_sheet(mut self, name: &str, rows: Vec<Vec<&str>>) -> Self {
            let header = ["Tanggal Kunjungan", "Nama Pasien", "No.RM", "Kelamin", "Biaya", "Obat"]
                .iter()
                .map(|s| s.to_string())
                .collect();
            let rows = rows
                .into_iter()
                .map(|r| r.into_iter().map(str::to_string).collect())
                .collect();
            self.order.push(name.to_string());
            self.sheets
                .get_mut()
                .insert(name.to_string(), SheetValues { header, rows });
            self
        }

        fn with_missing_sheet(mut self, name: &str) -> Self {
            self.order.push(name.to_string());
            self
        }
    }

    #[async_trait]
    impl SpreadsheetSource for FakeSheets {
        fn sheet_names(&self) -> Vec<String> {
            self.order.clone()
        }

        async fn read_sheet(&self, sheet: &str) -> Result<SheetValues> {
            self.sheets
                .lock()
                .await
                .get(sheet)
                .cloned()
                .ok_or_else(|| KlinikError::Spreadsheet(format!("unable to parse range: {}", sheet)))
        }

        async fn delete_row(&self, sheet: &str, row: u32) -> Result<bool> {
            let sheets = self.sheets.lock().await;
            let exists = sheets
                .get(sheet)
                .map_or(false, |values| row >= 2 && row <= values.last_row_number());
            if exists {
                self.deleted.lock().await.push((sheet.to_string(), row));
            }
            Ok(exists)
        }
    }

    fn doc(date: &str, number: &str, name: &str) -> VisitDocument {
        VisitDocument {
            id: Uuid::new_v4(),
            visit_date: date.to_string(),
            patient_name: name.to_string(),
            record_number: number.to_string(),
            gender: "Perempuan".to_string(),
            fee_category: "BPJS".to_string(),
            treatments: Vec::new(),
            other_notes: String::new(),
        }
    }

    fn documents(docs: Vec<VisitDocument>) -> Arc<FakeDocuments> {
        Arc::new(FakeDocuments {
            docs: Mutex::new(docs),
            broken: false,
        })
    }

    fn names(outcome: &FetchOutcome) -> Vec<&str> {
        outcome.records.iter().map(|r| r.patient_name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_fetch_merges_and_deduplicates() {
        let sheets = FakeSheets::default().with_sheet(
            "Maret",
            vec![
                vec!["2025-03-10", "Ani (sheet)", "RM1", "Perempuan", "BPJS", "Yes"],
                vec!["2025-03-12", "Budi", "RM2", "Laki-Laki", "UMUM"],
                vec!["2025-03-00", "Rusak", "RM3"],
            ],
        );
        let service = VisitService::new(
            documents(vec![doc("2025-03-10", "RM1", "Ani (db)")]),
            Normalizer::default(),
        )
        .with_spreadsheet(Arc::new(sheets));

        let outcome = service.fetch(&VisitFilter::All).await.unwrap();
        assert_eq!(names(&outcome), vec!["Ani (db)", "Budi"]);
        assert_eq!(outcome.records[1].source_id.to_string(), "Maret:3");
        assert!(outcome.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_applies_month_filter() {
        let sheets = FakeSheets::default().with_sheet(
            "Data",
            vec![
                vec!["2025-03-10", "Ani", "RM1"],
                vec!["2025-04-01", "Budi", "RM2"],
            ],
        );
        let service = VisitService::new(documents(Vec::new()), Normalizer::default())
            .with_spreadsheet(Arc::new(sheets));

        let outcome = service
            .fetch(&VisitFilter::Month("2025-03".to_string()))
            .await
            .unwrap();
        assert_eq!(names(&outcome), vec!["Ani"]);
    }

    #[tokio::test]
    async fn test_fetch_degrades_when_one_source_fails() {
        let broken = Arc::new(FakeDocuments {
            docs: Mutex::new(Vec::new()),
            broken: true,
        });
        let sheets = FakeSheets::default()
            .with_missing_sheet("Hilang")
            .with_sheet("Maret", vec![vec!["2025-03-10", "Ani", "RM1"]]);
        let service =
            VisitService::new(broken, Normalizer::default()).with_spreadsheet(Arc::new(sheets));

        let outcome = service.fetch(&VisitFilter::All).await.unwrap();
        assert_eq!(names(&outcome), vec!["Ani"]);
        assert_eq!(outcome.warnings.len(), 2);
        assert!(outcome.warnings[0].starts_with("document-store"));
        assert!(outcome.warnings[1].contains("Hilang"));
    }

    #[tokio::test]
    async fn test_fetch_fails_when_all_sources_fail() {
        let broken = Arc::new(FakeDocuments {
            docs: Mutex::new(Vec::new()),
            broken: true,
        });
        let service = VisitService::new(broken.clone(), Normalizer::default());
        assert!(matches!(
            service.fetch(&VisitFilter::All).await,
            Err(KlinikError::Upstream(_))
        ));

        let sheets = FakeSheets::default().with_missing_sheet("Hilang");
        let service =
            VisitService::new(broken, Normalizer::default()).with_spreadsheet(Arc::new(sheets));
        assert!(matches!(
            service.fetch(&VisitFilter::All).await,
            Err(KlinikError::Upstream(_))
        ));
    }

    #[tokio::test]
    async fn test_strict_rules_drop_nameless_documents() {
        let service = VisitService::new(
            documents(vec![doc("2025-03-10", "RM1", ""), doc("2025-03-10", "RM2", "Budi")]),
            Normalizer::new(ValidationRules {
                require_patient_name: true,
            }),
        );
        let outcome = service.fetch(&VisitFilter::All).await.unwrap();
        assert_eq!(names(&outcome), vec!["Budi"]);
    }

    #[tokio::test]
    async fn test_create_stores_canonical_treatments() {
        let store = documents(Vec::new());
        let service = VisitService::new(store.clone(), Normalizer::default());

        let record = service
            .create(NewVisit {
                visit_date: " 2025-03-10 ".to_string(),
                patient_name: "Ani".to_string(),
                record_number: "RM1".to_string(),
                treatments: TreatmentInput::Joined("rujuk, obat".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(record.origin(), Origin::DocumentStore);
        assert_eq!(record.visit_date, "2025-03-10");
        assert_eq!(record.treatment_summary(), "Obat, Rujuk");

        let stored = store.docs.lock().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].treatments, vec!["Obat".to_string(), "Rujuk".to_string()]);
    }

    #[tokio::test]
    async fn test_create_rejects_incomplete_visit() {
        let store = documents(Vec::new());
        let service = VisitService::new(store.clone(), Normalizer::default());

        let result = service
            .create(NewVisit {
                visit_date: "2025-03-10".to_string(),
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(KlinikError::Validation(_))));
        assert!(store.docs.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_routes_by_origin() {
        let existing = doc("2025-03-10", "RM1", "Ani");
        let id = existing.id;
        let store = documents(vec![existing]);
        let sheets = Arc::new(
            FakeSheets::default().with_sheet("Maret", vec![vec!["2025-03-10", "Budi", "RM2"]]),
        );
        let service = VisitService::new(store.clone(), Normalizer::default())
            .with_spreadsheet(sheets.clone());

        let deleted = service.delete(&id.to_string()).await.unwrap();
        assert_eq!(deleted, RecordId::Document(id));
        assert!(store.docs.lock().await.is_empty());
        assert!(sheets.deleted.lock().await.is_empty());

        service.delete("Maret:2").await.unwrap();
        assert_eq!(*sheets.deleted.lock().await, vec![("Maret".to_string(), 2)]);
    }

    #[tokio::test]
    async fn test_fetched_sheet_id_deletes_its_row() {
        let sheets = Arc::new(
            FakeSheets::default().with_sheet("Maret ", vec![vec!["2025-03-10", "Budi", "RM2"]]),
        );
        let service = VisitService::new(documents(Vec::new()), Normalizer::default())
            .with_spreadsheet(sheets.clone());

        let outcome = service.fetch(&VisitFilter::All).await.unwrap();
        let id = outcome.records[0].source_id.to_string();
        assert_eq!(id, "Maret :2");

        service.delete(&id).await.unwrap();
        assert_eq!(*sheets.deleted.lock().await, vec![("Maret ".to_string(), 2)]);
    }

    #[tokio::test]
    async fn test_delete_errors() {
        let sheets = Arc::new(
            FakeSheets::default().with_sheet("Maret", vec![vec!["2025-03-10", "Budi", "RM2"]]),
        );
        let service = VisitService::new(documents(Vec::new()), Normalizer::default())
            .with_spreadsheet(sheets);

        assert!(matches!(service.delete("").await, Err(KlinikError::Validation(_))));
        assert!(matches!(
            service.delete(&Uuid::new_v4().to_string()).await,
            Err(KlinikError::NotFound(_))
        ));
        assert!(matches!(service.delete("Maret:9").await, Err(KlinikError::NotFound(_))));
        assert!(matches!(service.delete("April:2").await, Err(KlinikError::NotFound(_))));

        let without_sheets = VisitService::new(documents(Vec::new()), Normalizer::default());
        assert!(matches!(
            without_sheets.delete("Maret:2").await,
            Err(KlinikError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_summary_uses_deduplicated_records() {
        let service = VisitService::new(
            documents(vec![
                doc("2025-03-10", "RM1", "Ani"),
                doc("2025-03-10", "RM1", "Ani"),
                doc("2025-03-11", "RM2", "Citra"),
            ]),
            Normalizer::default(),
        );

        let (summary, warnings) = service.summary(&VisitFilter::All).await.unwrap();
        assert!(warnings.is_empty());
        assert_eq!(summary.total_visits, 2);
        assert_eq!(summary.monthly_fees["2025-03"].bpjs, 2);
    }
}
