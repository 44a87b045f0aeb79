//! 记录规范化
//!
//! 每个数据源在进入合并流程之前都要经过各自的规范化入口：
//! 表格行按表头映射为字段，文档库记录直接整理。两者共享同一套
//! 日期与姓名校验规则，不合格的记录直接丢弃。

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::models::{RecordId, SheetValues, VisitDocument, VisitRecord};
use crate::treatment::{self, TreatmentFlag};
use crate::utils::is_valid_visit_date;

pub const COL_VISIT_DATE: &str = "Tanggal Kunjungan";
pub const COL_PATIENT_NAME: &str = "Nama Pasien";
pub const COL_RECORD_NUMBER: &str = "No.RM";
pub const COL_GENDER: &str = "Kelamin";
pub const COL_FEE_CATEGORY: &str = "Biaya";
pub const COL_OTHER_NOTES: &str = "Lainnya";

/// 标准表格的列数
pub const EXPECTED_COLUMNS: usize = 13;

/// 表格首个数据行相对数据行下标的偏移（行号从 1 开始且有表头行）
pub const SHEET_ROW_OFFSET: usize = 2;

/// 可配置的校验规则
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRules {
    /// 患者姓名为空时丢弃记录
    #[serde(default)]
    pub require_patient_name: bool,
}

/// 表头到列下标的映射
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    visit_date: Option<usize>,
    patient_name: Option<usize>,
    record_number: Option<usize>,
    gender: Option<usize>,
    fee_category: Option<usize>,
    other_notes: Option<usize>,
    flags: Vec<(TreatmentFlag, usize)>,
    width: usize,
}

impl ColumnMap {
    pub fn from_header(header: &[String]) -> Self {
        let mut map = ColumnMap {
            width: header.len().max(EXPECTED_COLUMNS),
            ..Default::default()
        };

        for (index, cell) in header.iter().enumerate() {
            let name = cell.trim();
            let slot = match name {
                COL_VISIT_DATE => &mut map.visit_date,
                COL_PATIENT_NAME => &mut map.patient_name,
                COL_RECORD_NUMBER => &mut map.record_number,
                COL_GENDER => &mut map.gender,
                COL_FEE_CATEGORY => &mut map.fee_category,
                COL_OTHER_NOTES => &mut map.other_notes,
                _ => {
                    if let Some(flag) = TreatmentFlag::from_name(name) {
                        if !map.flags.iter().any(|(f, _)| *f == flag) {
                            map.flags.push((flag, index));
                        }
                    }
                    continue;
                }
            };
            // 重复的列名以第一次出现为准
            if slot.is_none() {
                *slot = Some(index);
            }
        }

        map
    }

    /// 访问前需要补齐到的列数
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn has_visit_date(&self) -> bool {
        self.visit_date.is_some()
    }
}

/// 补齐缺失的尾部列
fn pad_row(row: &[String], width: usize) -> Vec<&str> {
    let mut cells: Vec<&str> = row.iter().map(String::as_str).collect();
    if cells.len() < width {
        cells.resize(width, "");
    }
    cells
}

fn cell<'a>(cells: &[&'a str], index: Option<usize>) -> &'a str {
    index
        .and_then(|i| cells.get(i).copied())
        .unwrap_or("")
        .trim()
}

/// 记录规范化器
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    rules: ValidationRules,
}

impl Normalizer {
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }

    fn accepts(&self, visit_date: &str, patient_name: &str) -> bool {
        if visit_date.is_empty() || visit_date == "-" || !is_valid_visit_date(visit_date) {
            return false;
        }
        !(self.rules.require_patient_name && patient_name.is_empty())
    }

    /// 规范化一个表格数据行
    ///
    /// `row_index` 是该行在数据行中的下标（不含表头），不合格时返回 `None`。
    pub fn normalize_row(
        &self,
        sheet: &str,
        row_index: usize,
        columns: &ColumnMap,
        row: &[String],
    ) -> Option<VisitRecord> {
        let cells = pad_row(row, columns.width());

        let visit_date = cell(&cells, columns.visit_date);
        let patient_name = cell(&cells, columns.patient_name);
        if !self.accepts(visit_date, patient_name) {
            return None;
        }

        let treatments: BTreeSet<TreatmentFlag> = columns
            .flags
            .iter()
            .filter(|(_, index)| treatment::is_flag_value_set(cells[*index]))
            .map(|(flag, _)| *flag)
            .collect();

        let row = u32::try_from(row_index + SHEET_ROW_OFFSET).ok()?;

        Some(VisitRecord {
            source_id: RecordId::SheetRow {
                sheet: sheet.to_string(),
                row,
            },
            visit_date: visit_date.to_string(),
            patient_name: patient_name.to_string(),
            record_number: cell(&cells, columns.record_number).to_string(),
            gender: cell(&cells, columns.gender).to_string(),
            fee_category: cell(&cells, columns.fee_category).to_string(),
            treatments,
            other_notes: cell(&cells, columns.other_notes).to_string(),
        })
    }

    /// 规范化整个工作表，保持原有行顺序
    pub fn normalize_sheet(&self, sheet: &str, values: &SheetValues) -> Vec<VisitRecord> {
        let columns = ColumnMap::from_header(&values.header);
        if !columns.has_visit_date() {
            debug!("Sheet {} has no '{}' column", sheet, COL_VISIT_DATE);
            return Vec::new();
        }

        let records: Vec<VisitRecord> = values
            .rows
            .iter()
            .enumerate()
            .filter_map(|(index, row)| self.normalize_row(sheet, index, &columns, row))
            .collect();

        debug!(
            "Sheet {}: {} of {} rows accepted",
            sheet,
            records.len(),
            values.rows.len()
        );
        records
    }

    /// 规范化一条文档库记录
    pub fn normalize_document(&self, doc: VisitDocument) -> Option<VisitRecord> {
        let visit_date = doc.visit_date.trim();
        let patient_name = doc.patient_name.trim();
        if !self.accepts(visit_date, patient_name) {
            debug!("Dropping document {} with visit date {:?}", doc.id, doc.visit_date);
            return None;
        }

        let (treatments, unknown) = treatment::parse_names(&doc.treatments);
        if !unknown.is_empty() {
            debug!("Document {} has unknown treatments: {:?}", doc.id, unknown);
        }

        Some(VisitRecord {
            source_id: RecordId::Document(doc.id),
            visit_date: visit_date.to_string(),
            patient_name: patient_name.to_string(),
            record_number: doc.record_number.trim().to_string(),
            gender: doc.gender.trim().to_string(),
            fee_category: doc.fee_category.trim().to_string(),
            treatments,
            other_notes: doc.other_notes.trim().to_string(),
        })
    }
}
