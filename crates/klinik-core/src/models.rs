//! 核心数据模型定义

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

use crate::error::{KlinikError, Result};
use crate::treatment::{self, TreatmentFlag};
use crate::utils::is_valid_visit_date;

/// 记录来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    DocumentStore,
    Spreadsheet,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::DocumentStore => f.write_str("document-store"),
            Origin::Spreadsheet => f.write_str("spreadsheet"),
        }
    }
}

/// 记录标识
///
/// 文档库记录使用其原生 UUID；表格记录使用 (工作表名, 行号)，
/// 行号从 1 开始计数且第 1 行为表头。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordId {
    Document(Uuid),
    SheetRow { sheet: String, row: u32 },
}

impl RecordId {
    pub fn origin(&self) -> Origin {
        match self {
            RecordId::Document(_) => Origin::DocumentStore,
            RecordId::SheetRow { .. } => Origin::Spreadsheet,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Document(id) => write!(f, "{}", id),
            RecordId::SheetRow { sheet, row } => write!(f, "{}:{}", sheet, row),
        }
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 性别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    /// 识别 `Laki-Laki` / `Laki - Laki` / `Perempuan`，其余一律为未知
    pub fn classify(raw: &str) -> Self {
        let compact: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        match compact.as_str() {
            "laki-laki" => Gender::Male,
            "perempuan" => Gender::Female,
            _ => Gender::Unknown,
        }
    }
}

/// 费用类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeCategory {
    Bpjs,
    Umum,
    Other,
}

impl FeeCategory {
    pub fn classify(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("BPJS") {
            FeeCategory::Bpjs
        } else if raw.eq_ignore_ascii_case("UMUM") {
            FeeCategory::Umum
        } else {
            FeeCategory::Other
        }
    }
}

/// 就诊记录
#[derive(Debug, Clone, PartialEq)]
pub struct VisitRecord {
    pub source_id: RecordId,
    pub visit_date: String,
    pub patient_name: String,
    pub record_number: String,
    pub gender: String,
    pub fee_category: String,
    pub treatments: BTreeSet<TreatmentFlag>,
    pub other_notes: String,
}

impl VisitRecord {
    pub fn origin(&self) -> Origin {
        self.source_id.origin()
    }

    pub fn gender_class(&self) -> Gender {
        Gender::classify(&self.gender)
    }

    pub fn fee_class(&self) -> FeeCategory {
        FeeCategory::classify(&self.fee_category)
    }

    /// 由治疗项目派生的汇总文本
    pub fn treatment_summary(&self) -> String {
        treatment::summarize(&self.treatments)
    }

    /// 去重用的复合键 (就诊日期, 病历号)
    pub fn composite_key(&self) -> (&str, &str) {
        (self.visit_date.trim(), self.record_number.trim())
    }
}

/// 对外输出的 JSON 视图
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VisitRecordView<'a> {
    id: &'a RecordId,
    origin_tag: Origin,
    visit_date: &'a str,
    patient_name: &'a str,
    record_number: &'a str,
    gender: &'a str,
    fee_category: &'a str,
    treatments: &'a BTreeSet<TreatmentFlag>,
    treatment_summary: String,
    other_notes: &'a str,
}

impl Serialize for VisitRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        VisitRecordView {
            id: &self.source_id,
            origin_tag: self.origin(),
            visit_date: &self.visit_date,
            patient_name: &self.patient_name,
            record_number: &self.record_number,
            gender: &self.gender,
            fee_category: &self.fee_category,
            treatments: &self.treatments,
            treatment_summary: self.treatment_summary(),
            other_notes: &self.other_notes,
        }
        .serialize(serializer)
    }
}

/// 文档库返回的原始记录
#[derive(Debug, Clone, PartialEq)]
pub struct VisitDocument {
    pub id: Uuid,
    pub visit_date: String,
    pub patient_name: String,
    pub record_number: String,
    pub gender: String,
    pub fee_category: String,
    pub treatments: Vec<String>,
    pub other_notes: String,
}

/// 治疗项目输入：列表或以逗号拼接的字符串
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreatmentInput {
    List(Vec<String>),
    Joined(String),
}

impl Default for TreatmentInput {
    fn default() -> Self {
        TreatmentInput::List(Vec::new())
    }
}

impl TreatmentInput {
    pub fn names(&self) -> Vec<String> {
        match self {
            TreatmentInput::List(names) => names.clone(),
            TreatmentInput::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        }
    }
}

/// 新建就诊记录请求
///
/// 同时接受规范字段名和表格原始列名。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVisit {
    #[serde(default, alias = "Tanggal Kunjungan", alias = "tanggal")]
    pub visit_date: String,
    #[serde(default, alias = "Nama Pasien")]
    pub patient_name: String,
    #[serde(default, alias = "No.RM")]
    pub record_number: String,
    #[serde(default, alias = "Kelamin")]
    pub gender: String,
    #[serde(default, alias = "Biaya")]
    pub fee_category: String,
    #[serde(default, alias = "Tindakan")]
    pub treatments: TreatmentInput,
    #[serde(default, alias = "Lainnya")]
    pub other_notes: String,
}

impl NewVisit {
    /// 校验必填字段并解析治疗项目
    pub fn validate(&self) -> Result<BTreeSet<TreatmentFlag>> {
        let mut missing = Vec::new();
        if self.visit_date.trim().is_empty() {
            missing.push("visitDate");
        }
        if self.patient_name.trim().is_empty() {
            missing.push("patientName");
        }
        if self.record_number.trim().is_empty() {
            missing.push("recordNumber");
        }
        if !missing.is_empty() {
            return Err(KlinikError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        if !is_valid_visit_date(self.visit_date.trim()) {
            return Err(KlinikError::Validation(format!(
                "invalid visit date: {}",
                self.visit_date
            )));
        }

        let (flags, unknown) = treatment::parse_names(self.treatments.names());
        if !unknown.is_empty() {
            return Err(KlinikError::Validation(format!(
                "unknown treatments: {}",
                unknown.join(", ")
            )));
        }

        Ok(flags)
    }
}

/// 表格中一个工作表的原始内容
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetValues {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetValues {
    /// 第一行视为表头
    pub fn from_grid(mut grid: Vec<Vec<String>>) -> Self {
        if grid.is_empty() {
            return Self::default();
        }
        let header = grid.remove(0);
        Self { header, rows: grid }
    }

    /// 最后一个数据行的行号（无数据时为表头行号 1）
    pub fn last_row_number(&self) -> u32 {
        self.rows.len() as u32 + 1
    }
}
