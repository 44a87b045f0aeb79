//! 复合键去重

use std::collections::HashSet;
use tracing::debug;

use crate::models::VisitRecord;

/// 按 (就诊日期, 病历号) 去重
///
/// 保留第一次出现的记录，顺序不变；重复记录整体丢弃，不做字段合并。
pub fn deduplicate(records: Vec<VisitRecord>) -> Vec<VisitRecord> {
    let total = records.len();
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(total);

    let unique: Vec<VisitRecord> = records
        .into_iter()
        .filter(|record| {
            let (date, number) = record.composite_key();
            seen.insert((date.to_string(), number.to_string()))
        })
        .collect();

    if unique.len() < total {
        debug!("Dropped {} duplicate visit records", total - unique.len());
    }
    unique
}
