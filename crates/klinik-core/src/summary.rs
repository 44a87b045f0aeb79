//! 仪表盘统计
//!
//! 为图表提供按日、按月的性别人数，按月的费用类别人数以及治疗项目总数。

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{FeeCategory, Gender, VisitRecord};
use crate::treatment::TreatmentFlag;
use crate::utils::month_key;

/// 性别人数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenderCounts {
    pub male: u32,
    pub female: u32,
}

impl GenderCounts {
    fn add(&mut self, gender: Gender) {
        match gender {
            Gender::Male => self.male += 1,
            Gender::Female => self.female += 1,
            Gender::Unknown => {}
        }
    }
}

/// 费用类别人数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeeCounts {
    pub bpjs: u32,
    pub umum: u32,
}

impl FeeCounts {
    fn add(&mut self, fee: FeeCategory) {
        match fee {
            FeeCategory::Bpjs => self.bpjs += 1,
            FeeCategory::Umum => self.umum += 1,
            FeeCategory::Other => {}
        }
    }
}

/// 单个治疗项目的次数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreatmentCount {
    pub treatment: TreatmentFlag,
    pub count: u32,
}

/// 统计结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitSummary {
    pub total_visits: usize,
    pub daily_patients: BTreeMap<String, GenderCounts>,
    pub monthly_patients: BTreeMap<String, GenderCounts>,
    pub monthly_fees: BTreeMap<String, FeeCounts>,
    pub treatments: Vec<TreatmentCount>,
}

impl VisitSummary {
    pub fn from_records(records: &[VisitRecord]) -> Self {
        let mut summary = VisitSummary {
            total_visits: records.len(),
            ..Default::default()
        };
        let mut treatment_totals: BTreeMap<TreatmentFlag, u32> = BTreeMap::new();

        for record in records {
            let gender = record.gender_class();
            let month = month_key(&record.visit_date).to_string();

            summary
                .daily_patients
                .entry(record.visit_date.clone())
                .or_default()
                .add(gender);
            summary
                .monthly_patients
                .entry(month.clone())
                .or_default()
                .add(gender);
            summary
                .monthly_fees
                .entry(month)
                .or_default()
                .add(record.fee_class());

            for flag in &record.treatments {
                *treatment_totals.entry(*flag).or_insert(0) += 1;
            }
        }

        summary.treatments = treatment_totals
            .into_iter()
            .map(|(treatment, count)| TreatmentCount { treatment, count })
            .collect();
        summary
    }
}
