//! 治疗项目标记
//!
//! 表格中每个治疗项目占一列，列值非空且不为 `no` 即视为已执行。
//! 汇总字段始终按固定顺序由已执行的项目拼接得出。

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// 治疗项目，声明顺序即为汇总时的固定顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TreatmentFlag {
    #[serde(rename = "Obat")]
    Obat,
    #[serde(rename = "Cabut Anak")]
    CabutAnak,
    #[serde(rename = "Cabut Dewasa")]
    CabutDewasa,
    #[serde(rename = "Tambal Sementara")]
    TambalSementara,
    #[serde(rename = "Tambal Tetap")]
    TambalTetap,
    #[serde(rename = "Scaling")]
    Scaling,
    #[serde(rename = "Rujuk")]
    Rujuk,
}

impl TreatmentFlag {
    /// 全部治疗项目（固定顺序）
    pub const ALL: [TreatmentFlag; 7] = [
        TreatmentFlag::Obat,
        TreatmentFlag::CabutAnak,
        TreatmentFlag::CabutDewasa,
        TreatmentFlag::TambalSementara,
        TreatmentFlag::TambalTetap,
        TreatmentFlag::Scaling,
        TreatmentFlag::Rujuk,
    ];

    /// 表格中的列名
    pub fn column_name(&self) -> &'static str {
        match self {
            TreatmentFlag::Obat => "Obat",
            TreatmentFlag::CabutAnak => "Cabut Anak",
            TreatmentFlag::CabutDewasa => "Cabut Dewasa",
            TreatmentFlag::TambalSementara => "Tambal Sementara",
            TreatmentFlag::TambalTetap => "Tambal Tetap",
            TreatmentFlag::Scaling => "Scaling",
            TreatmentFlag::Rujuk => "Rujuk",
        }
    }

    /// 按列名查找（忽略首尾空白和大小写）
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|flag| flag.column_name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for TreatmentFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// 判断单元格值是否表示该项目已执行
pub fn is_flag_value_set(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !value.eq_ignore_ascii_case("no")
}

/// 将已执行的项目按固定顺序以 `", "` 拼接
pub fn summarize(flags: &BTreeSet<TreatmentFlag>) -> String {
    flags
        .iter()
        .map(TreatmentFlag::column_name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// 解析项目名称列表，返回无法识别的名称
pub fn parse_names<I, S>(names: I) -> (BTreeSet<TreatmentFlag>, Vec<String>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut flags = BTreeSet::new();
    let mut unknown = Vec::new();

    for name in names {
        let name = name.as_ref().trim();
        if name.is_empty() {
            continue;
        }
        match TreatmentFlag::from_name(name) {
            Some(flag) => {
                flags.insert(flag);
            }
            None => unknown.push(name.to_string()),
        }
    }

    (flags, unknown)
}
