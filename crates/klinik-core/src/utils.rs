//! 通用工具函数

use chrono::NaiveDate;

/// 就诊日期格式
pub const VISIT_DATE_FORMAT: &str = "%Y-%m-%d";

/// 严格校验 `YYYY-MM-DD` 形式的就诊日期
///
/// 除形状外还要求日不为 `00` 且为真实存在的日历日期。
pub fn is_valid_visit_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }

    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !digits_ok || &value[8..10] == "00" {
        return false;
    }

    NaiveDate::parse_from_str(value, VISIT_DATE_FORMAT).is_ok()
}

/// 校验 `YYYY-MM` 形式的月份前缀
pub fn is_valid_month(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 7 || bytes[4] != b'-' {
        return false;
    }
    if !bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || b.is_ascii_digit())
    {
        return false;
    }

    matches!(value[5..7].parse::<u32>(), Ok(1..=12))
}

/// 取就诊日期的 `YYYY-MM` 部分
pub fn month_key(visit_date: &str) -> &str {
    visit_date.get(..7).unwrap_or(visit_date)
}

/// 日期转为就诊日期字符串
pub fn format_visit_date(date: NaiveDate) -> String {
    date.format(VISIT_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_visit_date() {
        assert!(is_valid_visit_date("2025-03-10"));
        assert!(is_valid_visit_date("2024-02-29"));

        assert!(!is_valid_visit_date(""));
        assert!(!is_valid_visit_date("-"));
        assert!(!is_valid_visit_date("2025-08-00"));
        assert!(!is_valid_visit_date("2025-3-10"));
        assert!(!is_valid_visit_date("10/03/2025"));
        assert!(!is_valid_visit_date("2025-02-30"));
        assert!(!is_valid_visit_date("2025-03-10 "));
        assert!(!is_valid_visit_date("２０２５-03-10"));
    }

    #[test]
    fn test_is_valid_month() {
        assert!(is_valid_month("2025-03"));
        assert!(is_valid_month("2025-12"));
        assert!(!is_valid_month("2025-13"));
        assert!(!is_valid_month("2025-00"));
        assert!(!is_valid_month("2025-3"));
        assert!(!is_valid_month("2025-03-10"));
    }

    #[test]
    fn test_month_key() {
        assert_eq!(month_key("2025-03-10"), "2025-03");
        assert_eq!(month_key("2025"), "2025");
    }

    #[test]
    fn test_format_visit_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(format_visit_date(date), "2025-03-09");
    }
}
