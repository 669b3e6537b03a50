//! 记录搜索
//!
//! 在配置的字段上做不区分大小写的子串匹配，保持仓库顺序。

use hospital_core::Record;

/// 过滤出任一字段包含搜索词的记录，空白搜索词匹配全部
///
/// 非空搜索词原样参与匹配，首尾空格也是子串的一部分。
pub fn search<'a>(records: &'a [Record], term: &str, fields: &[&str]) -> Vec<&'a Record> {
    if term.trim().is_empty() {
        return records.iter().collect();
    }
    let needle = term.to_lowercase();

    records
        .iter()
        .filter(|record| matches(record, &needle, fields))
        .collect()
}

/// 记录是否匹配已转为小写的搜索词
pub fn matches(record: &Record, needle: &str, fields: &[&str]) -> bool {
    fields.iter().any(|field| {
        record
            .text(field)
            .map(|text| text.to_lowercase().contains(needle))
            .unwrap_or(false)
    })
}
