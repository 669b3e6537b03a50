//! 通用工具函数

/// 序号补零宽度
pub const SEQUENCE_WIDTH: usize = 3;

/// 生成顺序记录ID，例如 `('P', 5)` -> `P005`
pub fn format_sequence_id(prefix: char, sequence: usize) -> String {
    format!("{}{:0width$}", prefix, sequence, width = SEQUENCE_WIDTH)
}

/// 解析顺序记录ID的序号部分
pub fn parse_sequence(id: &str, prefix: char) -> Option<usize> {
    let digits = id.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// 输入是否为空白
pub fn is_blank(input: &str) -> bool {
    input.trim().is_empty()
}
