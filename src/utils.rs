//! 字符串辅助工具：安全检查、关键字剥离、字面量转义与日志插值

use crate::params::ParamMap;

/// 自由文本片段的黑名单检查，命中则拒绝整条语句
pub fn passes_guard(fragment: &str) -> bool {
    let lowered = fragment.to_lowercase();
    !lowered.contains("delete from") && !lowered.contains("drop table")
}

/// 剥掉片段开头的指定关键字（大小写不敏感），关键字后必须是
/// 空白或片段结尾，避免把 `android` 当成 `and` 剥掉
pub fn strip_leading_keyword<'a>(input: &'a str, keyword: &str) -> &'a str {
    let trimmed = input.trim_start();
    if let Some(head) = trimmed.get(..keyword.len()) {
        if head.eq_ignore_ascii_case(keyword) {
            let rest = &trimmed[keyword.len()..];
            if rest.is_empty() || rest.starts_with(' ') {
                return rest.trim_start();
            }
        }
    }
    trimmed
}

/// 依次尝试剥掉多个候选关键字中的第一个命中项
pub fn strip_leading_keywords<'a>(input: &'a str, keywords: &[&str]) -> &'a str {
    let trimmed = input.trim_start();
    for keyword in keywords {
        let stripped = strip_leading_keyword(trimmed, keyword);
        if stripped.len() != trimmed.len() {
            return stripped;
        }
    }
    trimmed
}

/// 手动引用一个字符串字面量（反斜杠与单引号转义）
///
/// 正常路径应当走参数绑定；这个入口只给确实要拼接字面量的调用方。
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}

/// 把命名占位符替换为带引号的字面量，产出仅用于日志展示
///
/// 先替换长键再替换短键，防止 `:Status` 被 `:Status2` 的前缀截胡。
pub fn interpolate_query(sql: &str, params: &ParamMap) -> String {
    let mut entries: Vec<(&str, String)> = params
        .iter()
        .map(|(k, v)| (k, v.to_sql_value()))
        .collect();
    entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    let mut out = sql.to_string();
    for (key, literal) in entries {
        out = out.replacen(&format!(":{}", key), &literal, 1);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::BindValue;

    // ========== 安全检查测试 ==========
    #[test]
    fn test_guard_rejects_denylisted_fragments() {
        assert!(!passes_guard("1=1; DELETE FROM users"));
        assert!(!passes_guard("x'; drop table users; --"));
        assert!(!passes_guard("Drop Table users"));
    }

    #[test]
    fn test_guard_accepts_normal_fragments() {
        assert!(passes_guard("name, email"));
        assert!(passes_guard("count(*) as total"));
        assert!(passes_guard("deleted_at is null"));
    }

    // ========== 关键字剥离测试 ==========
    #[test]
    fn test_strip_leading_keyword() {
        assert_eq!(strip_leading_keyword("select name, email", "select"), "name, email");
        assert_eq!(strip_leading_keyword("SELECT name", "select"), "name");
        assert_eq!(strip_leading_keyword("  group by status", "group by"), "status");
        assert_eq!(strip_leading_keyword("name, email", "select"), "name, email");
    }

    #[test]
    fn test_strip_requires_word_boundary() {
        assert_eq!(strip_leading_keyword("android = 1", "and"), "android = 1");
        assert_eq!(strip_leading_keyword("and", "and"), "");
    }

    #[test]
    fn test_strip_first_matching_keyword() {
        assert_eq!(
            strip_leading_keywords("WHERE status", &["where", "and", "or"]),
            "status"
        );
        assert_eq!(
            strip_leading_keywords("or status", &["where", "and", "or"]),
            "status"
        );
        assert_eq!(
            strip_leading_keywords("status", &["where", "and", "or"]),
            "status"
        );
    }

    // ========== 引用与日志插值测试 ==========
    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("plain"), "'plain'");
        assert_eq!(quote("it's"), "'it''s'");
        assert_eq!(quote("a\\b"), "'a\\\\b'");
    }

    #[test]
    fn test_interpolate_longest_key_first() {
        let mut params = ParamMap::new();
        params.register("status", BindValue::String("a".into()));
        params.register("status", BindValue::String("b".into()));
        let rendered = interpolate_query(
            "UPDATE t SET status=:Status2 WHERE status = :Status ",
            &params,
        );
        assert_eq!(rendered, "UPDATE t SET status='b' WHERE status = 'a' ");
    }

    #[test]
    fn test_interpolate_numeric_values_unquoted() {
        let mut params = ParamMap::new();
        params.register("age", BindValue::Int64(18));
        assert_eq!(
            interpolate_query("WHERE age > :Age ", &params),
            "WHERE age > 18 "
        );
    }
}
