//! 命令行参数到 [`Value`] 的转换

use kiln_core::Value;

/// 将文本参数解析为运行时值
///
/// 依次识别 `null`、`true`/`false`、整数（先 i32 后 i64）、浮点数与双引号字符串，
/// 其余按普通字符串处理。
pub fn parse_arg(text: &str) -> Value {
    let trimmed = text.trim();
    match trimmed {
        "null" => return Value::Null,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if let Ok(n) = trimmed.parse::<i32>() {
        return Value::Int(n);
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::Long(n);
    }
    if trimmed.contains(['.', 'e', 'E']) {
        if let Ok(d) = trimmed.parse::<f64>() {
            if d.is_finite() {
                return Value::Double(d);
            }
        }
    }

    match trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        Some(inner) => Value::Str(inner.to_string()),
        None => Value::Str(text.to_string()),
    }
}

/// 按顺序解析全部参数
pub fn parse_args<S: AsRef<str>>(args: &[S]) -> Vec<Value> {
    args.iter().map(|a| parse_arg(a.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literals() {
        assert_eq!(parse_arg("null"), Value::Null);
        assert_eq!(parse_arg("true"), Value::Bool(true));
        assert_eq!(parse_arg("24"), Value::Int(24));
        assert_eq!(parse_arg("-7"), Value::Int(-7));
        assert_eq!(parse_arg("3000000000"), Value::Long(3_000_000_000));
        assert_eq!(parse_arg("1.5"), Value::Double(1.5));
    }

    #[test]
    fn test_parse_strings() {
        assert_eq!(parse_arg("sample"), Value::Str("sample".to_string()));
        assert_eq!(parse_arg("\"42\""), Value::Str("42".to_string()));
        assert_eq!(parse_arg("\"\""), Value::Str(String::new()));
        // 非有限浮点按字符串处理
        assert_eq!(parse_arg("1e999"), Value::Str("1e999".to_string()));
        assert_eq!(parse_arg("inf"), Value::Str("inf".to_string()));
    }

    #[test]
    fn test_parse_args_keeps_order() {
        assert_eq!(
            parse_args(&["24", "sample"]),
            vec![Value::Int(24), Value::Str("sample".to_string())]
        );
    }
}
