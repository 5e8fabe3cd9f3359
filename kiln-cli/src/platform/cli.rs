//! CLI 格式化输出
//!
//! 提供命令行友好的错误显示和返回值打印。

use kiln_api::{KilnError, ModuleInfo, Value};
use serde_json::json;

/// 错误输出格式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ErrorFormat {
    /// `❌ [phase] Kind: message`
    #[default]
    Human,
    /// 单行 JSON（工具集成）
    Json,
}

/// 打印错误到 stderr
pub fn print_error(e: &KilnError, format: ErrorFormat) {
    let report = e.to_report();
    match format {
        ErrorFormat::Human => {
            eprintln!("❌ {}", report);
            if let Some(member) = &report.member {
                eprintln!("   at {}", member);
            }
        }
        ErrorFormat::Json => eprintln!("{}", report.to_json()),
    }
}

/// 返回值的展示形式；`void` 方法的 null 不打印
pub fn format_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// JSON 格式的模块摘要（工具集成）
pub fn module_info_json(info: &ModuleInfo) -> serde_json::Value {
    let sections: Vec<serde_json::Value> = info
        .sections
        .iter()
        .map(|(kind, offset, size)| json!({ "kind": format!("{:?}", kind), "offset": offset, "size": size }))
        .collect();

    json!({
        "magic": String::from_utf8_lossy(&info.magic),
        "version": format!("{}.{}.{}", info.version.0, info.version.1, info.version.2),
        "type": info.type_name,
        "size": info.total_size,
        "sections": sections,
        "fields": info.fields,
        "constructor": info.constructor,
        "methods": info.methods,
        "code_size": info.code_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_info_json() {
        let info = ModuleInfo {
            magic: *b"KILN",
            version: (1, 0, 0),
            type_name: "com.lee.demo.Foo".to_string(),
            total_size: 128,
            sections: Vec::new(),
            fields: vec!["private int id".to_string()],
            constructor: "<init>(int)".to_string(),
            methods: vec!["void test()".to_string()],
            code_size: 12,
        };
        let value = module_info_json(&info);

        assert_eq!(value["magic"], "KILN");
        assert_eq!(value["version"], "1.0.0");
        assert_eq!(value["fields"][0], "private int id");
        assert_eq!(value["code_size"], 12);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&Value::Null), None);
        assert_eq!(format_value(&Value::Int(24)), Some("24".to_string()));
        assert_eq!(
            format_value(&Value::Str("sample".to_string())),
            Some("sample".to_string())
        );
    }
}
