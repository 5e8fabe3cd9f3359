//! 类型标签、可见性与运行时值

use crate::bridge::Instance;
use std::fmt;

/// 成员可见性
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public = 0,
    Protected = 1,
    Private = 2,
}

impl Visibility {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Visibility::Public),
            1 => Some(Visibility::Protected),
            2 => Some(Visibility::Private),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 基本类型或具名类型
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Void,
    Bool,
    Int,
    Long,
    Double,
    Str,
    /// 全限定名
    Named(String),
}

impl TypeTag {
    /// 二进制编码中的类型码
    pub fn code(&self) -> u8 {
        match self {
            TypeTag::Void => 0,
            TypeTag::Bool => 1,
            TypeTag::Int => 2,
            TypeTag::Long => 3,
            TypeTag::Double => 4,
            TypeTag::Str => 5,
            TypeTag::Named(_) => 6,
        }
    }

    /// 从类型码还原；具名类型需要额外的名字
    pub fn from_code(code: u8, name: Option<&str>) -> Option<Self> {
        match (code, name) {
            (0, _) => Some(TypeTag::Void),
            (1, _) => Some(TypeTag::Bool),
            (2, _) => Some(TypeTag::Int),
            (3, _) => Some(TypeTag::Long),
            (4, _) => Some(TypeTag::Double),
            (5, _) => Some(TypeTag::Str),
            (6, Some(name)) => Some(TypeTag::Named(name.to_string())),
            _ => None,
        }
    }

    /// 解析成员声明中的类型写法
    ///
    /// `String` 与 `java.lang.String` 视为 `string` 的别名，其余非空写法均为具名类型。
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let tag = match text {
            "" => return None,
            "void" => TypeTag::Void,
            "boolean" | "bool" => TypeTag::Bool,
            "int" => TypeTag::Int,
            "long" => TypeTag::Long,
            "double" => TypeTag::Double,
            "string" | "String" | "java.lang.String" => TypeTag::Str,
            other => TypeTag::Named(other.to_string()),
        };
        Some(tag)
    }

    /// 构造前字段的默认值
    pub fn default_value(&self) -> Value {
        match self {
            TypeTag::Bool => Value::Bool(false),
            TypeTag::Int => Value::Int(0),
            TypeTag::Long => Value::Long(0),
            TypeTag::Double => Value::Double(0.0),
            TypeTag::Void | TypeTag::Str | TypeTag::Named(_) => Value::Null,
        }
    }

    /// 该类型是否接受 `null`
    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeTag::Str | TypeTag::Named(_))
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Void => f.write_str("void"),
            TypeTag::Bool => f.write_str("boolean"),
            TypeTag::Int => f.write_str("int"),
            TypeTag::Long => f.write_str("long"),
            TypeTag::Double => f.write_str("double"),
            TypeTag::Str => f.write_str("string"),
            TypeTag::Named(name) => f.write_str(name),
        }
    }
}

/// 渲染成员签名，如 `test(int,string)`
pub fn signature(name: &str, params: &[TypeTag]) -> String {
    let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
    format!("{}({})", name, params.join(","))
}

/// 运行时值
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Str(String),
    Object(Instance),
}

impl Value {
    /// 用于错误信息的类型名
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "boolean".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Long(_) => "long".to_string(),
            Value::Double(_) => "double".to_string(),
            Value::Str(_) => "string".to_string(),
            Value::Object(instance) => instance.type_name().to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            // 对象按身份比较
            (Value::Object(a), Value::Object(b)) => a.same_instance(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Long(n) => write!(f, "{}", n),
            // `{:?}` 保留整数值的 `.0`
            Value::Double(d) => write!(f, "{:?}", d),
            Value::Str(s) => f.write_str(s),
            Value::Object(instance) => write!(f, "{}", instance),
        }
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Long(n)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tag_parse() {
        assert_eq!(TypeTag::parse("int"), Some(TypeTag::Int));
        assert_eq!(TypeTag::parse(" String "), Some(TypeTag::Str));
        assert_eq!(TypeTag::parse("java.lang.String"), Some(TypeTag::Str));
        assert_eq!(
            TypeTag::parse("com.lee.demo.Bar"),
            Some(TypeTag::Named("com.lee.demo.Bar".to_string()))
        );
        assert_eq!(TypeTag::parse("  "), None);
    }

    #[test]
    fn test_type_tag_codes() {
        for tag in [
            TypeTag::Void,
            TypeTag::Bool,
            TypeTag::Int,
            TypeTag::Long,
            TypeTag::Double,
            TypeTag::Str,
        ] {
            assert_eq!(TypeTag::from_code(tag.code(), None), Some(tag));
        }
        assert_eq!(TypeTag::from_code(6, None), None);
        assert_eq!(
            TypeTag::from_code(6, Some("a.B")),
            Some(TypeTag::Named("a.B".to_string()))
        );
        assert_eq!(TypeTag::from_code(42, None), None);
    }

    #[test]
    fn test_default_values() {
        assert_eq!(TypeTag::Int.default_value(), Value::Int(0));
        assert_eq!(TypeTag::Bool.default_value(), Value::Bool(false));
        assert_eq!(TypeTag::Double.default_value(), Value::Double(0.0));
        assert_eq!(TypeTag::Str.default_value(), Value::Null);
    }

    #[test]
    fn test_signature() {
        assert_eq!(signature("test", &[]), "test()");
        assert_eq!(
            signature("<init>", &[TypeTag::Int, TypeTag::Str]),
            "<init>(int,string)"
        );
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Int(24).to_string(), "24");
        assert_eq!(Value::from("sample").to_string(), "sample");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Double(1.0).to_string(), "1.0");
        assert_eq!(Value::Bool(true).to_string(), "true");
    }

    #[test]
    fn test_visibility_roundtrip() {
        for vis in [Visibility::Public, Visibility::Protected, Visibility::Private] {
            assert_eq!(Visibility::from_u8(vis as u8), Some(vis));
        }
        assert_eq!(Visibility::from_u8(9), None);
    }
}
