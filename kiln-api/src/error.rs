//! API 错误类型
//!
//! 提供统一的错误类型和结构化错误报告。

use kiln_core::{BuildError, InvokeError, LoadError, PersistError};
use serde::Serialize;
use thiserror::Error;

/// Kiln 错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KilnError {
    /// 生成期错误
    #[error("{0}")]
    Build(#[from] BuildError),

    /// 写入错误
    #[error("{0}")]
    Persist(#[from] PersistError),

    /// 加载错误
    #[error("{0}")]
    Load(#[from] LoadError),

    /// 构造与调用错误
    #[error("{0}")]
    Invoke(#[from] InvokeError),

    /// 配置错误
    #[error("Config error: {0}")]
    Config(String),
}

impl KilnError {
    /// 获取错误阶段名称
    pub fn phase(&self) -> &'static str {
        match self {
            KilnError::Build(BuildError::UnsupportedBodyConstruct { .. }) => "codegen",
            KilnError::Build(_) => "descriptor",
            KilnError::Persist(_) => "store",
            KilnError::Load(_) => "loader",
            KilnError::Invoke(_) => "bridge",
            KilnError::Config(_) => "config",
        }
    }

    /// 错误类型（可用于程序化处理）
    pub fn kind(&self) -> &'static str {
        match self {
            KilnError::Build(e) => match e {
                BuildError::DuplicateField { .. } => "DuplicateField",
                BuildError::DuplicateMethod { .. } => "DuplicateMethod",
                BuildError::AlreadySet { .. } => "AlreadySet",
                BuildError::SignatureMismatch { .. } => "SignatureMismatch",
                BuildError::UnsupportedBodyConstruct { .. } => "UnsupportedBodyConstruct",
                BuildError::OutOfOrder { .. } => "OutOfOrder",
                BuildError::UnknownMethod { .. } => "UnknownMethod",
                BuildError::InvalidName { .. } => "InvalidName",
            },
            KilnError::Persist(e) => match e {
                PersistError::InvalidName { .. } => "InvalidName",
                PersistError::Io { .. } => "IOError",
            },
            KilnError::Load(e) => match e {
                LoadError::ModuleNotFound { .. } => "ModuleNotFound",
                LoadError::Format { .. } => "FormatError",
                LoadError::Io { .. } => "IOError",
                LoadError::UseAfterClose { .. } => "UseAfterClose",
            },
            KilnError::Invoke(e) => match e {
                InvokeError::ArgumentArity { .. } => "ArgumentArity",
                InvokeError::ArgumentType { .. } => "ArgumentType",
                InvokeError::MethodNotFound { .. } => "MethodNotFound",
                InvokeError::AmbiguousCall { .. } => "AmbiguousCall",
                InvokeError::FieldNotFound { .. } => "FieldNotFound",
                InvokeError::UseAfterClose { .. } => "UseAfterClose",
                InvokeError::Execution { .. } => "Execution",
            },
            KilnError::Config(_) => "Config",
        }
    }

    /// 相关成员（如果有）
    fn member(&self) -> Option<String> {
        match self {
            KilnError::Build(
                BuildError::SignatureMismatch { member, .. }
                | BuildError::UnsupportedBodyConstruct { member, .. },
            )
            | KilnError::Invoke(
                InvokeError::ArgumentArity { member, .. }
                | InvokeError::ArgumentType { member, .. }
                | InvokeError::Execution { member, .. },
            ) => Some(member.clone()),
            KilnError::Build(
                BuildError::DuplicateMethod {
                    type_name,
                    signature,
                }
                | BuildError::UnknownMethod {
                    type_name,
                    signature,
                },
            ) => Some(format!("{}.{}", type_name, signature)),
            KilnError::Invoke(
                InvokeError::MethodNotFound {
                    type_name, method, ..
                }
                | InvokeError::AmbiguousCall {
                    type_name, method, ..
                },
            ) => Some(format!("{}.{}", type_name, method)),
            _ => None,
        }
    }

    /// 转换为结构化错误报告
    ///
    /// CLI 可以直接打印，上层应用可以序列化为 JSON。
    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            phase: self.phase(),
            error_kind: self.kind(),
            member: self.member(),
            message: self.to_string(),
        }
    }
}

/// 结构化错误报告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    /// 错误阶段: descriptor, codegen, store, loader, bridge, config
    pub phase: &'static str,
    /// 错误类型
    pub error_kind: &'static str,
    /// 相关成员，如 `com.lee.demo.Foo.test()`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    /// 人类可读的错误消息
    pub message: String,
}

impl std::fmt::Display for ErrorReport {
    /// 默认的 CLI 友好格式
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.phase, self.error_kind, self.message)
    }
}

impl ErrorReport {
    /// 转换为 JSON 格式（工具集成使用）
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"message\":{:?}}}", self.message))
    }

    /// 简洁格式（适合终端）
    pub fn to_short(&self) -> String {
        format!("{}: {}", self.phase, self.message)
    }
}
