//! 引擎错误分类
//!
//! 每个流水线阶段一个错误枚举，全部同步返回给直接调用者：
//! - [`BuildError`]: 生成期（描述构建、代码生成）
//! - [`PersistError`]: 模块写入
//! - [`LoadError`]: 模块加载
//! - [`InvokeError`]: 构造与调用

use kiln_vfs::VfsError;
use std::path::PathBuf;
use thiserror::Error;

/// 生成期错误，绝不会在加载期出现
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Duplicate field '{field}' in type {type_name}")]
    DuplicateField { type_name: String, field: String },

    #[error("Duplicate method {signature} in type {type_name}")]
    DuplicateMethod { type_name: String, signature: String },

    #[error("Constructor already set on type {type_name}")]
    AlreadySet { type_name: String },

    #[error("Signature mismatch in {member}: {reason}")]
    SignatureMismatch { member: String, reason: String },

    #[error("Unsupported body construct in {member}: `{snippet}`")]
    UnsupportedBodyConstruct { member: String, snippet: String },

    /// 成员必须按 字段 → 构造器 → 方法 的顺序添加
    #[error("Cannot add {member} to type {type_name} after {stage}")]
    OutOfOrder {
        type_name: String,
        member: String,
        stage: &'static str,
    },

    #[error("No method {signature} in type {type_name}")]
    UnknownMethod { type_name: String, signature: String },

    #[error("Invalid type name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
}

/// 持久化错误，引擎不重试
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistError {
    /// 名字不是合法的全限定名，无法映射到模块目录内的路径
    #[error("Cannot write module '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("I/O error writing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: VfsError,
    },
}

/// 加载错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("Module {name} not found at {}", .path.display())]
    ModuleNotFound { name: String, path: PathBuf },

    /// 文件头、版本或表结构与当前生成器格式不一致
    #[error("Malformed module {name}: {reason}")]
    Format { name: String, reason: String },

    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: VfsError,
    },

    #[error("Loader {loader} is closed")]
    UseAfterClose { loader: u64 },
}

/// 构造与调用错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvokeError {
    #[error("{member} expects {expected} argument(s), got {found}")]
    ArgumentArity {
        member: String,
        expected: usize,
        found: usize,
    },

    #[error("{member} argument #{index}: expected {expected}, got {found}")]
    ArgumentType {
        member: String,
        index: usize,
        expected: String,
        found: String,
    },

    #[error("No method {method}/{arity} on type {type_name}")]
    MethodNotFound {
        type_name: String,
        method: String,
        arity: usize,
    },

    /// `null` 实参同时匹配多个重载
    #[error("Call {method}/{arity} on type {type_name} is ambiguous between {}", .candidates.join(" and "))]
    AmbiguousCall {
        type_name: String,
        method: String,
        arity: usize,
        candidates: Vec<String>,
    },

    #[error("No field '{field}' on type {type_name}")]
    FieldNotFound { type_name: String, field: String },

    /// 所属加载器已关闭，类型与实例均失效
    #[error("Type {type_name} was loaded by a closed loader")]
    UseAfterClose { type_name: String },

    /// 字节码执行失败（模块在加载时已校验，正常情况下不会出现）
    #[error("Execution of {member} failed: {reason}")]
    Execution { member: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_display() {
        let err = BuildError::DuplicateField {
            type_name: "com.lee.demo.Foo".to_string(),
            field: "id".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Duplicate field 'id' in type com.lee.demo.Foo"
        );
    }

    #[test]
    fn test_persist_error_source() {
        use std::error::Error;

        let err = PersistError::Io {
            path: PathBuf::from("/out/Foo.kmod"),
            source: VfsError::PermissionDenied {
                path: "/out/Foo.kmod.tmp".to_string(),
            },
        };
        assert!(err.to_string().contains("/out/Foo.kmod"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_invoke_error_display() {
        let err = InvokeError::MethodNotFound {
            type_name: "Foo".to_string(),
            method: "test".to_string(),
            arity: 2,
        };
        assert_eq!(err.to_string(), "No method test/2 on type Foo");
    }
}
