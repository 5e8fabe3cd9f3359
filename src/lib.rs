//! Kiln - dynamic type synthesis
//!
//! 在运行时描述一个类型（字段、构造器、方法体），生成二进制模块并写入磁盘，
//! 再通过独立的加载器加载，并以后期绑定的方式构造实例、调用方法。
//!
//! # Architecture
//!
//! ```text
//! kiln-config/  - 配置数据类型（serde）
//! kiln-vfs/     - 虚拟文件系统（内存 / 本地）
//! kiln-core/    - 描述、代码生成、二进制格式、写入、加载、调用
//! kiln-api/     - Engine 门面与统一错误
//! kiln-cli/     - 命令行（`kiln demo` / `inspect` / `run`）
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use kiln::{sample_descriptor, Engine, EngineConfig, SAMPLE_TYPE};
//!
//! let engine = Engine::new(EngineConfig::default());
//! engine.publish(sample_descriptor()?)?;
//! engine.run(SAMPLE_TYPE, &[24.into(), "sample".into()], "test", &[])?;
//! // prints "24 sample"
//! ```

pub use kiln_api::*;

/// 核心层的完整接口（描述、代码生成、加载、调用）
pub use kiln_api::kiln_core as core;
