//! Kiln Core
//!
//! 动态类型合成与执行引擎的核心：
//!
//! ```text
//! TypeDescriptor --freeze--> FrozenType --generate--> BinaryModule --write--> <dir>/a/b/C.kmod
//!                                                                                  |
//!                         Instance <--construct-- LoadedType <--load-- LoaderHandle
//! ```
//!
//! - [`descriptor`]: 类型描述构建器（字段 → 构造器 → 方法）
//! - [`body`]: 方法体 IR 与文本片段解析
//! - [`codegen`]: 将冻结的描述降级为二进制模块
//! - [`binary`]: 二进制模块格式（文件头、section、指令编码）
//! - [`store`]: 模块写入（按全限定名定位，临时文件 + rename）
//! - [`loader`]: 模块加载（按加载器隔离的类型身份）
//! - [`bridge`]: 后期绑定的构造与调用
//!
//! 核心库不安装 tracing subscriber，只在 `kiln::<phase>` target 下发出事件。

pub mod binary;
pub mod body;
pub mod bridge;
pub mod codegen;
pub mod descriptor;
pub mod error;
pub mod loader;
pub mod sink;
pub mod store;
pub mod value;

pub use body::{Body, Operand, Stmt};
pub use bridge::{construct, invoke, Instance};
pub use codegen::{generate, BinaryModule};
pub use descriptor::{
    ConstructorDescriptor, FieldDescriptor, FrozenType, MethodDescriptor, TypeDescriptor,
};
pub use error::{BuildError, InvokeError, LoadError, PersistError};
pub use loader::{LoadedType, LoaderHandle, LoaderId};
pub use sink::{CaptureSink, DiagnosticSink, StdoutSink};
pub use store::{module_path, ModuleWriter};
pub use value::{TypeTag, Value, Visibility};
