//! Kiln API
//!
//! 面向应用的统一入口：把核心流水线（描述 → 生成 → 写入 → 加载 → 调用）包装在
//! [`Engine`] 上，并把各阶段错误统一为 [`KilnError`]。
//!
//! ```rust,ignore
//! use kiln_api::{sample_descriptor, Engine, EngineConfig, Value};
//!
//! let engine = Engine::new(EngineConfig::default().with_module_dir("output"));
//! engine.publish(sample_descriptor()?)?;
//! engine.run("com.lee.demo.Foo", &[24.into(), "sample".into()], "test", &[])?;
//! ```

pub mod config;
pub mod error;
pub mod sample;
pub mod types;

pub use error::{ErrorReport, KilnError};
pub use kiln_config;
pub use kiln_core;
pub use kiln_config::{EngineConfig, LogConfig, LogFormat, LogLevel, Phase};
pub use kiln_core::binary::ModuleInfo;
pub use kiln_core::{
    BinaryModule, CaptureSink, DiagnosticSink, FrozenType, Instance, LoadedType, LoaderHandle,
    StdoutSink, TypeDescriptor, TypeTag, Value, Visibility,
};
pub use kiln_vfs::{MemoryFileSystem, NativeFileSystem, VirtualFileSystem};
pub use sample::{sample_descriptor, SAMPLE_OUTPUT, SAMPLE_TYPE};
pub use types::{parse_arg, parse_args};

use kiln_core::{construct, generate, LoadError, ModuleWriter};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, info};

/// 引擎门面
///
/// 持有配置、文件系统与输出通道。引擎本身不缓存任何类型；每次
/// [`Engine::open_loader`] 都得到一个身份独立的加载器。
pub struct Engine {
    config: EngineConfig,
    vfs: Arc<dyn VirtualFileSystem>,
    sink: Rc<dyn DiagnosticSink>,
}

impl Engine {
    /// 使用本地文件系统和标准输出创建引擎
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            vfs: Arc::new(NativeFileSystem::new()),
            sink: Rc::new(StdoutSink),
        }
    }

    /// 使用全局配置创建（见 [`config::init`]）
    pub fn from_global() -> Self {
        Self::new(config::config().clone())
    }

    pub fn with_vfs(mut self, vfs: Arc<dyn VirtualFileSystem>) -> Self {
        self.vfs = vfs;
        self
    }

    pub fn with_sink(mut self, sink: Rc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 冻结描述并生成二进制模块
    pub fn build(&self, descriptor: TypeDescriptor) -> Result<BinaryModule, KilnError> {
        let frozen = descriptor.freeze()?;
        Ok(generate(&frozen)?)
    }

    /// 把模块写入配置的模块目录，返回最终路径
    pub fn write(&self, module: &BinaryModule) -> Result<PathBuf, KilnError> {
        let writer = ModuleWriter::with_config(Arc::clone(&self.vfs), &self.config);
        Ok(writer.write(module, &self.config.module_dir)?)
    }

    /// build + write
    pub fn publish(&self, descriptor: TypeDescriptor) -> Result<PathBuf, KilnError> {
        let module = self.build(descriptor)?;
        let path = self.write(&module)?;
        info!(target: "kiln::store", type_name = module.name(), path = %path.display(), "module published");
        Ok(path)
    }

    /// 打开一个新的加载器
    pub fn open_loader(&self) -> LoaderHandle {
        LoaderHandle::open_with_config(&self.config, Arc::clone(&self.vfs), Rc::clone(&self.sink))
    }

    /// 读取已写入模块的摘要
    pub fn inspect(&self, name: &str) -> Result<ModuleInfo, KilnError> {
        let writer = ModuleWriter::with_config(Arc::clone(&self.vfs), &self.config);
        let path = writer.path_for(&self.config.module_dir, name);
        let bytes = self.vfs.read_file(&path).map_err(|source| {
            if source.is_not_found() {
                LoadError::ModuleNotFound {
                    name: name.to_string(),
                    path: path.clone(),
                }
            } else {
                LoadError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;

        ModuleInfo::from_bytes(&bytes).map_err(|e| {
            KilnError::Load(LoadError::Format {
                name: name.to_string(),
                reason: e.to_string(),
            })
        })
    }

    /// 用一个临时加载器完成 加载 → 构造 → 调用，结束时关闭加载器
    ///
    /// 返回值若是对象，在加载器关闭后即失效；需要长期持有实例时请使用
    /// [`Engine::open_loader`]。
    pub fn run(
        &self,
        name: &str,
        ctor_args: &[Value],
        method: &str,
        args: &[Value],
    ) -> Result<Value, KilnError> {
        let loader = self.open_loader();
        let ty = loader.load(name)?;
        let instance = construct(&ty, ctor_args)?;
        debug!(target: "kiln::bridge", instance = %instance, method, "running");
        let result = instance.invoke(method, args)?;
        loader.close();
        Ok(result)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_engine() -> (Engine, MemoryFileSystem, CaptureSink) {
        let fs = MemoryFileSystem::new();
        let sink = CaptureSink::new();
        let engine = Engine::new(EngineConfig::default().with_module_dir("/out"))
            .with_vfs(Arc::new(fs.clone()))
            .with_sink(Rc::new(sink.clone()));
        (engine, fs, sink)
    }

    #[test]
    fn test_publish_and_run_sample() {
        let (engine, fs, sink) = memory_engine();

        let path = engine.publish(sample_descriptor().unwrap()).unwrap();
        assert_eq!(path, PathBuf::from("/out/com/lee/demo/Foo.kmod"));
        assert_eq!(fs.file_paths(), vec!["/out/com/lee/demo/Foo.kmod".to_string()]);

        let result = engine
            .run(SAMPLE_TYPE, &[24.into(), "sample".into()], "test", &[])
            .unwrap();
        assert_eq!(result, Value::Null);
        assert_eq!(sink.lines(), vec![SAMPLE_OUTPUT.to_string()]);
    }

    #[test]
    fn test_run_missing_module() {
        let (engine, _, _) = memory_engine();
        let err = engine.run("com.lee.demo.Missing", &[], "test", &[]).unwrap_err();
        assert_eq!(err.phase(), "loader");
        assert_eq!(err.kind(), "ModuleNotFound");
    }

    #[test]
    fn test_build_error_surfaces() {
        let (engine, _, _) = memory_engine();
        let mut ty = TypeDescriptor::new("com.lee.demo.Bad");
        ty.add_method("broken", TypeTag::Void, vec![], "{ while (true) {} }")
            .unwrap();
        let err = engine.publish(ty).unwrap_err();
        assert_eq!(err.kind(), "UnsupportedBodyConstruct");
    }

    #[test]
    fn test_write_rejects_invalid_module_name() {
        let (engine, fs, _) = memory_engine();
        let module = BinaryModule::new("x./tmp/escape", b"KILN".to_vec());

        let err = engine.write(&module).unwrap_err();
        assert_eq!(err.phase(), "store");
        assert_eq!(err.kind(), "InvalidName");
        assert!(fs.file_paths().is_empty());
    }

    #[test]
    fn test_inspect() {
        let (engine, _, _) = memory_engine();
        engine.publish(sample_descriptor().unwrap()).unwrap();

        let info = engine.inspect(SAMPLE_TYPE).unwrap();
        assert_eq!(info.type_name, SAMPLE_TYPE);
        assert_eq!(info.fields, vec!["private int id", "protected string name"]);
        assert_eq!(info.methods, vec!["void test()"]);

        let err = engine.inspect("com.lee.demo.Nope").unwrap_err();
        assert_eq!(err.kind(), "ModuleNotFound");
    }

    #[test]
    fn test_each_loader_is_distinct() {
        let (engine, _, _) = memory_engine();
        engine.publish(sample_descriptor().unwrap()).unwrap();

        let a = engine.open_loader();
        let b = engine.open_loader();
        assert_ne!(a.id(), b.id());
        let ta = a.load(SAMPLE_TYPE).unwrap();
        let tb = b.load(SAMPLE_TYPE).unwrap();
        assert!(!ta.same_type(&tb));
    }
}
