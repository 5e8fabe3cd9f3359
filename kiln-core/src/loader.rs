//! 模块加载器
//!
//! [`LoaderHandle`] 按全限定名在给定目录中查找模块，加载时才解析路径，不要求
//! 模块在加载器创建时已经存在。每个加载器有独立的身份标识：两个加载器加载同一
//! 模块得到两个互不兼容的 [`LoadedType`]。关闭（或丢弃）加载器后，它产生的所有
//! 类型与实例都失效。
//!
//! 加载器不是 `Send`；需要并发加载时，每个线程各自打开加载器（底层文件系统可共享）。

use crate::binary::code::Instr;
use crate::binary::image::{FieldImage, MemberImage, ModuleImage};
use crate::codegen::PRINTLN;
use crate::descriptor::validate_qualified_name;
use crate::error::{InvokeError, LoadError};
use crate::sink::DiagnosticSink;
use crate::store::module_path;
use crate::value::TypeTag;
use kiln_config::EngineConfig;
use kiln_vfs::VirtualFileSystem;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument};

static NEXT_LOADER_ID: AtomicU64 = AtomicU64::new(1);

/// 加载器身份
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoaderId(u64);

impl LoaderId {
    fn next() -> Self {
        LoaderId(NEXT_LOADER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loader#{}", self.0)
    }
}

/// 加载器与其类型共享的状态
struct LoaderShared {
    id: LoaderId,
    closed: Cell<bool>,
    sink: Rc<dyn DiagnosticSink>,
}

/// 模块加载器
pub struct LoaderHandle {
    shared: Rc<LoaderShared>,
    dir: PathBuf,
    ext: String,
    vfs: Arc<dyn VirtualFileSystem>,
    cache: RefCell<HashMap<String, LoadedType>>,
}

impl LoaderHandle {
    /// 打开一个从 `dir` 加载模块的加载器
    pub fn open(
        dir: impl Into<PathBuf>,
        vfs: Arc<dyn VirtualFileSystem>,
        sink: Rc<dyn DiagnosticSink>,
    ) -> Self {
        let handle = Self {
            shared: Rc::new(LoaderShared {
                id: LoaderId::next(),
                closed: Cell::new(false),
                sink,
            }),
            dir: dir.into(),
            ext: EngineConfig::default().module_ext,
            vfs,
            cache: RefCell::new(HashMap::new()),
        };
        debug!(target: "kiln::loader", loader = %handle.id(), dir = %handle.dir.display(), "loader opened");
        handle
    }

    /// 按配置打开（目录与扩展名取自配置）
    pub fn open_with_config(
        config: &EngineConfig,
        vfs: Arc<dyn VirtualFileSystem>,
        sink: Rc<dyn DiagnosticSink>,
    ) -> Self {
        Self::open(config.module_dir.clone(), vfs, sink).with_extension(config.module_ext.clone())
    }

    /// 修改模块文件扩展名
    pub fn with_extension(mut self, ext: impl Into<String>) -> Self {
        self.ext = ext.into();
        self
    }

    pub fn id(&self) -> LoaderId {
        self.shared.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.get()
    }

    /// 按全限定名加载类型
    ///
    /// 同一加载器重复加载同名类型返回同一身份。
    #[instrument(target = "kiln::loader", skip(self), fields(loader = %self.id()))]
    pub fn load(&self, name: &str) -> Result<LoadedType, LoadError> {
        if self.is_closed() {
            return Err(LoadError::UseAfterClose {
                loader: self.id().get(),
            });
        }

        if let Some(loaded) = self.cache.borrow().get(name) {
            debug!(target: "kiln::loader", type_name = name, "cache hit");
            return Ok(loaded.clone());
        }

        let path = module_path(&self.dir, name, &self.ext);
        if validate_qualified_name(name).is_err() {
            return Err(LoadError::ModuleNotFound {
                name: name.to_string(),
                path,
            });
        }

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

        let format_err = |reason: String| LoadError::Format {
            name: name.to_string(),
            reason,
        };
        let image = ModuleImage::decode(&bytes).map_err(|e| format_err(e.to_string()))?;
        if image.name != name {
            return Err(format_err(format!("module declares type {}", image.name)));
        }
        let methods = bind(&image).map_err(format_err)?;

        let loaded = LoadedType {
            inner: Rc::new(TypeInner {
                shared: Rc::clone(&self.shared),
                image,
                methods,
                path,
            }),
        };

        info!(
            target: "kiln::loader",
            type_name = name,
            path = %loaded.path().display(),
            size = bytes.len(),
            "type loaded"
        );
        self.cache
            .borrow_mut()
            .insert(name.to_string(), loaded.clone());
        Ok(loaded)
    }

    /// 关闭加载器；其所有类型与实例随之失效。可重复调用。
    pub fn close(&self) {
        if !self.shared.closed.replace(true) {
            let released = self.cache.borrow_mut().drain().count();
            debug!(target: "kiln::loader", loader = %self.id(), released, "loader closed");
        }
    }
}

impl Drop for LoaderHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for LoaderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderHandle")
            .field("id", &self.id())
            .field("dir", &self.dir)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// 建立 (名字, 参数类型) → 方法 的解析表，并绑定外部调用
fn bind(image: &ModuleImage) -> Result<HashMap<(String, Vec<TypeTag>), usize>, String> {
    let mut table = HashMap::with_capacity(image.methods.len());

    for member in std::iter::once(&image.constructor).chain(&image.methods) {
        for instr in &member.code {
            if let Instr::CallExternal { name, argc } = *instr {
                let external = image.strings.get(name).unwrap_or_default();
                if external != PRINTLN || argc != 1 {
                    return Err(format!(
                        "{} calls unbound external {}/{}",
                        member.signature(),
                        external,
                        argc
                    ));
                }
            }
        }
    }

    for (index, method) in image.methods.iter().enumerate() {
        let key = (method.name.clone(), method.params.clone());
        if table.insert(key, index).is_some() {
            return Err(format!("duplicate method {}", method.signature()));
        }
    }

    Ok(table)
}

struct TypeInner {
    shared: Rc<LoaderShared>,
    image: ModuleImage,
    methods: HashMap<(String, Vec<TypeTag>), usize>,
    path: PathBuf,
}

/// 已加载的类型，作用域限于产生它的加载器
#[derive(Clone)]
pub struct LoadedType {
    inner: Rc<TypeInner>,
}

impl LoadedType {
    pub fn name(&self) -> &str {
        &self.inner.image.name
    }

    pub fn loader_id(&self) -> LoaderId {
        self.inner.shared.id
    }

    /// 模块文件路径
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// 所属加载器是否仍然打开
    pub fn is_valid(&self) -> bool {
        !self.inner.shared.closed.get()
    }

    pub fn fields(&self) -> &[FieldImage] {
        &self.inner.image.fields
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.inner.image.fields.iter().position(|f| f.name == name)
    }

    pub fn constructor(&self) -> &MemberImage {
        &self.inner.image.constructor
    }

    pub fn methods(&self) -> &[MemberImage] {
        &self.inner.image.methods
    }

    /// 精确签名查找
    pub fn find_method(&self, name: &str, params: &[TypeTag]) -> Option<&MemberImage> {
        self.inner
            .methods
            .get(&(name.to_string(), params.to_vec()))
            .and_then(|&i| self.inner.image.methods.get(i))
    }

    /// 同名且参数个数相同的方法，按声明顺序
    pub fn methods_with_arity<'a>(
        &'a self,
        name: &'a str,
        arity: usize,
    ) -> impl Iterator<Item = &'a MemberImage> + 'a {
        self.inner
            .image
            .methods
            .iter()
            .filter(move |m| m.name == name && m.params.len() == arity)
    }

    /// 是否为同一加载器产生的同一类型
    pub fn same_type(&self, other: &LoadedType) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn ensure_open(&self) -> Result<(), InvokeError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(InvokeError::UseAfterClose {
                type_name: self.name().to_string(),
            })
        }
    }

    pub(crate) fn string(&self, index: u32) -> Option<&str> {
        self.inner.image.strings.get(index)
    }

    pub(crate) fn sink(&self) -> &dyn DiagnosticSink {
        self.inner.shared.sink.as_ref()
    }
}

impl PartialEq for LoadedType {
    fn eq(&self, other: &Self) -> bool {
        self.same_type(other)
    }
}

impl fmt::Debug for LoadedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedType")
            .field("name", &self.name())
            .field("loader", &self.loader_id())
            .field("valid", &self.is_valid())
            .finish()
    }
}
