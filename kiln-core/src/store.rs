//! 模块写入
//!
//! 模块路径只由全限定名决定：`com.lee.demo.Foo` → `<dir>/com/lee/demo/Foo.kmod`，
//! 加载器据此从名字还原路径。写入先落到临时文件再 rename，失败时不留下新文件。
//! 已存在的模块会被覆盖（后写者胜，无版本管理）。

use crate::codegen::BinaryModule;
use crate::descriptor::validate_qualified_name;
use crate::error::PersistError;
use kiln_config::EngineConfig;
use kiln_vfs::VirtualFileSystem;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// 全限定名映射到 `dir` 下的模块文件路径
pub fn module_path(dir: &Path, name: &str, ext: &str) -> PathBuf {
    let mut path = dir.to_path_buf();
    let mut segments = name.split('.').peekable();
    while let Some(segment) = segments.next() {
        if segments.peek().is_some() {
            path.push(segment);
        } else {
            path.push(format!("{}.{}", segment, ext));
        }
    }
    path
}

/// 模块写入器
pub struct ModuleWriter {
    vfs: Arc<dyn VirtualFileSystem>,
    ext: String,
    temp_suffix: String,
}

impl ModuleWriter {
    /// 使用默认配置创建
    pub fn new(vfs: Arc<dyn VirtualFileSystem>) -> Self {
        Self::with_config(vfs, &EngineConfig::default())
    }

    pub fn with_config(vfs: Arc<dyn VirtualFileSystem>, config: &EngineConfig) -> Self {
        Self {
            vfs,
            ext: config.module_ext.clone(),
            temp_suffix: config.write.temp_suffix.clone(),
        }
    }

    /// 模块在 `dir` 下的路径
    pub fn path_for(&self, dir: &Path, name: &str) -> PathBuf {
        module_path(dir, name, &self.ext)
    }

    /// 写入模块，返回最终路径
    #[instrument(target = "kiln::store", skip(self, module), fields(type_name = module.name()))]
    pub fn write(&self, module: &BinaryModule, dir: &Path) -> Result<PathBuf, PersistError> {
        // 名字的每一段都会成为路径的一部分，非法名字可能写到 `dir` 之外
        validate_qualified_name(module.name()).map_err(|reason| PersistError::InvalidName {
            name: module.name().to_string(),
            reason,
        })?;

        let path = self.path_for(dir, module.name());
        let io_err = |source| PersistError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            self.vfs.create_dir_all(parent).map_err(io_err)?;
        }

        let mut temp = path.clone().into_os_string();
        temp.push(".");
        temp.push(&self.temp_suffix);
        let temp = PathBuf::from(temp);

        debug!(target: "kiln::store", temp = %temp.display(), size = module.len(), "writing temp file");
        let written = self
            .vfs
            .write_file(&temp, module.bytes())
            .and_then(|()| self.vfs.rename(&temp, &path));

        if let Err(source) = written {
            if self.vfs.exists(&temp) {
                if let Err(cleanup) = self.vfs.remove_file(&temp) {
                    warn!(target: "kiln::store", temp = %temp.display(), error = %cleanup, "failed to remove temp file");
                }
            }
            return Err(io_err(source));
        }

        info!(target: "kiln::store", path = %path.display(), "module written");
        Ok(path)
    }
}
