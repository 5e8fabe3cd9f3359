//! 测试辅助工具
//!
//! 提供 `Foo` 示例类型、临时目录与捕获输出的加载器

#![allow(dead_code)]

use kiln_core::descriptor::new_type;
use kiln_core::{
    generate, BinaryModule, CaptureSink, LoaderHandle, ModuleWriter, TypeDescriptor, TypeTag,
    Visibility,
};
use kiln_vfs::{MemoryFileSystem, VirtualFileSystem};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const FOO: &str = "com.lee.demo.Foo";

/// 构建示例类型：
/// `private int id; protected string name; Foo(int, string); void test()`
pub fn foo_descriptor() -> TypeDescriptor {
    let mut ty = new_type(FOO);
    ty.add_field("id", TypeTag::Int, Visibility::Private).unwrap();
    ty.add_field("name", TypeTag::Str, Visibility::Protected)
        .unwrap();
    ty.set_constructor(
        vec![TypeTag::Int, TypeTag::Str],
        "{ this.id = $1; this.name = $2; }",
    )
    .unwrap();
    ty.add_method("test", TypeTag::Void, vec![], "{}").unwrap();
    ty.insert_before("test", &[], r#"System.out.println(id + " " + name);"#)
        .unwrap();
    ty
}

pub fn foo_module() -> BinaryModule {
    generate(&foo_descriptor().freeze().unwrap()).unwrap()
}

/// 每个测试独立的磁盘目录
pub fn temp_dir(tag: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "kiln-core-{}-{}-{}",
        tag,
        std::process::id(),
        n
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

/// 写入内存文件系统，返回文件系统
pub fn write_to_memory(module: &BinaryModule, dir: &str) -> MemoryFileSystem {
    let fs = MemoryFileSystem::new();
    ModuleWriter::new(Arc::new(fs.clone()))
        .write(module, Path::new(dir))
        .unwrap();
    fs
}

/// 打开带捕获输出的加载器
pub fn open_loader(
    dir: impl Into<PathBuf>,
    vfs: Arc<dyn VirtualFileSystem>,
) -> (LoaderHandle, CaptureSink) {
    let sink = CaptureSink::new();
    let loader = LoaderHandle::open(dir, vfs, Rc::new(sink.clone()));
    (loader, sink)
}
