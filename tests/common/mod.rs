//! 测试辅助工具
//!
//! 提供端到端测试的引擎构造函数

#![allow(dead_code)]

use kiln::{CaptureSink, Engine, EngineConfig, MemoryFileSystem, NativeFileSystem};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 内存文件系统上的引擎，输出被捕获
pub fn memory_engine(config: EngineConfig) -> (Engine, MemoryFileSystem, CaptureSink) {
    let fs = MemoryFileSystem::new();
    let sink = CaptureSink::new();
    let engine = Engine::new(config)
        .with_vfs(Arc::new(fs.clone()))
        .with_sink(Rc::new(sink.clone()));
    (engine, fs, sink)
}

/// 本地磁盘上的引擎，模块目录是独立的临时目录
pub fn disk_engine(tag: &str) -> (Engine, PathBuf, CaptureSink) {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("kiln-it-{}-{}-{}", tag, std::process::id(), n));
    let _ = std::fs::remove_dir_all(&dir);

    let sink = CaptureSink::new();
    let engine = Engine::new(EngineConfig::default().with_module_dir(&dir))
        .with_vfs(Arc::new(NativeFileSystem::new()))
        .with_sink(Rc::new(sink.clone()));
    (engine, dir, sink)
}
