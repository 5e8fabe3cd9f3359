//! CLI 日志系统初始化
//!
//! 基于 `tracing-subscriber` 实现分阶段日志控制：每个流水线阶段对应一个
//! `kiln::<phase>` target，级别取自 [`LogConfig::level_for`]。
//! 日志写到 stderr，stdout 只留给被调用方法的输出。

use crate::config::level_filter;
use kiln_config::{LogConfig, LogFormat, Phase};
use std::io;
use std::sync::Mutex;
use tracing_subscriber::{
    filter::Targets,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer, Registry,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// 构建分阶段过滤器
pub fn targets(log_config: &LogConfig) -> Targets {
    Phase::ALL.iter().fold(
        Targets::new()
            .with_default(level_filter(log_config.global))
            .with_target("kiln::cli", level_filter(log_config.global)),
        |targets, phase| targets.with_target(phase.target(), level_filter(log_config.level_for(*phase))),
    )
}

/// 使用日志配置初始化日志系统；配置了文件时同时写入文件
pub fn init(log_config: &LogConfig) -> Result<(), String> {
    let targets = targets(log_config);
    let mut layers: Vec<BoxedLayer> = vec![create_format_layer(log_config.format, io::stderr)
        .with_filter(targets.clone())
        .boxed()];

    if let Some(path) = &log_config.file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| format!("Cannot open log file '{}': {}", path.display(), e))?;

        // 文件里不需要颜色
        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(Mutex::new(file))
            .with_filter(targets)
            .boxed();
        layers.push(file_layer);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| format!("Cannot install logger: {}", e))
}

/// 按输出格式创建格式化层
fn create_format_layer<W>(format: LogFormat, make_writer: W) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(make_writer)
            .boxed(),
    }
}
