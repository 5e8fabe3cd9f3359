//! CLI 配置
//!
//! 配置文件（JSON）打底，命令行参数覆盖。

use kiln_config::{ConfigError, EngineConfig, LogFormat, LogLevel};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

/// 命令行上可以覆盖的配置项
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub module_dir: Option<PathBuf>,
    /// `-v` 出现的次数
    pub verbose: u8,
    pub quiet: bool,
    pub log_format: Option<LogFormat>,
    pub log_file: Option<PathBuf>,
}

/// 读取配置文件（如有）并应用命令行覆盖
pub fn resolve(file: Option<&Path>, overrides: &Overrides) -> Result<EngineConfig, ConfigError> {
    let mut config = match file {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    apply(&mut config, overrides);
    Ok(config)
}

fn apply(config: &mut EngineConfig, overrides: &Overrides) {
    if let Some(dir) = &overrides.module_dir {
        config.module_dir = dir.clone();
    }
    if overrides.quiet {
        config.log.global = LogLevel::Error;
    } else if let Some(level) = verbosity(overrides.verbose) {
        config.log.global = config.log.global.max(level);
    }
    if let Some(format) = overrides.log_format {
        config.log.format = format;
    }
    if let Some(file) = &overrides.log_file {
        config.log.file = Some(file.clone());
    }
}

/// -v 为 info，-vv 为 debug，-vvv 为 trace
fn verbosity(count: u8) -> Option<LogLevel> {
    match count {
        0 => None,
        1 => Some(LogLevel::Info),
        2 => Some(LogLevel::Debug),
        _ => Some(LogLevel::Trace),
    }
}

/// 配置级别映射到 tracing 的过滤级别
pub fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let config = resolve(None, &Overrides::default()).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_verbosity_raises_global_level() {
        let overrides = Overrides {
            verbose: 2,
            ..Default::default()
        };
        let config = resolve(None, &overrides).unwrap();
        assert_eq!(config.log.global, LogLevel::Debug);
    }

    #[test]
    fn test_quiet_wins_over_verbose() {
        let overrides = Overrides {
            verbose: 3,
            quiet: true,
            ..Default::default()
        };
        let config = resolve(None, &overrides).unwrap();
        assert_eq!(config.log.global, LogLevel::Error);
    }

    #[test]
    fn test_overrides_apply_on_top_of_file() {
        let path = std::env::temp_dir().join(format!("kiln-cli-config-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{ "module_dir": "from-file", "log": { "global": "info", "loader": "trace" } }"#,
        )
        .unwrap();

        let overrides = Overrides {
            module_dir: Some(PathBuf::from("from-cli")),
            log_format: Some(LogFormat::Json),
            ..Default::default()
        };
        let config = resolve(Some(path.as_path()), &overrides).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(config.module_dir, PathBuf::from("from-cli"));
        assert_eq!(config.log.global, LogLevel::Info);
        assert_eq!(config.log.loader, Some(LogLevel::Trace));
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = resolve(Some(Path::new("/definitely/not/here.json")), &Overrides::default());
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_level_filter_mapping() {
        assert_eq!(level_filter(LogLevel::Warn), LevelFilter::WARN);
        assert_eq!(level_filter(LogLevel::Trace), LevelFilter::TRACE);
    }
}
