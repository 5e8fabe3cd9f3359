//! API 层配置
//!
//! 全局配置单例（供 CLI 使用）。库调用方通常直接把 [`EngineConfig`] 传给
//! [`crate::Engine::new`]，无需初始化全局配置。

use crate::error::KilnError;
use kiln_config::EngineConfig;
use once_cell::sync::{Lazy, OnceCell};

static GLOBAL_CONFIG: OnceCell<EngineConfig> = OnceCell::new();
static DEFAULT_CONFIG: Lazy<EngineConfig> = Lazy::new(EngineConfig::default);

/// 初始化全局配置，已初始化时报错
pub fn init(config: EngineConfig) -> Result<(), KilnError> {
    GLOBAL_CONFIG
        .set(config)
        .map_err(|_| KilnError::Config("config already initialized".to_string()))
}

/// 全局配置；未调用 [`init`] 时返回默认值
pub fn config() -> &'static EngineConfig {
    GLOBAL_CONFIG.get().unwrap_or(&*DEFAULT_CONFIG)
}

/// 全局配置是否已初始化
pub fn is_initialized() -> bool {
    GLOBAL_CONFIG.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_global_config_init_once() {
        // 全局状态：只有第一次 init 成功，之后的调用都报错
        let first = init(EngineConfig::default().with_module_dir("global-out"));
        if first.is_ok() {
            assert!(is_initialized());
            assert_eq!(config().module_dir, PathBuf::from("global-out"));
        }

        let second = init(EngineConfig::default());
        assert!(matches!(second, Err(KilnError::Config(_))));
        assert!(is_initialized());
    }

    #[test]
    fn test_config_is_always_readable() {
        assert_eq!(config().module_ext, "kmod");
    }
}
