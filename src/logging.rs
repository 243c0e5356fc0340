use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::constants::LOG_FILE_PREFIX;

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enable_file_logs: false,
            log_dir: "./logs".to_string(),
        }
    }
}

/// 安装全局 subscriber，返回本次调用是否完成安装
///
/// 已有全局 subscriber 时（如测试环境重复初始化）直接返回 false。
/// 文件日志目录不可用时退化为仅 stderr 输出。
pub fn init_tracing(config: &LogConfig) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    // stdout 留给回放结果 JSON
    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    let registry = Registry::default().with(env_filter).with(console_layer);

    if !config.enable_file_logs {
        return registry.try_init().is_ok();
    }

    match RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(30)
        .build(&config.log_dir)
    {
        Ok(file_appender) => {
            let file_layer = fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .json();
            registry.with(file_layer).try_init().is_ok()
        }
        Err(e) => {
            let installed = registry.try_init().is_ok();
            tracing::warn!(
                log_dir = %config.log_dir,
                error = %e,
                "File logging unavailable, continuing with console only"
            );
            installed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let cfg = LogConfig::default();
        init_tracing(&cfg);
        assert!(!init_tracing(&cfg));
    }
}
