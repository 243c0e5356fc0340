use std::env;
use std::str::FromStr;

use crate::motion::config::MotionEnvConfig;
use crate::motion::exercise::ExerciseKind;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    /// 未设置时由调用方生成
    pub session_id: Option<String>,
    pub motion: MotionEnvConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            session_id: env::var("SESSION_ID").ok().filter(|v| !v.trim().is_empty()),
            motion: MotionEnvConfig {
                exercise: env_or_parse("EXERCISE", ExerciseKind::Squat),
                smoothing_alpha: env_opt_parse("SMOOTHING_ALPHA"),
                buffer_capacity: env_opt_parse("BUFFER_CAPACITY"),
                live_window: env_opt_parse("LIVE_WINDOW"),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    env_opt_parse(key).unwrap_or(default)
}

/// 未设置或解析失败时返回 None，解析失败额外记录告警
pub fn env_opt_parse<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(
                key,
                value = %raw,
                "Failed to parse env var, using default"
            );
            None
        }
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
