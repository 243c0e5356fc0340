pub mod coaching;
pub mod config;
pub mod constants;
pub mod logging;
pub mod motion;
pub mod recording;
