//! 教练相关：下游请求负载与会话级分析

pub mod analysis;
pub mod payload;

pub use analysis::{SessionAnalyzer, SessionRecord, SessionReport};
pub use payload::{CoachMode, CoachingRequest};
