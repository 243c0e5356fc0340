pub mod config;
pub mod engine;
pub mod exercise;
pub mod geometry;
pub mod monitoring;
pub mod scoring;
pub mod segmenter;
pub mod smoother;
pub mod types;

pub use config::MotionConfig;
pub use engine::{EngineStats, MotionEngine};
pub use exercise::ExerciseKind;
pub use types::{FrameInput, FrameOutcome, RepSummary};
