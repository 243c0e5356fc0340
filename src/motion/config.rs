use serde::{Deserialize, Serialize};

use crate::motion::exercise::ExerciseKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmoothingConfig {
    /// EMA 系数，越大越跟手
    pub alpha: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { alpha: 0.4 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmenterConfig {
    /// 速度滚动平均窗口（帧）
    pub velocity_window: usize,
    /// 判定下降/上升的平均速度阈值（归一化高度/帧）
    pub velocity_threshold: f64,
    /// 判定为有效动作的最小下降幅度
    pub min_drop: f64,
    /// 从最低点回升的最小幅度
    pub min_rise: f64,
    /// 回升需达到下降幅度的比例
    #[serde(default = "default_return_fraction")]
    pub return_fraction: f64,
    /// 最低点之后允许反向前的最少帧数
    pub settle_frames: u64,
    /// 上一次动作结束后的冷却帧数
    pub cooldown_frames: u64,
    pub min_rep_frames: u64,
    pub max_rep_frames: u64,
    /// 关节最小屈曲角（度）
    pub min_flexion_deg: f64,
}

fn default_return_fraction() -> f64 {
    0.75
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            velocity_window: 5,
            velocity_threshold: 0.002,
            min_drop: 0.08,
            min_rise: 0.05,
            return_fraction: 0.75,
            settle_frames: 6,
            cooldown_frames: 12,
            min_rep_frames: 12,
            max_rep_frames: 120,
            min_flexion_deg: 35.0,
        }
    }
}

impl SegmenterConfig {
    pub fn push_up() -> Self {
        Self {
            velocity_threshold: 0.0015,
            min_drop: 0.05,
            min_rise: 0.03,
            min_flexion_deg: 30.0,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferConfig {
    /// 滚动帧缓冲容量
    pub capacity: usize,
    /// 实时检查窗口（帧）
    pub live_window: usize,
    /// 计算顶部参考高度的起始子窗口（帧）
    pub top_reference_frames: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: 300,
            live_window: 15,
            top_reference_frames: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceConfig {
    /// 平均置信度低于此值时附加警告
    pub low_average: f64,
    /// 单帧置信度低于此值时附加警告
    pub low_frame: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            low_average: 0.5,
            low_frame: 0.3,
        }
    }
}

/// 分级阈值：超过 `moderate` 为 moderate，超过 `high` 为 high
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityBand {
    pub moderate: f64,
    pub high: f64,
}

impl SeverityBand {
    pub const fn new(moderate: f64, high: f64) -> Self {
        Self { moderate, high }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckThresholds {
    /// 最低点关节角（度）
    pub depth: SeverityBand,
    /// 归一化横向偏移
    pub knee_tracking: SeverityBand,
    /// 躯干/身体线偏离角（度）
    pub torso_angle: SeverityBand,
    /// 归一化纵向波动
    pub heel_lift: SeverityBand,
    /// 左右关节角差（度）
    pub asymmetry: SeverityBand,
}

impl Default for CheckThresholds {
    fn default() -> Self {
        Self {
            depth: SeverityBand::new(105.0, 125.0),
            knee_tracking: SeverityBand::new(0.03, 0.06),
            torso_angle: SeverityBand::new(40.0, 55.0),
            heel_lift: SeverityBand::new(0.015, 0.03),
            asymmetry: SeverityBand::new(10.0, 20.0),
        }
    }
}

impl CheckThresholds {
    pub fn push_up() -> Self {
        Self {
            depth: SeverityBand::new(100.0, 120.0),
            knee_tracking: SeverityBand::new(0.05, 0.10),
            torso_angle: SeverityBand::new(15.0, 30.0),
            heel_lift: SeverityBand::new(0.015, 0.03),
            asymmetry: SeverityBand::new(10.0, 20.0),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionConfig {
    #[serde(default)]
    pub exercise: ExerciseKind,
    #[serde(default = "default_nominal_fps")]
    pub nominal_fps: f64,
    pub smoothing: SmoothingConfig,
    pub segmenter: SegmenterConfig,
    pub buffer: BufferConfig,
    #[serde(default)]
    pub confidence: ConfidenceConfig,
    #[serde(default)]
    pub checks: CheckThresholds,
}

fn default_nominal_fps() -> f64 {
    20.0
}

/// 来自进程环境变量的覆盖项
#[derive(Debug, Clone, Default)]
pub struct MotionEnvConfig {
    pub exercise: ExerciseKind,
    pub smoothing_alpha: Option<f64>,
    pub buffer_capacity: Option<usize>,
    pub live_window: Option<usize>,
}

impl MotionConfig {
    pub fn for_exercise(exercise: ExerciseKind) -> Self {
        match exercise {
            ExerciseKind::Squat => Self {
                exercise,
                nominal_fps: default_nominal_fps(),
                smoothing: SmoothingConfig::default(),
                segmenter: SegmenterConfig::default(),
                buffer: BufferConfig::default(),
                confidence: ConfidenceConfig::default(),
                checks: CheckThresholds::default(),
            },
            ExerciseKind::PushUp => Self {
                exercise,
                nominal_fps: default_nominal_fps(),
                smoothing: SmoothingConfig::default(),
                segmenter: SegmenterConfig::push_up(),
                buffer: BufferConfig::default(),
                confidence: ConfidenceConfig::default(),
                checks: CheckThresholds::push_up(),
            },
        }
    }

    pub fn from_env(env_config: &MotionEnvConfig) -> Self {
        let mut config = Self::for_exercise(env_config.exercise);
        if let Some(alpha) = env_config.smoothing_alpha {
            config.smoothing.alpha = alpha;
        }
        if let Some(capacity) = env_config.buffer_capacity {
            config.buffer.capacity = capacity;
        }
        if let Some(live_window) = env_config.live_window {
            config.buffer.live_window = live_window;
        }
        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.smoothing.alpha > 0.0 && self.smoothing.alpha <= 1.0) {
            return Err("smoothing.alpha must be in (0,1]".to_string());
        }
        if !(self.nominal_fps > 0.0) {
            return Err("nominalFps must be > 0".to_string());
        }

        let seg = &self.segmenter;
        if seg.velocity_window == 0 {
            return Err("segmenter.velocity_window must be >= 1".to_string());
        }
        if !(seg.velocity_threshold > 0.0) {
            return Err("segmenter.velocity_threshold must be > 0".to_string());
        }
        if !(seg.min_drop > 0.0) || !(seg.min_rise > 0.0) {
            return Err("segmenter.min_drop and segmenter.min_rise must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&seg.return_fraction) {
            return Err("segmenter.return_fraction must be in [0,1]".to_string());
        }
        if seg.min_rep_frames > seg.max_rep_frames {
            return Err("segmenter.min_rep_frames must be <= segmenter.max_rep_frames".to_string());
        }
        if !(0.0..180.0).contains(&seg.min_flexion_deg) {
            return Err("segmenter.min_flexion_deg must be in [0,180)".to_string());
        }

        let buf = &self.buffer;
        if buf.capacity < 3 {
            return Err("buffer.capacity must be >= 3".to_string());
        }
        if buf.live_window < 3 || buf.live_window > buf.capacity {
            return Err("buffer.live_window must be in [3, buffer.capacity]".to_string());
        }
        if buf.top_reference_frames == 0 {
            return Err("buffer.top_reference_frames must be >= 1".to_string());
        }

        if !(0.0..=1.0).contains(&self.confidence.low_average)
            || !(0.0..=1.0).contains(&self.confidence.low_frame)
        {
            return Err("confidence floors must be in [0,1]".to_string());
        }

        let bands = [
            ("checks.depth", self.checks.depth),
            ("checks.knee_tracking", self.checks.knee_tracking),
            ("checks.torso_angle", self.checks.torso_angle),
            ("checks.heel_lift", self.checks.heel_lift),
            ("checks.asymmetry", self.checks.asymmetry),
        ];
        for (name, band) in bands {
            if !(band.moderate.is_finite() && band.high.is_finite()) || band.moderate > band.high {
                return Err(format!("{name}.moderate must be <= {name}.high"));
            }
        }

        Ok(())
    }
}
