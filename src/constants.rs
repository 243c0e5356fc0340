/// 滚动日志文件名前缀
pub const LOG_FILE_PREFIX: &str = "rep-motion";

/// 上游姿态模型每帧输出的关键点数量（MediaPipe Pose）
pub const POSE_LANDMARK_COUNT: usize = 33;

/// 弱项最多返回数量
pub const MAX_WEAK_AREAS: usize = 5;

/// 建议最多返回数量
pub const MAX_RECOMMENDATIONS: usize = 5;

/// 趋势分析使用的最近会话数
pub const TREND_SESSION_WINDOW: usize = 5;

/// 一致性得分归一化分母（严重度权重标准差的经验上限）
pub const CONSISTENCY_SPREAD: f64 = 2.5;

/// 单次动作提示中证据文本的最大长度
pub const CUE_EVIDENCE_MAX_CHARS: usize = 80;
