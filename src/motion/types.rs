//! 运动分析核心数据类型
//!
//! 关节坐标为归一化图像坐标（x, y ∈ [0,1]，y 向下增长）；
//! 可选的世界坐标为以米为单位的 3D 坐标，不受相机透视影响。

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const JOINT_COUNT: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    pub const ALL: [Joint; JOINT_COUNT] = [
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Joint::LeftShoulder => "left_shoulder",
            Joint::RightShoulder => "right_shoulder",
            Joint::LeftElbow => "left_elbow",
            Joint::RightElbow => "right_elbow",
            Joint::LeftWrist => "left_wrist",
            Joint::RightWrist => "right_wrist",
            Joint::LeftHip => "left_hip",
            Joint::RightHip => "right_hip",
            Joint::LeftKnee => "left_knee",
            Joint::RightKnee => "right_knee",
            Joint::LeftAnkle => "left_ankle",
            Joint::RightAnkle => "right_ankle",
        }
    }
}

impl FromStr for Joint {
    type Err = SkeletonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Joint::ALL
            .iter()
            .copied()
            .find(|joint| joint.as_str() == s)
            .ok_or_else(|| SkeletonError::UnknownJoint(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkeletonError {
    #[error("missing joint `{0}`")]
    MissingJoint(&'static str),
    #[error("unknown joint `{0}`")]
    UnknownJoint(String),
}

/// 归一化图像坐标点
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn midpoint(&self, other: &Point2) -> Point2 {
        Point2::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn lerp(&self, target: &Point2, alpha: f64) -> Point2 {
        Point2::new(
            self.x + (target.x - self.x) * alpha,
            self.y + (target.y - self.y) * alpha,
        )
    }
}

/// 世界坐标点（米）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn midpoint(&self, other: &Point3) -> Point3 {
        Point3::new(
            (self.x + other.x) / 2.0,
            (self.y + other.y) / 2.0,
            (self.z + other.z) / 2.0,
        )
    }

    pub fn lerp(&self, target: &Point3, alpha: f64) -> Point3 {
        Point3::new(
            self.x + (target.x - self.x) * alpha,
            self.y + (target.y - self.y) * alpha,
            self.z + (target.z - self.z) * alpha,
        )
    }
}

/// 固定关节集合，按 [`Joint`] 索引
///
/// 序列化为 `{ "left_hip": {...}, ... }` 形式的映射；反序列化时
/// 缺少任一关节即整帧拒绝，不做部分处理。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Skeleton<P> {
    points: [P; JOINT_COUNT],
}

impl<P: Copy> Skeleton<P> {
    pub fn new(points: [P; JOINT_COUNT]) -> Self {
        Self { points }
    }

    pub fn from_fn(mut f: impl FnMut(Joint) -> P) -> Self {
        Self {
            points: Joint::ALL.map(|joint| f(joint)),
        }
    }

    pub fn set(&mut self, joint: Joint, point: P) {
        self.points[joint.index()] = point;
    }

    pub fn zip_with(&self, other: &Self, mut f: impl FnMut(P, P) -> P) -> Self {
        Self::from_fn(|joint| f(self[joint], other[joint]))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Joint, P)> + '_ {
        Joint::ALL.iter().map(move |&joint| (joint, self[joint]))
    }

    pub fn from_map(map: &BTreeMap<String, P>) -> Result<Self, SkeletonError> {
        for key in map.keys() {
            key.parse::<Joint>()?;
        }
        if let Some(missing) = Joint::ALL
            .iter()
            .find(|joint| !map.contains_key(joint.as_str()))
        {
            return Err(SkeletonError::MissingJoint(missing.as_str()));
        }
        Ok(Self::from_fn(|joint| map[joint.as_str()]))
    }
}

impl<P> Index<Joint> for Skeleton<P> {
    type Output = P;

    fn index(&self, joint: Joint) -> &P {
        &self.points[joint.index()]
    }
}

impl<P: Serialize> Serialize for Skeleton<P> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(JOINT_COUNT))?;
        for joint in Joint::ALL {
            map.serialize_entry(joint.as_str(), &self[joint])?;
        }
        map.end()
    }
}

impl<'de, P: Deserialize<'de> + Copy> Deserialize<'de> for Skeleton<P> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = BTreeMap::<String, P>::deserialize(deserializer)?;
        Skeleton::from_map(&map).map_err(serde::de::Error::custom)
    }
}

pub type ImageSkeleton = Skeleton<Point2>;
pub type WorldSkeleton = Skeleton<Point3>;

/// 单帧姿态：仅 2D，或 2D + 3D 世界坐标
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseKeypoints {
    Image(ImageSkeleton),
    ImageWithWorld {
        image: ImageSkeleton,
        world: WorldSkeleton,
    },
}

impl PoseKeypoints {
    pub fn from_parts(image: ImageSkeleton, world: Option<WorldSkeleton>) -> Self {
        match world {
            Some(world) => PoseKeypoints::ImageWithWorld { image, world },
            None => PoseKeypoints::Image(image),
        }
    }

    pub fn image(&self) -> &ImageSkeleton {
        match self {
            PoseKeypoints::Image(image) => image,
            PoseKeypoints::ImageWithWorld { image, .. } => image,
        }
    }

    pub fn world(&self) -> Option<&WorldSkeleton> {
        match self {
            PoseKeypoints::Image(_) => None,
            PoseKeypoints::ImageWithWorld { world, .. } => Some(world),
        }
    }

    pub fn joint(&self, joint: Joint) -> Point2 {
        self.image()[joint]
    }

    pub fn mid(&self, left: Joint, right: Joint) -> Point2 {
        self.joint(left).midpoint(&self.joint(right))
    }
}

/// 上游检测器输出的一帧
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    pub pose: PoseKeypoints,
    pub confidence: f64,
}

impl FrameInput {
    pub fn new(pose: PoseKeypoints, confidence: f64) -> Self {
        Self {
            pose,
            confidence: if confidence.is_finite() {
                confidence.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }

    pub fn planar(image: ImageSkeleton, confidence: f64) -> Self {
        Self::new(PoseKeypoints::Image(image), confidence)
    }

    pub fn with_world(image: ImageSkeleton, world: WorldSkeleton, confidence: f64) -> Self {
        Self::new(PoseKeypoints::ImageWithWorld { image, world }, confidence)
    }
}

/// 平滑后的帧状态
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmoothedFrame {
    pub pose: PoseKeypoints,
    pub confidence: f64,
    pub hip_mid_y: f64,
    /// 从 1 开始单调递增，仅在显式 reset 时归位
    pub frame_index: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Low,
    Moderate,
    High,
}

impl Severity {
    pub fn status(self) -> CheckStatus {
        match self {
            Severity::Low => CheckStatus::Ok,
            Severity::Moderate => CheckStatus::Watch,
            Severity::High => CheckStatus::Flag,
        }
    }

    /// 会话分析中使用的严重度权重
    pub fn weight(self) -> u8 {
        match self {
            Severity::Low => 0,
            Severity::Moderate => 1,
            Severity::High => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    #[default]
    Ok,
    Watch,
    Flag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckName {
    Depth,
    KneeTracking,
    TorsoAngle,
    HeelLift,
    Asymmetry,
}

impl CheckName {
    pub const ALL: [CheckName; 5] = [
        CheckName::Depth,
        CheckName::KneeTracking,
        CheckName::TorsoAngle,
        CheckName::HeelLift,
        CheckName::Asymmetry,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CheckName::Depth => "depth",
            CheckName::KneeTracking => "knee_tracking",
            CheckName::TorsoAngle => "torso_angle",
            CheckName::HeelLift => "heel_lift",
            CheckName::Asymmetry => "asymmetry",
        }
    }

    /// 展示用标签，如 "Knee Tracking"
    pub fn label(self) -> &'static str {
        match self {
            CheckName::Depth => "Depth",
            CheckName::KneeTracking => "Knee Tracking",
            CheckName::TorsoAngle => "Torso Angle",
            CheckName::HeelLift => "Heel Lift",
            CheckName::Asymmetry => "Asymmetry",
        }
    }
}

impl fmt::Display for CheckName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CheckName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("unknown check `{s}`"))
    }
}

/// 单项动作检查结果，status 始终由 severity 推导
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CheckResult {
    pub severity: Severity,
    pub status: CheckStatus,
    #[serde(default)]
    pub evidence: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cue: Option<String>,
}

impl CheckResult {
    pub fn new(severity: Severity, evidence: BTreeMap<String, f64>, cue: Option<String>) -> Self {
        Self {
            severity,
            status: severity.status(),
            evidence,
            cue,
        }
    }

    /// 数据不足时的中性结果
    pub fn neutral() -> Self {
        Self::new(Severity::Low, BTreeMap::new(), None)
    }
}

/// 固定五项检查，字段齐全保证下游序列化无需处理缺项
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormChecks {
    pub depth: CheckResult,
    pub knee_tracking: CheckResult,
    pub torso_angle: CheckResult,
    pub heel_lift: CheckResult,
    pub asymmetry: CheckResult,
}

impl FormChecks {
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn get(&self, name: CheckName) -> &CheckResult {
        match name {
            CheckName::Depth => &self.depth,
            CheckName::KneeTracking => &self.knee_tracking,
            CheckName::TorsoAngle => &self.torso_angle,
            CheckName::HeelLift => &self.heel_lift,
            CheckName::Asymmetry => &self.asymmetry,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (CheckName, &CheckResult)> + '_ {
        CheckName::ALL.iter().map(move |&name| (name, self.get(name)))
    }

    pub fn worst(&self) -> Severity {
        self.iter()
            .map(|(_, result)| result.severity)
            .max()
            .unwrap_or_default()
    }
}

/// 分段器输出的一次完整动作窗口
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepWindow {
    pub start_frame: u64,
    pub bottom_frame: u64,
    pub end_frame: u64,
    pub start_height: f64,
    pub bottom_height: f64,
    pub end_height: f64,
    pub max_flexion: f64,
    pub avg_confidence: f64,
}

impl RepWindow {
    /// 倒序窗口视为 0 帧
    pub fn duration_frames(&self) -> u64 {
        self.end_frame.saturating_sub(self.start_frame)
    }

    pub fn vertical_drop(&self) -> f64 {
        self.bottom_height - self.start_height
    }

    pub fn vertical_rise(&self) -> f64 {
        self.bottom_height - self.end_height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceWarning {
    /// 整个动作的平均置信度偏低
    LowAverage,
    /// 动作中存在置信度极低的帧
    LowFrames,
}

impl ConfidenceWarning {
    pub fn message(self) -> &'static str {
        match self {
            ConfidenceWarning::LowAverage => {
                "Tracking confidence was low. Keep feet and knees visible in frame."
            }
            ConfidenceWarning::LowFrames => "Tracking dropped out during part of this rep.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfidenceSummary {
    pub pose_avg: f64,
    #[serde(default)]
    pub warnings: Vec<ConfidenceWarning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepScores {
    pub duration_secs: f64,
    pub vertical_drop: f64,
    pub vertical_rise: f64,
    pub max_flexion_deg: f64,
}

/// 一次已完成动作的汇总，创建后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepSummary {
    pub rep_index: u32,
    pub start_frame: u64,
    pub bottom_frame: u64,
    pub end_frame: u64,
    pub rep_confidence: f64,
    pub confidence: ConfidenceSummary,
    pub checks: FormChecks,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<RepScores>,
}

/// 每帧处理结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameOutcome {
    pub frame: SmoothedFrame,
    pub live_checks: FormChecks,
    pub rep: Option<RepSummary>,
}
