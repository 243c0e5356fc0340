//! 动作类型策略
//!
//! 深蹲与俯卧撑共用同一条 平滑 → 分段 → 评分 流水线，
//! 只替换竖直信号、屈曲角和五项检查的几何含义。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::motion::config::CheckThresholds;
use crate::motion::geometry::joint_angle;
use crate::motion::scoring::{pushup, squat};
use crate::motion::types::{CheckName, FormChecks, Joint, Severity, SmoothedFrame};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    #[default]
    Squat,
    PushUp,
}

impl ExerciseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ExerciseKind::Squat => "squat",
            ExerciseKind::PushUp => "push_up",
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "squat" => Ok(ExerciseKind::Squat),
            "pushup" | "push_up" | "push-up" => Ok(ExerciseKind::PushUp),
            other => Err(format!("unknown exercise `{other}`")),
        }
    }
}

/// 动作类型策略对象
pub trait Exercise: Send + Sync {
    fn kind(&self) -> ExerciseKind;

    /// 驱动分段状态机的竖直信号，数值增大表示身体向"下"
    fn vertical_signal(&self, frame: &SmoothedFrame) -> f64;

    /// 屈曲角（度），0 为完全伸直
    fn flexion_angle(&self, frame: &SmoothedFrame) -> f64;

    /// 计算五项检查；调用方保证窗口至少 3 帧且 `reference` 在窗口内
    fn compute_checks(
        &self,
        window: &[SmoothedFrame],
        reference: usize,
        top: f64,
        bottom: f64,
        thresholds: &CheckThresholds,
    ) -> FormChecks;

    fn cue(&self, check: CheckName, severity: Severity) -> &'static str;
}

pub struct Squat;

pub struct PushUp;

impl Exercise for Squat {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Squat
    }

    fn vertical_signal(&self, frame: &SmoothedFrame) -> f64 {
        frame.hip_mid_y
    }

    fn flexion_angle(&self, frame: &SmoothedFrame) -> f64 {
        let left = joint_angle(&frame.pose, Joint::LeftHip, Joint::LeftKnee, Joint::LeftAnkle);
        let right = joint_angle(&frame.pose, Joint::RightHip, Joint::RightKnee, Joint::RightAnkle);
        180.0 - (left + right) / 2.0
    }

    fn compute_checks(
        &self,
        window: &[SmoothedFrame],
        reference: usize,
        top: f64,
        bottom: f64,
        thresholds: &CheckThresholds,
    ) -> FormChecks {
        squat::compute(window, reference, top, bottom, thresholds)
    }

    fn cue(&self, check: CheckName, severity: Severity) -> &'static str {
        squat::cue(check, severity)
    }
}

impl Exercise for PushUp {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::PushUp
    }

    fn vertical_signal(&self, frame: &SmoothedFrame) -> f64 {
        frame.pose.mid(Joint::LeftShoulder, Joint::RightShoulder).y
    }

    fn flexion_angle(&self, frame: &SmoothedFrame) -> f64 {
        let left = joint_angle(
            &frame.pose,
            Joint::LeftShoulder,
            Joint::LeftElbow,
            Joint::LeftWrist,
        );
        let right = joint_angle(
            &frame.pose,
            Joint::RightShoulder,
            Joint::RightElbow,
            Joint::RightWrist,
        );
        180.0 - (left + right) / 2.0
    }

    fn compute_checks(
        &self,
        window: &[SmoothedFrame],
        reference: usize,
        top: f64,
        bottom: f64,
        thresholds: &CheckThresholds,
    ) -> FormChecks {
        pushup::compute(window, reference, top, bottom, thresholds)
    }

    fn cue(&self, check: CheckName, severity: Severity) -> &'static str {
        pushup::cue(check, severity)
    }
}

static SQUAT: Squat = Squat;
static PUSH_UP: PushUp = PushUp;

pub fn profile(kind: ExerciseKind) -> &'static dyn Exercise {
    match kind {
        ExerciseKind::Squat => &SQUAT,
        ExerciseKind::PushUp => &PUSH_UP,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exercise_names_parse() {
        assert_eq!("squat".parse::<ExerciseKind>(), Ok(ExerciseKind::Squat));
        for name in ["pushup", "push_up", "Push-Up"] {
            assert_eq!(name.parse::<ExerciseKind>(), Ok(ExerciseKind::PushUp));
        }
        assert!("lunge".parse::<ExerciseKind>().is_err());
    }

    #[test]
    fn profile_matches_kind() {
        assert_eq!(profile(ExerciseKind::Squat).kind(), ExerciseKind::Squat);
        assert_eq!(profile(ExerciseKind::PushUp).kind(), ExerciseKind::PushUp);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_value(ExerciseKind::PushUp).expect("serialize kind");
        assert_eq!(json, "push_up");
    }
}
