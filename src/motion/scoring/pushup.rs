//! 俯卧撑五项检查（沿用深蹲的检查名，含义重映射）
//!
//! - depth: 最低点平均肘角（度）
//! - knee_tracking: 腕与肘的水平偏移 / 身体尺度（手腕应在肘正下方）
//! - torso_angle: 肩-髋-踝连线偏离直线的角度（度）
//! - heel_lift: 髋部相对肩踝连线的纵向波动 / 身体尺度（塌腰或撅臀）
//! - asymmetry: 最低点左右肘角差（度）

use crate::motion::config::CheckThresholds;
use crate::motion::geometry::{body_scale, joint_angle, pair_angle, round_to, std_dev};
use crate::motion::scoring::grade;
use crate::motion::types::{CheckName, FormChecks, Joint, Severity, SmoothedFrame};

const SHOULDERS: (Joint, Joint) = (Joint::LeftShoulder, Joint::RightShoulder);
const HIPS: (Joint, Joint) = (Joint::LeftHip, Joint::RightHip);
const ANKLES: (Joint, Joint) = (Joint::LeftAnkle, Joint::RightAnkle);

pub(crate) fn compute(
    window: &[SmoothedFrame],
    reference: usize,
    top: f64,
    bottom: f64,
    thresholds: &CheckThresholds,
) -> FormChecks {
    let pose = &window[reference].pose;
    let scale = body_scale(window);

    let left_elbow = joint_angle(pose, Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist);
    let right_elbow = joint_angle(
        pose,
        Joint::RightShoulder,
        Joint::RightElbow,
        Joint::RightWrist,
    );
    let elbow_angle = (left_elbow + right_elbow) / 2.0;
    let depth_ratio = (bottom - top).max(0.0) / scale;

    let wrist_offset = ((pose.joint(Joint::LeftWrist).x - pose.joint(Joint::LeftElbow).x).abs()
        + (pose.joint(Joint::RightWrist).x - pose.joint(Joint::RightElbow).x).abs())
        / 2.0
        / scale;

    let body_line = 180.0 - pair_angle(pose, SHOULDERS, HIPS, ANKLES);

    let hip_offsets: Vec<f64> = window
        .iter()
        .map(|frame| {
            let shoulders = frame.pose.mid(SHOULDERS.0, SHOULDERS.1);
            let ankles = frame.pose.mid(ANKLES.0, ANKLES.1);
            frame.pose.mid(HIPS.0, HIPS.1).y - (shoulders.y + ankles.y) / 2.0
        })
        .collect();
    let hip_variation = std_dev(&hip_offsets) / scale;

    let elbow_diff = (left_elbow - right_elbow).abs();

    FormChecks {
        depth: grade(
            CheckName::Depth,
            elbow_angle,
            thresholds.depth,
            &[
                ("elbow_angle_deg", round_to(elbow_angle, 1)),
                ("depth_ratio", round_to(depth_ratio, 3)),
            ],
            cue,
        ),
        knee_tracking: grade(
            CheckName::KneeTracking,
            wrist_offset,
            thresholds.knee_tracking,
            &[("wrist_offset", round_to(wrist_offset, 3))],
            cue,
        ),
        torso_angle: grade(
            CheckName::TorsoAngle,
            body_line,
            thresholds.torso_angle,
            &[("body_line_deg", round_to(body_line, 1))],
            cue,
        ),
        heel_lift: grade(
            CheckName::HeelLift,
            hip_variation,
            thresholds.heel_lift,
            &[("hip_offset_std", round_to(hip_variation, 3))],
            cue,
        ),
        asymmetry: grade(
            CheckName::Asymmetry,
            elbow_diff,
            thresholds.asymmetry,
            &[
                ("elbow_angle_diff_deg", round_to(elbow_diff, 1)),
                ("left_elbow_deg", round_to(left_elbow, 1)),
                ("right_elbow_deg", round_to(right_elbow, 1)),
            ],
            cue,
        ),
    }
}

pub fn cue(check: CheckName, severity: Severity) -> &'static str {
    match (check, severity) {
        (CheckName::Depth, Severity::High) => "Lower your chest further - aim for elbows at 90 degrees.",
        (CheckName::Depth, Severity::Moderate) => "Go a little deeper on each rep.",
        (CheckName::Depth, Severity::Low) => "Great range of motion!",
        (CheckName::KneeTracking, Severity::High) => {
            "Hands are far from under your elbows. Stack wrists below elbows."
        }
        (CheckName::KneeTracking, Severity::Moderate) => {
            "Slight wrist drift - keep forearms vertical."
        }
        (CheckName::KneeTracking, Severity::Low) => "Solid hand placement!",
        (CheckName::TorsoAngle, Severity::High) => {
            "Body line is breaking. Squeeze glutes and brace your core."
        }
        (CheckName::TorsoAngle, Severity::Moderate) => {
            "Keep shoulders, hips and ankles in one line."
        }
        (CheckName::TorsoAngle, Severity::Low) => "Strong plank position!",
        (CheckName::HeelLift, Severity::High) => {
            "Hips are sagging or piking during the rep. Lock your core in place."
        }
        (CheckName::HeelLift, Severity::Moderate) => "Minor hip movement. Hold your hips steady.",
        (CheckName::HeelLift, Severity::Low) => "Excellent hip stability!",
        (CheckName::Asymmetry, Severity::High) => {
            "One arm is doing most of the work. Press evenly through both hands."
        }
        (CheckName::Asymmetry, Severity::Moderate) => {
            "Slight side-to-side imbalance. Work on symmetry."
        }
        (CheckName::Asymmetry, Severity::Low) => "Perfect symmetry!",
    }
}
