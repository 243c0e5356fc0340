//! 深蹲五项检查
//!
//! - depth: 最低点平均膝角（度），越大越浅
//! - knee_tracking: 膝间距小于踝间距的内扣量 / 身体尺度
//! - torso_angle: 肩髋连线相对竖直方向的前倾角（度）
//! - heel_lift: 窗口内踝中点纵向标准差 / 身体尺度
//! - asymmetry: 最低点左右膝角差（度）

use crate::motion::config::CheckThresholds;
use crate::motion::geometry::{body_scale, joint_angle, round_to, std_dev, tilt_from_vertical};
use crate::motion::scoring::grade;
use crate::motion::types::{CheckName, FormChecks, Joint, Severity, SmoothedFrame};

pub(crate) fn compute(
    window: &[SmoothedFrame],
    reference: usize,
    top: f64,
    bottom: f64,
    thresholds: &CheckThresholds,
) -> FormChecks {
    let pose = &window[reference].pose;
    let scale = body_scale(window);

    let left_knee = joint_angle(pose, Joint::LeftHip, Joint::LeftKnee, Joint::LeftAnkle);
    let right_knee = joint_angle(pose, Joint::RightHip, Joint::RightKnee, Joint::RightAnkle);
    let knee_angle = (left_knee + right_knee) / 2.0;
    let depth_ratio = (bottom - top).max(0.0) / scale;

    let knee_width = (pose.joint(Joint::LeftKnee).x - pose.joint(Joint::RightKnee).x).abs();
    let ankle_width = (pose.joint(Joint::LeftAnkle).x - pose.joint(Joint::RightAnkle).x).abs();
    let valgus = (ankle_width - knee_width).max(0.0) / 2.0 / scale;

    let torso_lean = tilt_from_vertical(
        pose,
        (Joint::LeftShoulder, Joint::RightShoulder),
        (Joint::LeftHip, Joint::RightHip),
    );

    let ankle_heights: Vec<f64> = window
        .iter()
        .map(|frame| frame.pose.mid(Joint::LeftAnkle, Joint::RightAnkle).y)
        .collect();
    let heel_variation = std_dev(&ankle_heights) / scale;

    let knee_diff = (left_knee - right_knee).abs();

    FormChecks {
        depth: grade(
            CheckName::Depth,
            knee_angle,
            thresholds.depth,
            &[
                ("knee_angle_deg", round_to(knee_angle, 1)),
                ("depth_ratio", round_to(depth_ratio, 3)),
            ],
            cue,
        ),
        knee_tracking: grade(
            CheckName::KneeTracking,
            valgus,
            thresholds.knee_tracking,
            &[
                ("valgus_offset", round_to(valgus, 3)),
                ("knee_to_ankle_width", round_to(knee_width / ankle_width.max(1e-6), 3)),
            ],
            cue,
        ),
        torso_angle: grade(
            CheckName::TorsoAngle,
            torso_lean,
            thresholds.torso_angle,
            &[("torso_lean_deg", round_to(torso_lean, 1))],
            cue,
        ),
        heel_lift: grade(
            CheckName::HeelLift,
            heel_variation,
            thresholds.heel_lift,
            &[("ankle_y_std", round_to(heel_variation, 3))],
            cue,
        ),
        asymmetry: grade(
            CheckName::Asymmetry,
            knee_diff,
            thresholds.asymmetry,
            &[
                ("knee_angle_diff_deg", round_to(knee_diff, 1)),
                ("left_knee_deg", round_to(left_knee, 1)),
                ("right_knee_deg", round_to(right_knee, 1)),
            ],
            cue,
        ),
    }
}

pub fn cue(check: CheckName, severity: Severity) -> &'static str {
    match (check, severity) {
        (CheckName::Depth, Severity::High) => "Squat deeper - aim for hip crease below knee level.",
        (CheckName::Depth, Severity::Moderate) => {
            "Increase depth slightly for better muscle engagement."
        }
        (CheckName::Depth, Severity::Low) => "Great depth control!",
        (CheckName::KneeTracking, Severity::High) => {
            "Knees are caving inward (valgus). Push them out over your toes."
        }
        (CheckName::KneeTracking, Severity::Moderate) => {
            "Watch for slight knee inward drift - keep them stable."
        }
        (CheckName::KneeTracking, Severity::Low) => "Excellent knee tracking!",
        (CheckName::TorsoAngle, Severity::High) => {
            "Your torso is leaning too far forward. Brace your core, stay upright."
        }
        (CheckName::TorsoAngle, Severity::Moderate) => {
            "Slight forward lean detected. Keep your chest proud."
        }
        (CheckName::TorsoAngle, Severity::Low) => "Perfect torso position!",
        (CheckName::HeelLift, Severity::High) => {
            "Heels are lifting - shift weight to mid-foot. Consider heel-elevated shoes."
        }
        (CheckName::HeelLift, Severity::Moderate) => {
            "Minor heel lift visible. Focus on weight distribution."
        }
        (CheckName::HeelLift, Severity::Low) => "Excellent heel stability!",
        (CheckName::Asymmetry, Severity::High) => {
            "Major imbalance between left and right. Correct asymmetry before increasing load."
        }
        (CheckName::Asymmetry, Severity::Moderate) => {
            "Slight side-to-side imbalance. Work on symmetry."
        }
        (CheckName::Asymmetry, Severity::Low) => "Perfect symmetry!",
    }
}
