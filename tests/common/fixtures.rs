use rep_motion::motion::types::{FrameInput, ImageSkeleton, Joint, Point2, Skeleton};
use rep_motion::motion::ExerciseKind;

const SEGMENT: f64 = 0.25;

/// 正面视角深蹲姿态，`depth` ∈ [0,1] 时膝角从 180° 线性减到 90°
pub fn squat_pose(depth: f64) -> ImageSkeleton {
    let knee_angle = (180.0 - 90.0 * depth).to_radians();
    let span = 2.0 * SEGMENT * (knee_angle / 2.0).sin();
    let knee_out = SEGMENT * (knee_angle / 2.0).cos();
    let hip_y = 0.9 - span;
    let lean = (10.0 + 25.0 * depth).to_radians();
    let shoulder_x = 0.5 + 0.3 * lean.sin();
    let shoulder_y = hip_y - 0.3 * lean.cos();

    Skeleton::from_fn(|joint| match joint {
        Joint::LeftShoulder => Point2::new(shoulder_x - 0.06, shoulder_y),
        Joint::RightShoulder => Point2::new(shoulder_x + 0.06, shoulder_y),
        Joint::LeftElbow => Point2::new(shoulder_x - 0.08, shoulder_y + 0.12),
        Joint::RightElbow => Point2::new(shoulder_x + 0.08, shoulder_y + 0.12),
        Joint::LeftWrist => Point2::new(shoulder_x - 0.08, shoulder_y + 0.22),
        Joint::RightWrist => Point2::new(shoulder_x + 0.08, shoulder_y + 0.22),
        Joint::LeftHip => Point2::new(0.45, hip_y),
        Joint::RightHip => Point2::new(0.55, hip_y),
        Joint::LeftKnee => Point2::new(0.45 - knee_out, 0.9 - span / 2.0),
        Joint::RightKnee => Point2::new(0.55 + knee_out, 0.9 - span / 2.0),
        Joint::LeftAnkle => Point2::new(0.45, 0.9),
        Joint::RightAnkle => Point2::new(0.55, 0.9),
    })
}

/// 每次：起始姿态 15 帧、下蹲 20 帧、停留 8 帧、起身 20 帧；最后站立 20 帧
pub fn squat_depths(reps: usize) -> Vec<f64> {
    let mut depths = Vec::new();
    for _ in 0..reps {
        depths.extend(std::iter::repeat(0.0).take(15));
        depths.extend((1..=20).map(|i| i as f64 / 20.0));
        depths.extend(std::iter::repeat(1.0).take(8));
        depths.extend((1..=20).map(|i| 1.0 - i as f64 / 20.0));
    }
    depths.extend(std::iter::repeat(0.0).take(20));
    depths
}

pub fn squat_set(reps: usize, confidence: f64) -> Vec<FrameInput> {
    squat_depths(reps)
        .into_iter()
        .map(|d| FrameInput::planar(squat_pose(d), confidence))
        .collect()
}

const FOREARM: f64 = 0.14;
const UPPER_ARM: f64 = 0.14;
const HANDS: Point2 = Point2 { x: 0.36, y: 0.80 };
const FEET: Point2 = Point2 { x: 0.85, y: 0.80 };

/// 侧面视角俯卧撑，`depth` ∈ [0,1] 时肘角从 180° 线性减到 90°
///
/// 前臂竖直，身体保持肩-髋-踝一条直线。
pub fn push_up_pose(depth: f64) -> ImageSkeleton {
    let bend = (90.0 * depth).to_radians();
    let elbow = Point2::new(HANDS.x, HANDS.y - FOREARM);
    let shoulder = Point2::new(elbow.x - UPPER_ARM * bend.sin(), elbow.y - UPPER_ARM * bend.cos());
    let hip = shoulder.lerp(&FEET, 0.5);
    let knee = shoulder.lerp(&FEET, 0.75);

    Skeleton::from_fn(|joint| match joint {
        Joint::LeftShoulder | Joint::RightShoulder => shoulder,
        Joint::LeftElbow | Joint::RightElbow => elbow,
        Joint::LeftWrist | Joint::RightWrist => HANDS,
        Joint::LeftHip | Joint::RightHip => hip,
        Joint::LeftKnee | Joint::RightKnee => knee,
        Joint::LeftAnkle | Joint::RightAnkle => FEET,
    })
}

pub fn push_up_set(reps: usize, confidence: f64) -> Vec<FrameInput> {
    squat_depths(reps)
        .into_iter()
        .map(|d| FrameInput::planar(push_up_pose(d), confidence))
        .collect()
}

pub fn pose_for(exercise: ExerciseKind, depth: f64) -> ImageSkeleton {
    match exercise {
        ExerciseKind::Squat => squat_pose(depth),
        ExerciseKind::PushUp => push_up_pose(depth),
    }
}
