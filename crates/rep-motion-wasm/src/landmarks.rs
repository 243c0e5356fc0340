//! 关键点解码
//!
//! 浏览器端姿态模型每帧输出 33 个关键点的扁平数组：
//! 图像坐标步长为 2 (x, y)，世界坐标步长为 3 (x, y, z)。
//! 这里只取分析用到的 12 个关节。

use rep_motion::constants::POSE_LANDMARK_COUNT;
use rep_motion::motion::types::{ImageSkeleton, Joint, Point2, Point3, Skeleton, WorldSkeleton};

const IMAGE_STRIDE: usize = 2;
const WORLD_STRIDE: usize = 3;

/// 关节在 33 点模型中的下标
pub fn landmark_index(joint: Joint) -> usize {
    match joint {
        Joint::LeftShoulder => 11,
        Joint::RightShoulder => 12,
        Joint::LeftElbow => 13,
        Joint::RightElbow => 14,
        Joint::LeftWrist => 15,
        Joint::RightWrist => 16,
        Joint::LeftHip => 23,
        Joint::RightHip => 24,
        Joint::LeftKnee => 25,
        Joint::RightKnee => 26,
        Joint::LeftAnkle => 27,
        Joint::RightAnkle => 28,
    }
}

fn decode<P: Copy>(
    landmarks: &[f64],
    stride: usize,
    point: impl Fn(&[f64]) -> P,
) -> Option<Skeleton<P>> {
    if landmarks.len() < POSE_LANDMARK_COUNT * stride {
        return None;
    }
    let complete = Joint::ALL.iter().all(|&joint| {
        let base = landmark_index(joint) * stride;
        landmarks[base..base + stride].iter().all(|v| v.is_finite())
    });
    if !complete {
        return None;
    }
    Some(Skeleton::from_fn(|joint| {
        let base = landmark_index(joint) * stride;
        point(&landmarks[base..base + stride])
    }))
}

/// 不完整（长度不足或含非有限值）时返回 None，整帧丢弃
pub fn decode_image(landmarks: &[f64]) -> Option<ImageSkeleton> {
    decode(landmarks, IMAGE_STRIDE, |v| Point2::new(v[0], v[1]))
}

pub fn decode_world(landmarks: &[f64]) -> Option<WorldSkeleton> {
    decode(landmarks, WORLD_STRIDE, |v| Point3::new(v[0], v[1], v[2]))
}
