//! 关节几何计算
//!
//! 三点夹角：B→A 与 B→C 两向量归一化点积取 arccos。
//! 当帧带有世界坐标时优先使用 3D 夹角，不受相机视角透视影响。

use crate::motion::types::{Joint, Point2, Point3, PoseKeypoints, SmoothedFrame};

const MIN_VECTOR_LEN: f64 = 1e-9;
const MIN_BODY_SCALE: f64 = 1e-3;

/// 2D 三点夹角（度），顶点为 `b`
pub fn angle_2d(a: Point2, b: Point2, c: Point2) -> f64 {
    let (v1x, v1y) = (a.x - b.x, a.y - b.y);
    let (v2x, v2y) = (c.x - b.x, c.y - b.y);
    angle_between(v1x * v2x + v1y * v2y, v1x.hypot(v1y), v2x.hypot(v2y))
}

/// 3D 三点夹角（度），顶点为 `b`
pub fn angle_3d(a: Point3, b: Point3, c: Point3) -> f64 {
    let v1 = [a.x - b.x, a.y - b.y, a.z - b.z];
    let v2 = [c.x - b.x, c.y - b.y, c.z - b.z];
    let dot = v1[0] * v2[0] + v1[1] * v2[1] + v1[2] * v2[2];
    angle_between(dot, norm3(v1), norm3(v2))
}

fn norm3(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

fn angle_between(dot: f64, len1: f64, len2: f64) -> f64 {
    // 退化向量视为伸直
    if len1 < MIN_VECTOR_LEN || len2 < MIN_VECTOR_LEN {
        return 180.0;
    }
    (dot / (len1 * len2)).clamp(-1.0, 1.0).acos().to_degrees()
}

/// 关节夹角，按姿态变体选择 2D 或 3D 计算
pub fn joint_angle(pose: &PoseKeypoints, a: Joint, b: Joint, c: Joint) -> f64 {
    match pose {
        PoseKeypoints::Image(image) => angle_2d(image[a], image[b], image[c]),
        PoseKeypoints::ImageWithWorld { world, .. } => angle_3d(world[a], world[b], world[c]),
    }
}

/// 以左右关节对中点为端点的三点夹角（度）
pub fn pair_angle(
    pose: &PoseKeypoints,
    a: (Joint, Joint),
    b: (Joint, Joint),
    c: (Joint, Joint),
) -> f64 {
    match pose {
        PoseKeypoints::Image(image) => angle_2d(
            image[a.0].midpoint(&image[a.1]),
            image[b.0].midpoint(&image[b.1]),
            image[c.0].midpoint(&image[c.1]),
        ),
        PoseKeypoints::ImageWithWorld { world, .. } => angle_3d(
            world[a.0].midpoint(&world[a.1]),
            world[b.0].midpoint(&world[b.1]),
            world[c.0].midpoint(&world[c.1]),
        ),
    }
}

/// 上段中点相对下段中点连线与竖直方向的夹角（度）
pub fn tilt_from_vertical(
    pose: &PoseKeypoints,
    upper: (Joint, Joint),
    lower: (Joint, Joint),
) -> f64 {
    match pose {
        PoseKeypoints::Image(image) => {
            let top = image[upper.0].midpoint(&image[upper.1]);
            let base = image[lower.0].midpoint(&image[lower.1]);
            let (dx, dy) = (top.x - base.x, top.y - base.y);
            if dx.hypot(dy) < MIN_VECTOR_LEN {
                return 0.0;
            }
            // y 轴向下，竖直向上为 (0, -1)
            dx.abs().atan2(-dy).to_degrees()
        }
        PoseKeypoints::ImageWithWorld { world, .. } => {
            let top = world[upper.0].midpoint(&world[upper.1]);
            let base = world[lower.0].midpoint(&world[lower.1]);
            let v = [top.x - base.x, top.y - base.y, top.z - base.z];
            let len = norm3(v);
            if len < MIN_VECTOR_LEN {
                return 0.0;
            }
            (-v[1] / len).clamp(-1.0, 1.0).acos().to_degrees()
        }
    }
}

/// 窗口内估计的身体尺度：肩中点到踝中点的最大图像距离
///
/// 用于把关节位移归一化，使评分与人距相机远近无关。
pub fn body_scale(window: &[SmoothedFrame]) -> f64 {
    window
        .iter()
        .map(|frame| {
            let shoulders = frame.pose.mid(Joint::LeftShoulder, Joint::RightShoulder);
            let ankles = frame.pose.mid(Joint::LeftAnkle, Joint::RightAnkle);
            shoulders.distance(&ankles)
        })
        .fold(0.0_f64, f64::max)
        .max(MIN_BODY_SCALE)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// 总体标准差
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}
