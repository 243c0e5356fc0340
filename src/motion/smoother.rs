//! 关节坐标 EMA 平滑
//!
//! `state_t = α·raw_t + (1-α)·state_{t-1}`，首帧原样输出。
//! 世界坐标间歇缺失时沿用上一次的 3D 关节集合（不做平滑）。

use crate::motion::config::SmoothingConfig;
use crate::motion::types::{FrameInput, Joint, PoseKeypoints, SmoothedFrame};

pub struct PoseSmoother {
    alpha: f64,
    prev: Option<SmoothedFrame>,
}

impl PoseSmoother {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            prev: None,
        }
    }

    pub fn from_config(config: &SmoothingConfig) -> Self {
        Self::new(config.alpha)
    }

    pub fn smooth(&mut self, input: &FrameInput) -> SmoothedFrame {
        let frame_index = self.prev.as_ref().map_or(1, |prev| prev.frame_index + 1);

        let (pose, confidence) = match &self.prev {
            None => (input.pose, input.confidence),
            Some(prev) => {
                let alpha = self.alpha;
                let image = prev
                    .pose
                    .image()
                    .zip_with(input.pose.image(), |p, raw| p.lerp(&raw, alpha));
                let world = match (prev.pose.world(), input.pose.world()) {
                    (Some(p), Some(raw)) => Some(p.zip_with(raw, |p, raw| p.lerp(&raw, alpha))),
                    (Some(p), None) => Some(*p),
                    (None, raw) => raw.copied(),
                };
                let confidence = prev.confidence + (input.confidence - prev.confidence) * alpha;
                (PoseKeypoints::from_parts(image, world), confidence)
            }
        };

        let frame = SmoothedFrame {
            pose,
            confidence,
            hip_mid_y: pose.mid(Joint::LeftHip, Joint::RightHip).y,
            frame_index,
        };
        self.prev = Some(frame);
        frame
    }

    pub fn last(&self) -> Option<&SmoothedFrame> {
        self.prev.as_ref()
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn reset(&mut self) {
        self.prev = None;
    }
}
