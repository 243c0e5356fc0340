//! 运动分析引擎
//!
//! 每帧：平滑 → 入缓冲（超出容量淘汰最旧帧）→ 实时评分 → 分段；
//! 分段器给出完整窗口时按 frame_index 从缓冲中切片并做整次动作评分。

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::motion::config::MotionConfig;
use crate::motion::exercise::{profile, Exercise, ExerciseKind};
use crate::motion::geometry::{mean, round_to};
use crate::motion::monitoring;
use crate::motion::scoring::{self, MIN_WINDOW_FRAMES};
use crate::motion::segmenter::{PhaseSegmenter, RepPhase, Segmenter};
use crate::motion::smoother::PoseSmoother;
use crate::motion::types::{
    ConfidenceSummary, ConfidenceWarning, FrameInput, FrameOutcome, RepScores, RepSummary,
    RepWindow, SmoothedFrame,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    pub frames_processed: u64,
    pub reps_accepted: u64,
    pub reps_dropped: u64,
}

pub struct MotionEngine {
    config: MotionConfig,
    exercise: &'static dyn Exercise,
    smoother: PoseSmoother,
    segmenter: Box<dyn Segmenter>,
    buffer: VecDeque<SmoothedFrame>,
    rep_count: u32,
    stats: EngineStats,
}

impl MotionEngine {
    pub fn new(config: MotionConfig) -> Self {
        let exercise = profile(config.exercise);
        let segmenter = Box::new(PhaseSegmenter::new(config.segmenter.clone(), exercise));
        Self::with_segmenter(config, segmenter)
    }

    /// 使用自定义分段策略构造
    pub fn with_segmenter(config: MotionConfig, segmenter: Box<dyn Segmenter>) -> Self {
        let exercise = profile(config.exercise);
        Self {
            smoother: PoseSmoother::from_config(&config.smoothing),
            buffer: VecDeque::with_capacity(config.buffer.capacity + 1),
            exercise,
            segmenter,
            config,
            rep_count: 0,
            stats: EngineStats::default(),
        }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn exercise(&self) -> ExerciseKind {
        self.exercise.kind()
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn phase(&self) -> RepPhase {
        self.segmenter.phase()
    }

    pub fn buffered_frames(&self) -> usize {
        self.buffer.len()
    }

    pub fn process_frame(&mut self, input: &FrameInput) -> FrameOutcome {
        let frame = self.smoother.smooth(input);
        self.stats.frames_processed += 1;

        self.buffer.push_back(frame);
        while self.buffer.len() > self.config.buffer.capacity {
            self.buffer.pop_front();
        }

        let live_start = self
            .buffer
            .len()
            .saturating_sub(self.config.buffer.live_window);
        let live: Vec<SmoothedFrame> = self.buffer.range(live_start..).copied().collect();
        let live_checks = scoring::live_checks(self.exercise, &live, &self.config.checks);

        let rep = self
            .segmenter
            .update(&frame)
            .and_then(|window| self.summarize(&window));

        FrameOutcome {
            frame,
            live_checks,
            rep,
        }
    }

    /// 清空缓冲、分段状态与计数，开始新的会话
    pub fn reset(&mut self) {
        self.smoother.reset();
        self.segmenter.reset();
        self.buffer.clear();
        self.rep_count = 0;
        self.stats = EngineStats::default();
        tracing::debug!(exercise = %self.exercise.kind(), "motion engine reset");
    }

    fn summarize(&mut self, window: &RepWindow) -> Option<RepSummary> {
        let slice: Vec<SmoothedFrame> = self
            .buffer
            .iter()
            .filter(|f| f.frame_index >= window.start_frame && f.frame_index <= window.end_frame)
            .copied()
            .collect();
        // 倒序窗口（自定义分段器）与被淘汰的窗口一样丢弃
        let expected = window
            .end_frame
            .checked_sub(window.start_frame)
            .map(|span| span as usize + 1);
        let bottom = slice
            .iter()
            .position(|f| f.frame_index == window.bottom_frame);

        let bottom = match (bottom, expected) {
            (Some(idx), Some(expected))
                if slice.len() >= expected && slice.len() >= MIN_WINDOW_FRAMES =>
            {
                idx
            }
            _ => {
                self.stats.reps_dropped += 1;
                tracing::warn!(
                    start_frame = window.start_frame,
                    bottom_frame = window.bottom_frame,
                    end_frame = window.end_frame,
                    recovered = slice.len(),
                    expected = ?expected,
                    "Rep window not fully buffered or degenerate, dropping rep"
                );
                return None;
            }
        };

        let reference_len = self.config.buffer.top_reference_frames.min(slice.len());
        let top_values: Vec<f64> = slice[..reference_len]
            .iter()
            .map(|f| self.exercise.vertical_signal(f))
            .collect();
        let top = mean(&top_values);
        let bottom_value = self.exercise.vertical_signal(&slice[bottom]);

        let checks = scoring::compute_checks(
            self.exercise,
            &slice,
            bottom,
            top,
            bottom_value,
            &self.config.checks,
        );

        let confidences: Vec<f64> = slice.iter().map(|f| f.confidence).collect();
        let pose_avg = mean(&confidences);
        let mut warnings = Vec::new();
        if pose_avg < self.config.confidence.low_average {
            warnings.push(ConfidenceWarning::LowAverage);
        }
        if confidences
            .iter()
            .any(|&c| c < self.config.confidence.low_frame)
        {
            warnings.push(ConfidenceWarning::LowFrames);
        }

        let scores = RepScores {
            duration_secs: round_to(
                window.duration_frames() as f64 / self.config.nominal_fps,
                2,
            ),
            vertical_drop: round_to(window.vertical_drop(), 3),
            vertical_rise: round_to(window.vertical_rise(), 3),
            max_flexion_deg: round_to(window.max_flexion, 1),
        };

        let summary = RepSummary {
            rep_index: self.rep_count,
            start_frame: window.start_frame,
            bottom_frame: window.bottom_frame,
            end_frame: window.end_frame,
            rep_confidence: round_to(window.avg_confidence.clamp(0.0, 1.0), 3),
            confidence: ConfidenceSummary {
                pose_avg: round_to(pose_avg, 3),
                warnings,
            },
            checks,
            scores: Some(scores),
        };

        for violation in monitoring::check_summary(&summary) {
            tracing::warn!(
                rep_index = summary.rep_index,
                field = %violation.field,
                value = violation.value,
                expected = %violation.expected_range,
                "Rep summary invariant violated"
            );
        }

        self.rep_count += 1;
        self.stats.reps_accepted += 1;
        tracing::info!(
            exercise = %self.exercise.kind(),
            rep_index = summary.rep_index,
            start_frame = summary.start_frame,
            bottom_frame = summary.bottom_frame,
            end_frame = summary.end_frame,
            worst = summary.checks.worst().as_str(),
            "Rep completed"
        );

        Some(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::types::{FormChecks, Joint, Point2, Skeleton};

    const SEGMENT: f64 = 0.25;

    /// 正面视角深蹲姿态，`depth` ∈ [0,1]，膝角从 180° 线性减到 90°
    fn squat_pose(depth: f64) -> Skeleton<Point2> {
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

    /// 站立 15 帧、下蹲 20 帧、停留 8 帧、起身 20 帧为一次
    fn squat_set(reps: usize, confidence: f64) -> Vec<FrameInput> {
        let mut depths = Vec::new();
        for _ in 0..reps {
            depths.extend(std::iter::repeat(0.0).take(15));
            depths.extend((1..=20).map(|i| i as f64 / 20.0));
            depths.extend(std::iter::repeat(1.0).take(8));
            depths.extend((1..=20).map(|i| 1.0 - i as f64 / 20.0));
        }
        depths.extend(std::iter::repeat(0.0).take(20));
        depths
            .into_iter()
            .map(|d| FrameInput::planar(squat_pose(d), confidence))
            .collect()
    }

    fn run(engine: &mut MotionEngine, frames: &[FrameInput]) -> Vec<RepSummary> {
        frames
            .iter()
            .filter_map(|f| engine.process_frame(f).rep)
            .collect()
    }

    #[test]
    fn clean_squats_are_counted_and_scored() {
        let mut engine = MotionEngine::new(MotionConfig::for_exercise(ExerciseKind::Squat));
        let reps = run(&mut engine, &squat_set(3, 0.9));

        assert_eq!(reps.len(), 3);
        for (i, rep) in reps.iter().enumerate() {
            assert_eq!(rep.rep_index, i as u32);
            assert!(rep.start_frame <= rep.bottom_frame && rep.bottom_frame <= rep.end_frame);
            assert_eq!(rep.checks.depth.severity, crate::motion::types::Severity::Low);
            assert_eq!(rep.checks.knee_tracking.severity, crate::motion::types::Severity::Low);
            assert!(rep.confidence.warnings.is_empty());
            assert!(rep.scores.is_some());
        }
        assert_eq!(engine.rep_count(), 3);
        let stats = engine.stats();
        assert_eq!(stats.reps_accepted, 3);
        assert_eq!(stats.reps_dropped, 0);
        assert_eq!(stats.frames_processed, squat_set(3, 0.9).len() as u64);
    }

    #[test]
    fn evicted_window_drops_rep() {
        let mut config = MotionConfig::for_exercise(ExerciseKind::Squat);
        config.buffer.capacity = 20;
        let mut engine = MotionEngine::new(config);

        let reps = run(&mut engine, &squat_set(1, 0.9));
        assert!(reps.is_empty());
        assert_eq!(engine.rep_count(), 0);
        assert_eq!(engine.stats().reps_dropped, 1);
        assert_eq!(engine.buffered_frames(), 20);
    }

    #[test]
    fn live_checks_are_neutral_until_three_frames() {
        let mut engine = MotionEngine::new(MotionConfig::default());
        let frames = squat_set(1, 0.9);
        assert_eq!(engine.process_frame(&frames[0]).live_checks, FormChecks::neutral());
        assert_eq!(engine.process_frame(&frames[1]).live_checks, FormChecks::neutral());
        let third = engine.process_frame(&frames[2]).live_checks;
        assert!(!third.depth.evidence.is_empty());
    }

    #[test]
    fn low_confidence_reps_carry_warnings() {
        let mut engine = MotionEngine::new(MotionConfig::default());
        let reps = run(&mut engine, &squat_set(1, 0.2));
        assert_eq!(reps.len(), 1);
        assert!(reps[0]
            .confidence
            .warnings
            .contains(&ConfidenceWarning::LowAverage));
        assert!(reps[0]
            .confidence
            .warnings
            .contains(&ConfidenceWarning::LowFrames));
    }

    #[test]
    fn reset_starts_a_fresh_session() {
        let mut engine = MotionEngine::new(MotionConfig::default());
        let frames = squat_set(1, 0.9);
        assert_eq!(run(&mut engine, &frames).len(), 1);

        engine.reset();
        assert_eq!(engine.rep_count(), 0);
        assert_eq!(engine.buffered_frames(), 0);
        assert_eq!(engine.phase(), RepPhase::Waiting);
        assert_eq!(engine.process_frame(&frames[0]).frame.frame_index, 1);

        engine.reset();
        let again = run(&mut engine, &frames);
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].rep_index, 0);
    }

    /// 在第 10 帧给出 end < start 的窗口
    struct ReversedSegmenter;

    impl Segmenter for ReversedSegmenter {
        fn update(&mut self, frame: &SmoothedFrame) -> Option<RepWindow> {
            (frame.frame_index == 10).then_some(RepWindow {
                start_frame: 8,
                bottom_frame: 6,
                end_frame: 5,
                start_height: 0.4,
                bottom_height: 0.55,
                end_height: 0.4,
                max_flexion: 90.0,
                avg_confidence: 0.9,
            })
        }

        fn phase(&self) -> RepPhase {
            RepPhase::Waiting
        }

        fn reset(&mut self) {}
    }

    #[test]
    fn reversed_window_from_custom_segmenter_is_dropped() {
        let mut engine =
            MotionEngine::with_segmenter(MotionConfig::default(), Box::new(ReversedSegmenter));
        let reps = run(&mut engine, &squat_set(1, 0.9)[..20]);
        assert!(reps.is_empty());
        assert_eq!(engine.rep_count(), 0);
        assert_eq!(engine.stats().reps_dropped, 1);
        assert_eq!(engine.stats().frames_processed, 20);
    }
}
