//! 动作分段状态机
//!
//! Waiting → Descending → Ascending → Waiting。
//! 竖直信号的滚动平均速度驱动状态切换，屈曲角只用于确认动作有效，
//! 不参与切换。无效或不完整的动作静默丢弃，不产生任何输出。

use std::collections::VecDeque;

use serde::Serialize;
use tracing::debug;

use crate::motion::config::SegmenterConfig;
use crate::motion::exercise::Exercise;
use crate::motion::types::{RepWindow, SmoothedFrame};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepPhase {
    #[default]
    Waiting,
    Descending,
    Ascending,
}

/// 分段器的统一接口，动作类型作为策略对象注入
pub trait Segmenter: Send {
    /// 每帧调用一次；仅在动作完成且通过校验的那一帧返回窗口
    fn update(&mut self, frame: &SmoothedFrame) -> Option<RepWindow>;

    fn phase(&self) -> RepPhase;

    fn reset(&mut self);
}

/// 单帧信号采样
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalSample {
    pub frame_index: u64,
    /// 竖直信号，越大越"下"
    pub height: f64,
    /// 屈曲角（度）
    pub flexion: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy)]
struct Attempt {
    start_frame: u64,
    start_height: f64,
    bottom_frame: u64,
    bottom_height: f64,
    max_flexion: f64,
    committed: bool,
    confidence_sum: f64,
    samples: u32,
    /// 连续低速帧数
    flat_frames: u64,
}

impl Attempt {
    fn absorb(&mut self, sample: &SignalSample) {
        self.max_flexion = self.max_flexion.max(sample.flexion);
        self.confidence_sum += sample.confidence;
        self.samples += 1;
    }

    fn deepen(&mut self, sample: &SignalSample) -> bool {
        if sample.height > self.bottom_height {
            self.bottom_height = sample.height;
            self.bottom_frame = sample.frame_index;
            true
        } else {
            false
        }
    }

    fn track_flat(&mut self, velocity: f64, threshold: f64) {
        if velocity.abs() <= threshold {
            self.flat_frames += 1;
        } else {
            self.flat_frames = 0;
        }
    }

    fn travel(&self) -> f64 {
        self.bottom_height - self.start_height
    }
}

/// 速度 + 屈曲角门控的分段器
pub struct PhaseSegmenter {
    config: SegmenterConfig,
    exercise: &'static dyn Exercise,
    phase: RepPhase,
    history: VecDeque<(u64, f64)>,
    attempt: Option<Attempt>,
    last_rep_end: Option<u64>,
}

impl PhaseSegmenter {
    pub fn new(config: SegmenterConfig, exercise: &'static dyn Exercise) -> Self {
        let capacity = config.velocity_window + 1;
        Self {
            config,
            exercise,
            phase: RepPhase::Waiting,
            history: VecDeque::with_capacity(capacity),
            attempt: None,
            last_rep_end: None,
        }
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    pub fn observe(&mut self, sample: SignalSample) -> Option<RepWindow> {
        self.history.push_back((sample.frame_index, sample.height));
        while self.history.len() > self.config.velocity_window + 1 {
            self.history.pop_front();
        }
        let velocity = self.velocity()?;

        match self.phase {
            RepPhase::Waiting => {
                if self.try_start(&sample, velocity) {
                    self.descend(&sample, velocity)
                } else {
                    None
                }
            }
            RepPhase::Descending | RepPhase::Ascending => {
                if let Some(attempt) = self.attempt.as_mut() {
                    attempt.absorb(&sample);
                    attempt.track_flat(velocity, self.config.velocity_threshold);
                }
                if let Some(reason) = self.stalled(&sample) {
                    self.abort(sample.frame_index, reason);
                    return None;
                }
                if self.phase == RepPhase::Descending {
                    self.descend(&sample, velocity)
                } else {
                    self.ascend(&sample)
                }
            }
        }
    }

    /// 未达到 `min_drop` 的尝试：回到起点附近或长时间停滞即放弃，
    /// 不让浅幅晃动占住状态机
    fn stalled(&self, sample: &SignalSample) -> Option<&'static str> {
        let attempt = self.attempt.as_ref()?;
        if attempt.committed {
            return None;
        }
        let rising = sample.height < attempt.bottom_height;
        if rising && sample.height <= attempt.start_height + self.config.min_rise / 2.0 {
            return Some("returned to start before committing");
        }
        if attempt.flat_frames >= self.config.settle_frames {
            return Some("stalled before committing");
        }
        None
    }

    /// 最近 N 个帧间差的平均值；历史未填满时不判定
    fn velocity(&self) -> Option<f64> {
        if self.history.len() <= self.config.velocity_window {
            return None;
        }
        let (_, first) = self.history.front()?;
        let (_, last) = self.history.back()?;
        Some((last - first) / self.config.velocity_window as f64)
    }

    fn try_start(&mut self, sample: &SignalSample, velocity: f64) -> bool {
        if let Some(last_end) = self.last_rep_end {
            if sample.frame_index.saturating_sub(last_end) < self.config.cooldown_frames {
                return false;
            }
        }
        if velocity <= self.config.velocity_threshold {
            return false;
        }

        // 起点取速度窗口内最近一次的信号最小值（身体最高点）
        let (start_frame, start_height) = self
            .history
            .iter()
            .copied()
            .fold(None, |best: Option<(u64, f64)>, (frame, height)| match best {
                Some((_, best_height)) if height > best_height => best,
                _ => Some((frame, height)),
            })
            .unwrap_or((sample.frame_index, sample.height));

        debug!(
            frame = sample.frame_index,
            start_frame,
            start_height,
            velocity,
            "rep attempt started"
        );
        self.attempt = Some(Attempt {
            start_frame,
            start_height,
            bottom_frame: sample.frame_index,
            bottom_height: sample.height,
            max_flexion: sample.flexion,
            committed: false,
            confidence_sum: sample.confidence,
            samples: 1,
            flat_frames: 0,
        });
        self.phase = RepPhase::Descending;
        true
    }

    fn descend(&mut self, sample: &SignalSample, velocity: f64) -> Option<RepWindow> {
        let config = &self.config;
        let Some(attempt) = self.attempt.as_mut() else {
            self.phase = RepPhase::Waiting;
            return None;
        };

        if sample.frame_index.saturating_sub(attempt.start_frame) > config.max_rep_frames {
            self.abort(sample.frame_index, "timed out while descending");
            return None;
        }

        attempt.deepen(sample);
        if !attempt.committed && attempt.travel() >= config.min_drop {
            attempt.committed = true;
            debug!(frame = sample.frame_index, drop = attempt.travel(), "rep attempt committed");
        }

        let settled =
            sample.frame_index.saturating_sub(attempt.bottom_frame) >= config.settle_frames;
        if velocity < -config.velocity_threshold && settled {
            debug!(
                frame = sample.frame_index,
                bottom_frame = attempt.bottom_frame,
                "phase descending -> ascending"
            );
            self.phase = RepPhase::Ascending;
            return self.ascend(sample);
        }
        None
    }

    fn ascend(&mut self, sample: &SignalSample) -> Option<RepWindow> {
        let config = &self.config;
        let Some(attempt) = self.attempt.as_mut() else {
            self.phase = RepPhase::Waiting;
            return None;
        };

        if sample.frame_index.saturating_sub(attempt.start_frame) > config.max_rep_frames {
            self.abort(sample.frame_index, "timed out while ascending");
            return None;
        }

        // 越过已记录的最低点：底部反弹，回到下降阶段
        if attempt.deepen(sample) {
            debug!(
                frame = sample.frame_index,
                bottom_height = attempt.bottom_height,
                "phase ascending -> descending"
            );
            if !attempt.committed && attempt.travel() >= config.min_drop {
                attempt.committed = true;
            }
            self.phase = RepPhase::Descending;
            return None;
        }

        let rise = attempt.bottom_height - sample.height;
        let required = config.min_rise.max(config.return_fraction * attempt.travel());
        if rise >= required {
            return self.finish(sample);
        }
        None
    }

    fn finish(&mut self, sample: &SignalSample) -> Option<RepWindow> {
        let attempt = self.attempt.take()?;
        self.phase = RepPhase::Waiting;
        let config = &self.config;

        let duration = sample.frame_index.saturating_sub(attempt.start_frame);
        let reason = if duration < config.min_rep_frames {
            Some("too short")
        } else if duration > config.max_rep_frames {
            Some("too long")
        } else if !attempt.committed {
            Some("insufficient drop")
        } else if attempt.max_flexion < config.min_flexion_deg {
            Some("insufficient flexion")
        } else {
            None
        };
        if let Some(reason) = reason {
            debug!(
                frame = sample.frame_index,
                start_frame = attempt.start_frame,
                duration,
                drop = attempt.travel(),
                max_flexion = attempt.max_flexion,
                reason,
                "rep attempt rejected"
            );
            return None;
        }

        self.last_rep_end = Some(sample.frame_index);
        Some(RepWindow {
            start_frame: attempt.start_frame,
            bottom_frame: attempt.bottom_frame,
            end_frame: sample.frame_index,
            start_height: attempt.start_height,
            bottom_height: attempt.bottom_height,
            end_height: sample.height,
            max_flexion: attempt.max_flexion,
            avg_confidence: attempt.confidence_sum / f64::from(attempt.samples.max(1)),
        })
    }

    fn abort(&mut self, frame: u64, reason: &'static str) {
        if let Some(attempt) = self.attempt.take() {
            debug!(frame, start_frame = attempt.start_frame, reason, "rep attempt aborted");
        }
        self.phase = RepPhase::Waiting;
    }
}

impl Segmenter for PhaseSegmenter {
    fn update(&mut self, frame: &SmoothedFrame) -> Option<RepWindow> {
        let sample = SignalSample {
            frame_index: frame.frame_index,
            height: self.exercise.vertical_signal(frame),
            flexion: self.exercise.flexion_angle(frame),
            confidence: frame.confidence,
        };
        self.observe(sample)
    }

    fn phase(&self) -> RepPhase {
        self.phase
    }

    fn reset(&mut self) {
        self.phase = RepPhase::Waiting;
        self.history.clear();
        self.attempt = None;
        self.last_rep_end = None;
    }
}
