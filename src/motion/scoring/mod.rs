//! 动作质量评分
//!
//! 每项检查先从窗口几何中得到一个连续测量值，再按两级阈值
//! 归为 low / moderate / high，status 由 severity 一一推导。
//! 数据不足（窗口过短或参考帧越界）时返回中性结果，不做几何计算。

pub mod pushup;
pub mod squat;

use std::collections::BTreeMap;

use crate::motion::config::{CheckThresholds, SeverityBand};
use crate::motion::exercise::Exercise;
use crate::motion::types::{CheckName, CheckResult, FormChecks, Severity, SmoothedFrame};

/// 参与评分所需的最少帧数
pub const MIN_WINDOW_FRAMES: usize = 3;

/// 测量值越大越差：超过 `high` 为 high，超过 `moderate` 为 moderate
pub fn classify(value: f64, band: SeverityBand) -> Severity {
    if value > band.high {
        Severity::High
    } else if value > band.moderate {
        Severity::Moderate
    } else {
        Severity::Low
    }
}

pub(crate) fn grade(
    name: CheckName,
    value: f64,
    band: SeverityBand,
    evidence: &[(&str, f64)],
    cue: fn(CheckName, Severity) -> &'static str,
) -> CheckResult {
    let severity = classify(value, band);
    let evidence: BTreeMap<String, f64> = evidence
        .iter()
        .map(|(key, value)| ((*key).to_string(), *value))
        .collect();
    let cue = (severity != Severity::Low).then(|| cue(name, severity).to_string());
    CheckResult::new(severity, evidence, cue)
}

/// 动作窗口评分
///
/// `reference` 为窗口内最低点（或中点）帧的下标，`top` / `bottom`
/// 为竖直信号的顶部与底部参考值。
pub fn compute_checks(
    exercise: &dyn Exercise,
    window: &[SmoothedFrame],
    reference: usize,
    top: f64,
    bottom: f64,
    thresholds: &CheckThresholds,
) -> FormChecks {
    if window.len() < MIN_WINDOW_FRAMES || reference >= window.len() {
        return FormChecks::neutral();
    }
    exercise.compute_checks(window, reference, top, bottom, thresholds)
}

/// 实时评分：无动作边界，以窗口自身竖直信号的极值作参考，最后一帧作参考帧
pub fn live_checks(
    exercise: &dyn Exercise,
    window: &[SmoothedFrame],
    thresholds: &CheckThresholds,
) -> FormChecks {
    if window.len() < MIN_WINDOW_FRAMES {
        return FormChecks::neutral();
    }
    let (top, bottom) = window
        .iter()
        .map(|frame| exercise.vertical_signal(frame))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    compute_checks(exercise, window, window.len() - 1, top, bottom, thresholds)
}
