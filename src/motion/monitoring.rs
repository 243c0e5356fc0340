use serde::{Deserialize, Serialize};

use crate::motion::types::RepSummary;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvariantViolation {
    pub field: String,
    pub value: f64,
    pub expected_range: String,
}

/// 对一条动作汇总做结构性自检，违例只记录不修正
pub fn check_summary(summary: &RepSummary) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    if summary.start_frame > summary.bottom_frame {
        violations.push(InvariantViolation {
            field: "start_frame".to_string(),
            value: summary.start_frame as f64,
            expected_range: format!("<= bottom_frame ({})", summary.bottom_frame),
        });
    }
    if summary.bottom_frame > summary.end_frame {
        violations.push(InvariantViolation {
            field: "bottom_frame".to_string(),
            value: summary.bottom_frame as f64,
            expected_range: format!("<= end_frame ({})", summary.end_frame),
        });
    }

    check_range(
        &mut violations,
        "rep_confidence",
        summary.rep_confidence,
        0.0,
        1.0,
    );
    check_range(
        &mut violations,
        "confidence.pose_avg",
        summary.confidence.pose_avg,
        0.0,
        1.0,
    );

    for (name, result) in summary.checks.iter() {
        if result.status != result.severity.status() {
            violations.push(InvariantViolation {
                field: format!("checks.{name}.status"),
                value: f64::from(result.severity.weight()),
                expected_range: format!("{:?}", result.severity.status()),
            });
        }
        for (key, value) in &result.evidence {
            if !value.is_finite() {
                violations.push(InvariantViolation {
                    field: format!("checks.{name}.evidence.{key}"),
                    value: *value,
                    expected_range: "finite".to_string(),
                });
            }
        }
    }

    violations
}

fn check_range(
    violations: &mut Vec<InvariantViolation>,
    field: &str,
    value: f64,
    min: f64,
    max: f64,
) {
    if value.is_nan() || value < min || value > max {
        violations.push(InvariantViolation {
            field: field.to_string(),
            value,
            expected_range: format!("[{min}, {max}]"),
        });
    }
}
