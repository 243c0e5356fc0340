//! 教练请求负载
//!
//! 由动作汇总组装发往远端教练服务的 JSON。五项检查始终齐全，
//! 下游序列化无需处理缺项。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::coaching::analysis::SessionReport;
use crate::constants::CUE_EVIDENCE_MAX_CHARS;
use crate::motion::types::{CheckName, ConfidenceSummary, RepSummary, Severity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepCheckPayload {
    pub severity: Severity,
    #[serde(default)]
    pub evidence: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepPayload {
    pub rep_index: u32,
    pub confidence: ConfidenceSummary,
    pub checks: BTreeMap<String, RepCheckPayload>,
}

impl From<&RepSummary> for RepPayload {
    fn from(rep: &RepSummary) -> Self {
        let checks = rep
            .checks
            .iter()
            .map(|(name, result)| {
                (
                    name.as_str().to_string(),
                    RepCheckPayload {
                        severity: result.severity,
                        evidence: result.evidence.clone(),
                    },
                )
            })
            .collect();
        Self {
            rep_index: rep.rep_index,
            confidence: rep.confidence.clone(),
            checks,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoachMode {
    CheckIn,
    #[default]
    SetSummary,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SetLevelSummary {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub worst_issues: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trends: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency_note: Option<String>,
}

impl From<&SessionReport> for SetLevelSummary {
    fn from(report: &SessionReport) -> Self {
        let worst_issues = report
            .weak_areas
            .iter()
            .map(|area| format!("{} ({})", area.check.label(), area.worst_severity.as_str()))
            .collect();
        let trends = report
            .trends
            .check_failure_trends
            .iter()
            .map(|(name, trend)| {
                format!("{name}: {} ({:+.1}%)", trend.trend.as_str(), trend.change)
            })
            .collect();
        let consistency_note = Some(format!(
            "Consistency {} ({:.2})",
            report.consistency.interpretation, report.consistency.score
        ));
        Self {
            worst_issues,
            trends,
            consistency_note,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachingRequest {
    pub session_id: String,
    pub rep_count: u32,
    pub reps: Vec<RepPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_level_summary: Option<SetLevelSummary>,
    #[serde(default)]
    pub coach_mode: CoachMode,
}

impl CoachingRequest {
    pub fn from_reps(session_id: impl Into<String>, reps: &[RepSummary]) -> Self {
        Self {
            session_id: session_id.into(),
            rep_count: reps.len() as u32,
            reps: reps.iter().map(RepPayload::from).collect(),
            set_level_summary: None,
            coach_mode: CoachMode::default(),
        }
    }

    pub fn with_report(mut self, report: &SessionReport) -> Self {
        self.set_level_summary = Some(SetLevelSummary::from(report));
        self
    }

    pub fn with_mode(mut self, mode: CoachMode) -> Self {
        self.coach_mode = mode;
        self
    }
}

pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 单次动作的简短提示：按检查顺序取第一个 high 项，否则给出通用肯定
pub fn rep_cue(rep: &RepPayload) -> String {
    let flagged = CheckName::ALL.iter().find_map(|name| {
        rep.checks
            .get(name.as_str())
            .filter(|check| check.severity == Severity::High)
            .map(|check| (*name, check))
    });

    match flagged {
        Some((name, check)) => {
            let evidence = check
                .evidence
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect::<Vec<_>>()
                .join(", ");
            let ellipsis = if evidence.chars().count() > CUE_EVIDENCE_MAX_CHARS {
                "..."
            } else {
                ""
            };
            let evidence: String = evidence.chars().take(CUE_EVIDENCE_MAX_CHARS).collect();
            format!("Watch: {} — {evidence}{ellipsis}", name.label())
        }
        None => "Rep looks good. Keep consistency.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::types::{CheckResult, FormChecks};

    fn rep(index: u32, checks: FormChecks) -> RepSummary {
        RepSummary {
            rep_index: index,
            start_frame: 1,
            bottom_frame: 10,
            end_frame: 20,
            rep_confidence: 0.9,
            confidence: ConfidenceSummary {
                pose_avg: 0.9,
                warnings: Vec::new(),
            },
            checks,
            scores: None,
        }
    }

    #[test]
    fn payload_always_has_five_checks() {
        let request = CoachingRequest::from_reps("s-1", &[rep(0, FormChecks::neutral())]);
        let json = serde_json::to_value(&request).expect("serialize request");
        assert_eq!(json["rep_count"], 1);
        assert_eq!(json["coach_mode"], "set_summary");
        let checks = json["reps"][0]["checks"].as_object().expect("checks object");
        assert_eq!(checks.len(), 5);
        for check in checks.values() {
            assert_eq!(check["severity"], "low");
        }
        assert!(json.get("set_level_summary").is_none());
    }

    #[test]
    fn cue_names_first_high_check() {
        let mut checks = FormChecks::neutral();
        checks.knee_tracking = CheckResult::new(
            Severity::High,
            BTreeMap::from([("valgus_offset".to_string(), 0.081)]),
            None,
        );
        let payload = RepPayload::from(&rep(0, checks));
        let cue = rep_cue(&payload);
        assert_eq!(cue, "Watch: Knee Tracking — valgus_offset=0.081");
    }

    #[test]
    fn long_evidence_is_truncated_with_ellipsis() {
        let mut checks = FormChecks::neutral();
        checks.torso_angle = CheckResult::new(
            Severity::High,
            (0..10)
                .map(|i| (format!("torso_measurement_{i}"), 12.5))
                .collect(),
            None,
        );
        let cue = rep_cue(&RepPayload::from(&rep(0, checks)));
        let evidence = cue
            .strip_prefix("Watch: Torso Angle — ")
            .expect("label prefix");
        assert!(evidence.ends_with("..."));
        assert_eq!(evidence.chars().count(), CUE_EVIDENCE_MAX_CHARS + 3);
    }

    #[test]
    fn clean_rep_gets_generic_cue() {
        let payload = RepPayload::from(&rep(0, FormChecks::neutral()));
        assert_eq!(rep_cue(&payload), "Rep looks good. Keep consistency.");
    }

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(new_session_id(), new_session_id());
    }
}
