//! 会话级动作质量分析
//!
//! 纯计算：由调用方提供当前会话与历史会话（不含当前），不做存储。
//! 严重度权重 low=0、moderate=1、high=2。

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    CONSISTENCY_SPREAD, MAX_RECOMMENDATIONS, MAX_WEAK_AREAS, TREND_SESSION_WINDOW,
};
use crate::motion::exercise::{profile, ExerciseKind};
use crate::motion::geometry::{mean, round_to};
use crate::motion::types::{CheckName, RepSummary, Severity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub exercise: ExerciseKind,
    pub recorded_at: DateTime<Utc>,
    #[serde(default)]
    pub reps: Vec<RepSummary>,
}

impl SessionRecord {
    pub fn new(session_id: impl Into<String>, exercise: ExerciseKind, reps: Vec<RepSummary>) -> Self {
        Self {
            session_id: session_id.into(),
            exercise,
            recorded_at: Utc::now(),
            reps,
        }
    }

    pub fn rep_count(&self) -> usize {
        self.reps.len()
    }

    fn severities(&self, check: CheckName) -> impl Iterator<Item = Severity> + '_ {
        self.reps.iter().map(move |rep| rep.checks.get(check).severity)
    }

    fn high_count(&self, check: CheckName) -> usize {
        self.severities(check)
            .filter(|s| *s == Severity::High)
            .count()
    }

    fn critical_issues(&self) -> usize {
        CheckName::ALL.iter().map(|&c| self.high_count(c)).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CheckTally {
    pub ok: u32,
    pub watch: u32,
    pub flag: u32,
    pub flag_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeakArea {
    pub check: CheckName,
    pub severity_score: f64,
    pub worst_severity: Severity,
    pub evidence: BTreeMap<String, f64>,
    pub cue: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consistency {
    pub score: f64,
    pub interpretation: String,
    /// 仅包含在各次动作间有变化的检查
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub check_spread: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Degrading,
    Stable,
}

impl TrendDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            TrendDirection::Improving => "improving",
            TrendDirection::Degrading => "degrading",
            TrendDirection::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepCountTrend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckTrend {
    pub trend: TrendDirection,
    /// 最新与最早会话的 high 比例差（百分点）
    pub change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub sessions_considered: usize,
    #[serde(default)]
    pub check_failure_trends: BTreeMap<String, CheckTrend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rep_count_trend: Option<RepCountTrend>,
    pub interpretation: String,
}

impl TrendReport {
    pub fn is_insufficient(&self) -> bool {
        self.rep_count_trend.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryDelta {
    pub current: f64,
    pub historical_avg: f64,
    pub vs_avg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryComparison {
    pub rep_count: HistoryDelta,
    pub critical_issues: HistoryDelta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: String,
    pub exercise: ExerciseKind,
    pub recorded_at: DateTime<Utc>,
    pub rep_count: usize,
    pub checks_summary: BTreeMap<String, CheckTally>,
    pub weak_areas: Vec<WeakArea>,
    pub consistency: Consistency,
    pub trends: TrendReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<HistoryComparison>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionAnalyzer;

impl SessionAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, current: &SessionRecord, history: &[SessionRecord]) -> SessionReport {
        let weak_areas = self.weak_areas(current);
        let trends = self.trends(current, history);
        let recommendations = self.recommendations(&weak_areas, &trends);

        SessionReport {
            session_id: current.session_id.clone(),
            exercise: current.exercise,
            recorded_at: current.recorded_at,
            rep_count: current.rep_count(),
            checks_summary: self.checks_summary(current),
            weak_areas,
            consistency: self.consistency(current),
            trends,
            comparison: self.compare(current, history),
            recommendations,
        }
    }

    pub fn checks_summary(&self, session: &SessionRecord) -> BTreeMap<String, CheckTally> {
        let reps = session.rep_count();
        if reps == 0 {
            return BTreeMap::new();
        }
        CheckName::ALL
            .iter()
            .map(|&check| {
                let mut tally = CheckTally::default();
                for severity in session.severities(check) {
                    match severity {
                        Severity::Low => tally.ok += 1,
                        Severity::Moderate => tally.watch += 1,
                        Severity::High => tally.flag += 1,
                    }
                }
                tally.flag_percentage = round_to(f64::from(tally.flag) / reps as f64 * 100.0, 1);
                (check.as_str().to_string(), tally)
            })
            .collect()
    }

    pub fn weak_areas(&self, session: &SessionRecord) -> Vec<WeakArea> {
        if session.reps.is_empty() {
            return Vec::new();
        }
        let exercise = profile(session.exercise);

        let mut scored: Vec<(CheckName, f64)> = CheckName::ALL
            .iter()
            .map(|&check| {
                let weights: Vec<f64> = session
                    .severities(check)
                    .map(|s| f64::from(s.weight()))
                    .collect();
                (check, mean(&weights))
            })
            .filter(|(_, score)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        scored
            .into_iter()
            .take(MAX_WEAK_AREAS)
            .map(|(check, score)| {
                // 取第一次出现最严重等级的那次动作作为证据
                let mut worst = Severity::Low;
                let mut evidence = BTreeMap::new();
                for rep in &session.reps {
                    let result = rep.checks.get(check);
                    if result.severity > worst {
                        worst = result.severity;
                        evidence = result.evidence.clone();
                    }
                }
                WeakArea {
                    check,
                    severity_score: round_to(score, 2),
                    worst_severity: worst,
                    evidence,
                    cue: exercise.cue(check, worst).to_string(),
                }
            })
            .collect()
    }

    pub fn consistency(&self, session: &SessionRecord) -> Consistency {
        if session.reps.len() < 2 {
            return Consistency {
                score: 1.0,
                interpretation: "Insufficient data".to_string(),
                check_spread: BTreeMap::new(),
            };
        }

        let mut check_spread = BTreeMap::new();
        for check in CheckName::ALL {
            let weights: Vec<f64> = session
                .severities(check)
                .map(|s| f64::from(s.weight()))
                .collect();
            if weights.iter().any(|w| *w != weights[0]) {
                check_spread.insert(check.as_str().to_string(), sample_std_dev(&weights));
            }
        }

        let spreads: Vec<f64> = check_spread.values().copied().collect();
        let score = (1.0 - mean(&spreads) / CONSISTENCY_SPREAD).max(0.0);
        let interpretation = if score > 0.8 {
            "Excellent"
        } else if score > 0.6 {
            "Good"
        } else if score > 0.4 {
            "Fair"
        } else {
            "Needs improvement"
        };

        Consistency {
            score: round_to(score, 2),
            interpretation: interpretation.to_string(),
            check_spread: check_spread
                .into_iter()
                .map(|(k, v)| (k, round_to(v, 2)))
                .collect(),
        }
    }

    /// 最近若干次会话（含当前，按时间升序）的趋势
    pub fn trends(&self, current: &SessionRecord, history: &[SessionRecord]) -> TrendReport {
        let mut sessions: Vec<&SessionRecord> = history.iter().chain(std::iter::once(current)).collect();
        sessions.sort_by_key(|s| s.recorded_at);
        let skip = sessions.len().saturating_sub(TREND_SESSION_WINDOW);
        let recent = &sessions[skip..];

        if recent.len() < 2 {
            return TrendReport {
                sessions_considered: recent.len(),
                check_failure_trends: BTreeMap::new(),
                rep_count_trend: None,
                interpretation: "Need more sessions to detect trends".to_string(),
            };
        }

        let mut check_failure_trends = BTreeMap::new();
        for check in CheckName::ALL {
            let rates: Vec<f64> = recent
                .iter()
                .map(|s| {
                    if s.reps.is_empty() {
                        0.0
                    } else {
                        s.high_count(check) as f64 / s.rep_count() as f64 * 100.0
                    }
                })
                .collect();
            let (first, last) = (rates[0], rates[rates.len() - 1]);
            let trend = if last < first {
                TrendDirection::Improving
            } else if last > first {
                TrendDirection::Degrading
            } else {
                TrendDirection::Stable
            };
            check_failure_trends.insert(
                check.as_str().to_string(),
                CheckTrend {
                    trend,
                    change: round_to(last - first, 1),
                },
            );
        }

        let (first_reps, last_reps) = (recent[0].rep_count(), recent[recent.len() - 1].rep_count());
        let rep_count_trend = if last_reps > first_reps {
            RepCountTrend::Increasing
        } else if last_reps < first_reps {
            RepCountTrend::Decreasing
        } else {
            RepCountTrend::Stable
        };

        TrendReport {
            sessions_considered: recent.len(),
            interpretation: interpret_trends(&check_failure_trends, rep_count_trend).to_string(),
            check_failure_trends,
            rep_count_trend: Some(rep_count_trend),
        }
    }

    pub fn compare(
        &self,
        current: &SessionRecord,
        history: &[SessionRecord],
    ) -> Option<HistoryComparison> {
        if history.is_empty() {
            return None;
        }
        let rep_counts: Vec<f64> = history.iter().map(|s| s.rep_count() as f64).collect();
        let issues: Vec<f64> = history.iter().map(|s| s.critical_issues() as f64).collect();
        Some(HistoryComparison {
            rep_count: delta(current.rep_count() as f64, mean(&rep_counts)),
            critical_issues: delta(current.critical_issues() as f64, mean(&issues)),
        })
    }

    pub fn recommendations(&self, weak_areas: &[WeakArea], trends: &TrendReport) -> Vec<String> {
        let mut out = Vec::new();

        if let Some(top) = weak_areas.first() {
            match top.worst_severity {
                Severity::High => out.push(format!(
                    "Priority: fix {} - this is causing major form breaks.",
                    top.check.label()
                )),
                Severity::Moderate => out.push(format!(
                    "Work on {} - several reps showed issues here.",
                    top.check.label()
                )),
                Severity::Low => {}
            }
        }

        for (name, trend) in &trends.check_failure_trends {
            if trend.trend == TrendDirection::Degrading && trend.change > 10.0 {
                let label = name
                    .parse::<CheckName>()
                    .map(|check| check.label().to_string())
                    .unwrap_or_else(|_| name.clone());
                out.push(format!("{label} is slipping across sessions. Take breaks between sets."));
            }
        }

        match trends.rep_count_trend {
            Some(RepCountTrend::Decreasing) => out.push(
                "Aiming for more reps? Focus on form quality over quantity first.".to_string(),
            ),
            Some(RepCountTrend::Increasing) => out.push(
                "Excellent! You're building stamina. Maintain form quality.".to_string(),
            ),
            _ => {}
        }

        if out.is_empty() {
            out.push("Keep consistent with form checks between sets.".to_string());
        }
        out.push("Record your sets to compare form visually over time.".to_string());
        out.truncate(MAX_RECOMMENDATIONS);
        out
    }
}

fn delta(current: f64, historical_avg: f64) -> HistoryDelta {
    HistoryDelta {
        current,
        historical_avg: round_to(historical_avg, 1),
        vs_avg: round_to(current - historical_avg, 1),
    }
}

/// 样本标准差（n-1）
fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn interpret_trends(trends: &BTreeMap<String, CheckTrend>, reps: RepCountTrend) -> &'static str {
    let improving = trends
        .values()
        .filter(|t| t.trend == TrendDirection::Improving)
        .count();
    let degrading = trends
        .values()
        .filter(|t| t.trend == TrendDirection::Degrading)
        .count();

    if improving > degrading && reps == RepCountTrend::Increasing {
        "Great progress! Form is improving and stamina is increasing."
    } else if degrading > improving && reps == RepCountTrend::Decreasing {
        "Form is degrading. Consider shorter sets or more rest."
    } else if improving > degrading {
        "Form is improving! Keep up the momentum."
    } else if degrading > improving {
        "Some form areas are declining. May indicate fatigue."
    } else {
        "Form is stable. Maintain current technique."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::motion::types::{CheckResult, ConfidenceSummary, FormChecks};

    fn rep(index: u32, depth: Severity, knees: Severity) -> RepSummary {
        let mut checks = FormChecks::neutral();
        checks.depth = CheckResult::new(
            depth,
            BTreeMap::from([("knee_angle_deg".to_string(), 100.0 + index as f64)]),
            None,
        );
        checks.knee_tracking = CheckResult::new(knees, BTreeMap::new(), None);
        RepSummary {
            rep_index: index,
            start_frame: 1,
            bottom_frame: 10,
            end_frame: 30,
            rep_confidence: 0.9,
            confidence: ConfidenceSummary {
                pose_avg: 0.9,
                warnings: Vec::new(),
            },
            checks,
            scores: None,
        }
    }

    fn session(id: &str, days_ago: i64, reps: Vec<RepSummary>) -> SessionRecord {
        let mut record = SessionRecord::new(id, ExerciseKind::Squat, reps);
        record.recorded_at = Utc::now() - Duration::days(days_ago);
        record
    }

    #[test]
    fn tallies_and_weak_areas() {
        let current = session(
            "now",
            0,
            vec![
                rep(0, Severity::High, Severity::Low),
                rep(1, Severity::Moderate, Severity::Low),
                rep(2, Severity::High, Severity::Moderate),
                rep(3, Severity::Low, Severity::Low),
            ],
        );
        let analyzer = SessionAnalyzer::new();

        let summary = analyzer.checks_summary(&current);
        let depth = summary["depth"];
        assert_eq!((depth.ok, depth.watch, depth.flag), (1, 1, 2));
        assert_eq!(depth.flag_percentage, 50.0);

        let weak = analyzer.weak_areas(&current);
        assert_eq!(weak.len(), 2);
        assert_eq!(weak[0].check, CheckName::Depth);
        assert_eq!(weak[0].severity_score, 1.25);
        assert_eq!(weak[0].worst_severity, Severity::High);
        assert_eq!(weak[0].evidence["knee_angle_deg"], 100.0);
        assert_eq!(weak[0].cue, profile(ExerciseKind::Squat).cue(CheckName::Depth, Severity::High));
        assert_eq!(weak[1].check, CheckName::KneeTracking);
    }

    #[test]
    fn consistency_requires_two_reps() {
        let analyzer = SessionAnalyzer::new();
        let single = session("one", 0, vec![rep(0, Severity::High, Severity::Low)]);
        let c = analyzer.consistency(&single);
        assert_eq!(c.score, 1.0);
        assert_eq!(c.interpretation, "Insufficient data");

        let steady = session(
            "steady",
            0,
            vec![
                rep(0, Severity::High, Severity::Low),
                rep(1, Severity::High, Severity::Low),
            ],
        );
        assert_eq!(analyzer.consistency(&steady).score, 1.0);
        assert_eq!(analyzer.consistency(&steady).interpretation, "Excellent");

        // 深度 [2, 0] 样本标准差 √2，得分 1 - 1.414/2.5 ≈ 0.43
        let erratic = session(
            "erratic",
            0,
            vec![
                rep(0, Severity::High, Severity::Low),
                rep(1, Severity::Low, Severity::Low),
            ],
        );
        let c = analyzer.consistency(&erratic);
        assert_eq!(c.score, 0.43);
        assert_eq!(c.interpretation, "Fair");
        assert_eq!(c.check_spread["depth"], 1.41);
    }

    #[test]
    fn trends_use_most_recent_sessions() {
        let analyzer = SessionAnalyzer::new();
        let history: Vec<SessionRecord> = (1..=6)
            .rev()
            .map(|days| {
                session(
                    &format!("h{days}"),
                    days,
                    vec![rep(0, Severity::High, Severity::Low), rep(1, Severity::High, Severity::Low)],
                )
            })
            .collect();
        let current = session(
            "now",
            0,
            vec![
                rep(0, Severity::Low, Severity::Low),
                rep(1, Severity::Low, Severity::Low),
                rep(2, Severity::Low, Severity::Low),
            ],
        );

        let trends = analyzer.trends(&current, &history);
        assert_eq!(trends.sessions_considered, 5);
        let depth = trends.check_failure_trends["depth"];
        assert_eq!(depth.trend, TrendDirection::Improving);
        assert_eq!(depth.change, -100.0);
        assert_eq!(trends.rep_count_trend, Some(RepCountTrend::Increasing));
        assert_eq!(
            trends.interpretation,
            "Great progress! Form is improving and stamina is increasing."
        );
    }

    #[test]
    fn first_session_has_no_trend_or_comparison() {
        let analyzer = SessionAnalyzer::new();
        let current = session("now", 0, vec![rep(0, Severity::Low, Severity::Low)]);
        let report = analyzer.analyze(&current, &[]);
        assert!(report.trends.is_insufficient());
        assert!(report.comparison.is_none());
        assert_eq!(
            report.recommendations,
            vec![
                "Keep consistent with form checks between sets.".to_string(),
                "Record your sets to compare form visually over time.".to_string(),
            ]
        );
    }

    #[test]
    fn comparison_against_history_mean() {
        let analyzer = SessionAnalyzer::new();
        let history = vec![
            session("a", 2, vec![rep(0, Severity::High, Severity::High)]),
            session("b", 1, vec![rep(0, Severity::Low, Severity::Low); 3]),
        ];
        let current = session(
            "now",
            0,
            vec![
                rep(0, Severity::High, Severity::Low),
                rep(1, Severity::Low, Severity::Low),
            ],
        );
        let cmp = analyzer.compare(&current, &history).expect("comparison");
        assert_eq!(cmp.rep_count.current, 2.0);
        assert_eq!(cmp.rep_count.historical_avg, 2.0);
        assert_eq!(cmp.critical_issues.current, 1.0);
        assert_eq!(cmp.critical_issues.historical_avg, 1.0);
        assert_eq!(cmp.critical_issues.vs_avg, 0.0);
    }

    #[test]
    fn recommendations_are_capped() {
        let analyzer = SessionAnalyzer::new();
        let weak = vec![WeakArea {
            check: CheckName::Depth,
            severity_score: 2.0,
            worst_severity: Severity::High,
            evidence: BTreeMap::new(),
            cue: String::new(),
        }];
        let degrading = CheckTrend {
            trend: TrendDirection::Degrading,
            change: 50.0,
        };
        let trends = TrendReport {
            sessions_considered: 5,
            check_failure_trends: CheckName::ALL
                .iter()
                .map(|c| (c.as_str().to_string(), degrading))
                .collect(),
            rep_count_trend: Some(RepCountTrend::Decreasing),
            interpretation: String::new(),
        };
        let recs = analyzer.recommendations(&weak, &trends);
        assert_eq!(recs.len(), MAX_RECOMMENDATIONS);
        assert!(recs[0].starts_with("Priority: fix Depth"));
    }
}
