use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::confidence::ConfidenceBreakdown;

/// One project, one reporting week, as ingested. Records for a project are
/// kept in chronological order; the trend and slip-delta calculations depend
/// on that ordering.
#[derive(Debug, Clone)]
pub struct ProjectWeekRecord {
    pub project_id: String,
    pub project_name: String,
    pub week_ending: NaiveDate,
    pub planned_end_date: NaiveDate,
    pub forecast_end_date: NaiveDate,
    pub planned_percent_complete: f64,
    pub actual_percent_complete: f64,
    pub backlog_items_added_last_4w: u32,
    pub backlog_items_closed_last_4w: u32,
    pub requirements_changed_last_4w: u32,
    pub defect_escape_rate_last_4w: f64,
    pub defects_open_critical: u32,
    pub team_size: u32,
    pub team_churn_last_4w: u32,
    pub blocked_days_last_2w: u32,
    pub unplanned_work_ratio_last_4w: f64,
    pub dependency_count: u32,
    pub planned_cost_to_date: Option<f64>,
    pub actual_cost_to_date: Option<f64>,
    pub milestones_planned_to_date: Option<u32>,
    pub milestones_hit: Option<u32>,
}

impl ProjectWeekRecord {
    /// Planned-vs-actual completion variance; positive means ahead of plan.
    pub fn schedule_variance(&self) -> f64 {
        self.actual_percent_complete - self.planned_percent_complete
    }

    /// Forecast slip in days, signed. Negative means forecasting early.
    pub fn slip_days(&self) -> i64 {
        (self.forecast_end_date - self.planned_end_date).num_days()
    }

    /// Net backlog growth over the trailing four weeks, signed.
    pub fn net_backlog(&self) -> i64 {
        self.backlog_items_added_last_4w as i64 - self.backlog_items_closed_last_4w as i64
    }

    /// Cost columns usable for earned-value math. A missing or zero planned
    /// or actual cost disqualifies the whole family for this week.
    pub fn cost_basis(&self) -> Option<(f64, f64)> {
        match (self.planned_cost_to_date, self.actual_cost_to_date) {
            (Some(pv), Some(ac)) if pv > 0.0 && ac > 0.0 => Some((pv, ac)),
            _ => None,
        }
    }

    /// Milestone columns usable for the hit-rate metric. Zero milestones
    /// planned means there is no rate to take.
    pub fn milestone_basis(&self) -> Option<(u32, u32)> {
        match (self.milestones_planned_to_date, self.milestones_hit) {
            (Some(planned), Some(hit)) if planned > 0 => Some((planned, hit)),
            _ => None,
        }
    }
}

/// The scored metric families. Order here is the canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    ScheduleVariance,
    ForecastSlip,
    BacklogGrowth,
    ReqChurn,
    DefectEscape,
    CriticalDefects,
    TeamChurn,
    BlockedDays,
    UnplannedWork,
    Dependencies,
    Cpi,
    Spi,
    MilestoneRate,
}

impl Metric {
    pub const ALL: [Metric; 13] = [
        Metric::ScheduleVariance,
        Metric::ForecastSlip,
        Metric::BacklogGrowth,
        Metric::ReqChurn,
        Metric::DefectEscape,
        Metric::CriticalDefects,
        Metric::TeamChurn,
        Metric::BlockedDays,
        Metric::UnplannedWork,
        Metric::Dependencies,
        Metric::Cpi,
        Metric::Spi,
        Metric::MilestoneRate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Metric::ScheduleVariance => "Schedule Variance",
            Metric::ForecastSlip => "Forecast Slip",
            Metric::BacklogGrowth => "Backlog Growth",
            Metric::ReqChurn => "Req. Churn",
            Metric::DefectEscape => "Defect Escape Rate",
            Metric::CriticalDefects => "Critical Defects",
            Metric::TeamChurn => "Team Churn",
            Metric::BlockedDays => "Blocked Days",
            Metric::UnplannedWork => "Unplanned Work",
            Metric::Dependencies => "Dependencies",
            Metric::Cpi => "CPI",
            Metric::Spi => "SPI",
            Metric::MilestoneRate => "Milestone Rate",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Per-metric share of the Health Score. `contribution` is the points the
/// metric actually earned, `max_contribution` the points it could have earned
/// at a normalized value of 1.0.
#[derive(Debug, Clone, Serialize)]
pub struct MetricContribution {
    pub metric: Metric,
    pub normalized: f64,
    pub weight: f64,
    pub contribution: f64,
    pub max_contribution: f64,
}

impl MetricContribution {
    pub fn gap(&self) -> f64 {
        self.max_contribution - self.contribution
    }
}

/// Echo of every raw input and derived intermediate a week's scores were
/// computed from, so each displayed number traces back to its source.
#[derive(Debug, Clone, Serialize)]
pub struct RawEcho {
    pub planned_percent_complete: f64,
    pub actual_percent_complete: f64,
    pub schedule_variance: f64,
    pub slip_days: i64,
    pub net_backlog: i64,
    pub requirements_changed: u32,
    pub defect_escape_rate: f64,
    pub critical_defects: u32,
    pub team_size: u32,
    pub team_churn: u32,
    pub blocked_days: u32,
    pub unplanned_ratio: f64,
    pub dependency_count: u32,
    pub proximity: f64,
    pub earned_value: Option<f64>,
    pub cpi: Option<f64>,
    pub spi: Option<f64>,
    pub milestone_hit_rate: Option<f64>,
}

/// Scores and full accounting for one project-week.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreResult {
    pub project_id: String,
    pub project_name: String,
    pub week_ending: NaiveDate,
    pub health_score: f64,
    pub confidence_score: f64,
    pub contributions: Vec<MetricContribution>,
    pub confidence: ConfidenceBreakdown,
    pub raw: RawEcho,
}

impl ScoreResult {
    /// Contributions re-ranked by gap, biggest drag first. Equal gaps rank
    /// the structurally heavier metric (larger max contribution) first.
    pub fn ranked_gaps(&self) -> Vec<MetricContribution> {
        let mut ranked = self.contributions.clone();
        ranked.sort_by(|a, b| {
            b.gap()
                .partial_cmp(&a.gap())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.max_contribution
                        .partial_cmp(&a.max_contribution)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
        });
        ranked
    }

    pub fn biggest_drag(&self) -> Option<MetricContribution> {
        self.ranked_gaps().into_iter().next()
    }
}

/// All scored weeks for one project, chronological, plus week-over-week
/// health deltas (first entry 0).
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSeries {
    pub project_id: String,
    pub project_name: String,
    pub results: Vec<ScoreResult>,
    pub trend_deltas: Vec<f64>,
}

impl ProjectSeries {
    pub fn latest(&self) -> Option<&ScoreResult> {
        self.results.last()
    }

    pub fn latest_trend(&self) -> f64 {
        self.trend_deltas.last().copied().unwrap_or(0.0)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slip_days_is_signed() {
        let mut rec = fixtures::record();
        assert_eq!(rec.slip_days(), 3);
        rec.forecast_end_date = NaiveDate::from_ymd_opt(2026, 9, 20).unwrap();
        assert_eq!(rec.slip_days(), -10);
    }

    #[test]
    fn cost_basis_requires_both_columns_nonzero() {
        let mut rec = fixtures::record_with_cost();
        assert!(rec.cost_basis().is_some());

        rec.actual_cost_to_date = Some(0.0);
        assert!(rec.cost_basis().is_none());

        rec.actual_cost_to_date = None;
        assert!(rec.cost_basis().is_none());
    }

    #[test]
    fn milestone_basis_guards_zero_planned() {
        let mut rec = fixtures::record_with_cost();
        assert_eq!(rec.milestone_basis(), Some((8, 6)));
        rec.milestones_planned_to_date = Some(0);
        assert!(rec.milestone_basis().is_none());
    }

    #[test]
    fn net_backlog_can_go_negative() {
        let mut rec = fixtures::record();
        rec.backlog_items_added_last_4w = 3;
        rec.backlog_items_closed_last_4w = 9;
        assert_eq!(rec.net_backlog(), -6);
    }
}
