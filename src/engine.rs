use std::collections::BTreeMap;

use tracing::debug;

use crate::confidence;
use crate::evm;
use crate::health;
use crate::models::{Metric, ProjectSeries, ProjectWeekRecord, RawEcho, ScoreResult};
use crate::normalize;
use crate::thresholds::ThresholdSet;
use crate::trend;
use crate::weights;

/// Score one week. `slip_history` is the project's chronological slip-day
/// sequence up to and including this week.
pub fn score_week(
    record: &ProjectWeekRecord,
    slip_history: &[i64],
    thresholds: &ThresholdSet,
) -> ScoreResult {
    let proximity = weights::proximity(record.actual_percent_complete);
    let metrics = normalize::collect(record, thresholds);
    let present: Vec<Metric> = metrics.iter().map(|m| m.metric).collect();
    let weight_set = weights::adjust(&present, proximity);
    let breakdown = health::score(&metrics, &weight_set);
    let conf = confidence::score(slip_history, record);

    let evm = evm::indices(record);
    let raw = RawEcho {
        planned_percent_complete: record.planned_percent_complete,
        actual_percent_complete: record.actual_percent_complete,
        schedule_variance: record.schedule_variance(),
        slip_days: record.slip_days(),
        net_backlog: record.net_backlog(),
        requirements_changed: record.requirements_changed_last_4w,
        defect_escape_rate: record.defect_escape_rate_last_4w,
        critical_defects: record.defects_open_critical,
        team_size: record.team_size,
        team_churn: record.team_churn_last_4w,
        blocked_days: record.blocked_days_last_2w,
        unplanned_ratio: record.unplanned_work_ratio_last_4w,
        dependency_count: record.dependency_count,
        proximity,
        earned_value: evm.map(|e| e.earned_value),
        cpi: evm.map(|e| e.cpi),
        spi: evm.map(|e| e.spi),
        milestone_hit_rate: record
            .milestone_basis()
            .map(|(planned, hit)| hit as f64 / planned as f64),
    };

    ScoreResult {
        project_id: record.project_id.clone(),
        project_name: record.project_name.clone(),
        week_ending: record.week_ending,
        health_score: breakdown.score,
        confidence_score: conf.score,
        contributions: breakdown.contributions,
        confidence: conf,
        raw,
    }
}

/// Score one project's chronological weeks, building the slip history as it
/// goes and deriving the trend deltas at the end.
pub fn score_project(records: &[&ProjectWeekRecord], thresholds: &ThresholdSet) -> ProjectSeries {
    let mut results = Vec::with_capacity(records.len());
    let mut slip_history = Vec::with_capacity(records.len());

    for record in records {
        slip_history.push(record.slip_days());
        results.push(score_week(record, &slip_history, thresholds));
    }

    let health: Vec<f64> = results.iter().map(|r| r.health_score).collect();
    let trend_deltas = trend::deltas(&health);

    ProjectSeries {
        project_id: records
            .first()
            .map(|r| r.project_id.clone())
            .unwrap_or_default(),
        project_name: records
            .first()
            .map(|r| r.project_name.clone())
            .unwrap_or_default(),
        results,
        trend_deltas,
    }
}

/// Score a whole portfolio: group by project id, order each group by
/// week-ending, and run every group through the engine. Pure with respect
/// to its inputs; nothing is cached across calls.
pub fn score_portfolio(
    records: &[ProjectWeekRecord],
    thresholds: &ThresholdSet,
) -> Vec<ProjectSeries> {
    let mut groups: BTreeMap<&str, Vec<&ProjectWeekRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(&record.project_id).or_default().push(record);
    }

    let mut portfolio = Vec::with_capacity(groups.len());
    for (project_id, mut group) in groups {
        group.sort_by_key(|r| r.week_ending);
        debug!(project_id, weeks = group.len(), "scoring project");
        portfolio.push(score_project(&group, thresholds));
    }
    portfolio
}
