use serde::Serialize;

use crate::evm;
use crate::models::{Metric, ProjectWeekRecord};
use crate::thresholds::ThresholdSet;

/// The three linear shapes a raw metric can be normalized through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Formula {
    /// `clamp((raw + span) / span)` for signed variances where zero or
    /// better is perfectly healthy and `-span` is total concern.
    OffsetVariance,
    /// `clamp(1 - raw / max)` for counters and ratios where zero is ideal.
    RatioToMax,
    /// `clamp((raw - floor) / (1 - floor))` for ratios centered near 1.0;
    /// values above 1.0 are clamped, not rewarded.
    FloorBased,
}

/// One raw metric taken through its formula, with everything needed to show
/// the reader how the number came out.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedMetric {
    pub metric: Metric,
    pub raw: f64,
    pub formula: Formula,
    pub threshold: f64,
    pub value: f64,
}

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

pub fn offset_variance(raw: f64, span: f64) -> f64 {
    clamp01((raw + span) / span)
}

pub fn ratio_to_max(raw: f64, max: f64) -> f64 {
    clamp01(1.0 - raw / max)
}

pub fn floor_based(raw: f64, floor: f64) -> f64 {
    clamp01((raw - floor) / (1.0 - floor))
}

fn entry(metric: Metric, raw: f64, formula: Formula, threshold: f64) -> NormalizedMetric {
    let value = match formula {
        Formula::OffsetVariance => offset_variance(raw, threshold),
        Formula::RatioToMax => ratio_to_max(raw, threshold),
        Formula::FloorBased => floor_based(raw, threshold),
    };
    NormalizedMetric {
        metric,
        raw,
        formula,
        threshold,
        value,
    }
}

/// Normalize every metric present for this week, in canonical order.
///
/// Metrics whose denominators are zero or whose source columns are absent
/// are left out entirely rather than emitted as 0; the weight adjuster
/// redistributes their share.
pub fn collect(record: &ProjectWeekRecord, thresholds: &ThresholdSet) -> Vec<NormalizedMetric> {
    let mut metrics = Vec::with_capacity(Metric::ALL.len());

    metrics.push(entry(
        Metric::ScheduleVariance,
        record.schedule_variance(),
        Formula::OffsetVariance,
        thresholds.sched_lag_max,
    ));
    metrics.push(entry(
        Metric::ForecastSlip,
        record.slip_days().max(0) as f64,
        Formula::RatioToMax,
        thresholds.slip_days_max,
    ));
    metrics.push(entry(
        Metric::BacklogGrowth,
        record.net_backlog().max(0) as f64,
        Formula::RatioToMax,
        thresholds.net_backlog_max,
    ));
    metrics.push(entry(
        Metric::ReqChurn,
        record.requirements_changed_last_4w as f64,
        Formula::RatioToMax,
        thresholds.req_churn_max,
    ));
    metrics.push(entry(
        Metric::DefectEscape,
        record.defect_escape_rate_last_4w,
        Formula::RatioToMax,
        thresholds.defect_escape_max,
    ));

    // Both per-head ratios need a team to divide by.
    if record.team_size > 0 {
        let team = record.team_size as f64;
        metrics.push(entry(
            Metric::CriticalDefects,
            record.defects_open_critical as f64 / team,
            Formula::RatioToMax,
            thresholds.crit_defect_ratio,
        ));
        metrics.push(entry(
            Metric::TeamChurn,
            record.team_churn_last_4w as f64 / team,
            Formula::RatioToMax,
            1.0,
        ));
    }

    metrics.push(entry(
        Metric::BlockedDays,
        record.blocked_days_last_2w as f64,
        Formula::RatioToMax,
        thresholds.blocked_days_max,
    ));
    metrics.push(entry(
        Metric::UnplannedWork,
        record.unplanned_work_ratio_last_4w,
        Formula::RatioToMax,
        thresholds.unplanned_max,
    ));
    metrics.push(entry(
        Metric::Dependencies,
        record.dependency_count as f64,
        Formula::RatioToMax,
        thresholds.dep_count_max,
    ));

    if let Some(evm) = evm::indices(record) {
        metrics.push(entry(
            Metric::Cpi,
            evm.cpi,
            Formula::FloorBased,
            thresholds.cpi_floor,
        ));
        metrics.push(entry(
            Metric::Spi,
            evm.spi,
            Formula::FloorBased,
            thresholds.spi_floor,
        ));
    }

    if let Some((planned, hit)) = record.milestone_basis() {
        metrics.push(entry(
            Metric::MilestoneRate,
            hit as f64 / planned as f64,
            Formula::FloorBased,
            thresholds.milestone_floor,
        ));
    }

    metrics
}
