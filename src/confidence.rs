use serde::Serialize;

use crate::models::ProjectWeekRecord;

/// Penalties are computed from the deltas of the trailing slip window, so
/// the window holds one more slip value than the four deltas it yields.
const SLIP_WINDOW: usize = 5;

/// Every penalty component behind a week's Confidence Score, exposed
/// individually for audit and tooltips.
#[derive(Debug, Clone, Serialize)]
pub struct ConfidenceBreakdown {
    /// Stddev of slip deltas over the floored mean, clamped to 0..2.
    pub delta_cov: f64,
    /// Erraticism points before the directional adjustment.
    pub base_penalty: f64,
    /// tanh(mean delta / 7); positive when slip is worsening.
    pub dir_factor: f64,
    /// 1 + 0.4 x dir_factor.
    pub dir_multiplier: f64,
    /// Minimum CoV penalty for a worsening trend, up to 8 points.
    pub directional_floor: f64,
    /// Final erraticism penalty, capped at 40 points.
    pub cov_penalty: f64,
    pub churn_penalty: f64,
    pub backlog_penalty: f64,
    pub slip_penalty: f64,
    pub score: f64,
}

impl ConfidenceBreakdown {
    /// Breakdown for a history too short to form a single delta: the CoV
    /// side is all zeros and only the static penalties apply.
    pub fn none(churn_penalty: f64, backlog_penalty: f64, slip_penalty: f64) -> Self {
        Self {
            delta_cov: 0.0,
            base_penalty: 0.0,
            dir_factor: 0.0,
            dir_multiplier: 1.0,
            directional_floor: 0.0,
            cov_penalty: 0.0,
            churn_penalty,
            backlog_penalty,
            slip_penalty,
            score: (100.0 - churn_penalty - backlog_penalty - slip_penalty).clamp(0.0, 100.0),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; a single value yields 0, which realizes
/// the "one delta carries no erraticism" rule without a special case.
fn stddev(values: &[f64]) -> f64 {
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Confidence Score for one week from the chronological slip-day history up
/// to and including that week (most recent last).
pub fn score(slip_history: &[i64], record: &ProjectWeekRecord) -> ConfidenceBreakdown {
    let churn_penalty = record.requirements_changed_last_4w as f64 * 1.0;
    let backlog_penalty = record.net_backlog().max(0) as f64 * 0.5;
    let slip_penalty = record.slip_days().max(0) as f64 * 0.25;

    let start = slip_history.len().saturating_sub(SLIP_WINDOW);
    let window = &slip_history[start..];
    let deltas: Vec<f64> = window.windows(2).map(|w| (w[1] - w[0]) as f64).collect();

    if deltas.is_empty() {
        return ConfidenceBreakdown::none(churn_penalty, backlog_penalty, slip_penalty);
    }

    let mean_delta = mean(&deltas);
    // A near-zero average delta would explode the ratio; floor it at 10 days.
    let reference = mean_delta.abs().max(10.0);
    let delta_cov = (stddev(&deltas) / reference).clamp(0.0, 2.0);
    let base_penalty = (delta_cov / 0.5).max(0.0) * 30.0;

    let dir_factor = (mean_delta / 7.0).tanh();
    let dir_multiplier = 1.0 + 0.4 * dir_factor;
    let directional_floor = dir_factor.clamp(0.0, 1.0) * 8.0;
    let cov_penalty = (base_penalty * dir_multiplier)
        .max(directional_floor)
        .clamp(0.0, 40.0);

    let score = (100.0 - cov_penalty - churn_penalty - backlog_penalty - slip_penalty)
        .clamp(0.0, 100.0);

    ConfidenceBreakdown {
        delta_cov,
        base_penalty,
        dir_factor,
        dir_multiplier,
        directional_floor,
        cov_penalty,
        churn_penalty,
        backlog_penalty,
        slip_penalty,
        score,
    }
}
