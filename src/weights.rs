use serde::Serialize;

use crate::models::Metric;

/// Adjusted weights over exactly the metrics present for one week. Always
/// sums to 1.0 after [`adjust`].
#[derive(Debug, Clone, Serialize)]
pub struct WeightSet {
    entries: Vec<(Metric, f64)>,
}

impl WeightSet {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.entries
            .iter()
            .find(|(m, _)| *m == metric)
            .map(|(_, w)| *w)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }
}

/// Lifecycle position: 0 at or below 30% complete, 1 at 100% complete.
pub fn proximity(actual_percent_complete: f64) -> f64 {
    ((actual_percent_complete - 0.30) / 0.70).clamp(0.0, 1.0)
}

/// Base weight endpoints per metric: value at proximity 0 and at proximity 1.
/// Fixed metrics carry the same value at both ends.
fn endpoints(metric: Metric) -> (f64, f64) {
    match metric {
        Metric::ScheduleVariance => (0.10, 0.17),
        Metric::ForecastSlip => (0.08, 0.14),
        Metric::BacklogGrowth => (0.09, 0.09),
        Metric::ReqChurn => (0.09, 0.09),
        Metric::DefectEscape => (0.08, 0.12),
        Metric::CriticalDefects => (0.07, 0.10),
        Metric::TeamChurn => (0.08, 0.08),
        Metric::BlockedDays => (0.08, 0.08),
        Metric::UnplannedWork => (0.07, 0.04),
        Metric::Dependencies => (0.05, 0.03),
        Metric::Cpi => (0.08, 0.08),
        Metric::Spi => (0.08, 0.08),
        Metric::MilestoneRate => (0.07, 0.07),
    }
}

fn scaled(metric: Metric, proximity: f64) -> f64 {
    let (start, end) = endpoints(metric);
    start + (end - start) * proximity
}

/// Proximity-scale the base weights of the metrics actually present, then
/// renormalize so they sum to 1.0. Renormalizing by the sum keeps the
/// redistribution proportional: dropping a family never changes the relative
/// balance among the rest.
pub fn adjust(present: &[Metric], proximity: f64) -> WeightSet {
    let mut entries: Vec<(Metric, f64)> = present
        .iter()
        .map(|&m| (m, scaled(m, proximity)))
        .collect();
    let total: f64 = entries.iter().map(|(_, w)| w).sum();
    if total > 0.0 {
        for (_, w) in &mut entries {
            *w /= total;
        }
    }
    WeightSet { entries }
}
