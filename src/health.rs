use crate::models::MetricContribution;
use crate::normalize::NormalizedMetric;
use crate::weights::WeightSet;

/// Health Score plus per-metric point accounting.
#[derive(Debug, Clone)]
pub struct HealthBreakdown {
    pub score: f64,
    pub contributions: Vec<MetricContribution>,
}

/// Weighted sum of normalized metrics, scaled to 0..100. Each metric's
/// actual and maximum point contributions are recorded so the gap ranking
/// and any displayed number trace back to the formula.
pub fn score(metrics: &[NormalizedMetric], weights: &WeightSet) -> HealthBreakdown {
    let mut contributions = Vec::with_capacity(metrics.len());
    let mut total = 0.0;

    for m in metrics {
        let Some(weight) = weights.get(m.metric) else {
            continue;
        };
        let max_contribution = weight * 100.0;
        let contribution = weight * m.value * 100.0;
        total += contribution;
        contributions.push(MetricContribution {
            metric: m.metric,
            normalized: m.value,
            weight,
            contribution,
            max_contribution,
        });
    }

    HealthBreakdown {
        score: total.clamp(0.0, 100.0),
        contributions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{fixtures, Metric};
    use crate::normalize;
    use crate::thresholds::ThresholdSet;
    use crate::weights;

    fn breakdown() -> HealthBreakdown {
        let rec = fixtures::record();
        let thresholds = ThresholdSet::default();
        let metrics = normalize::collect(&rec, &thresholds);
        let present: Vec<Metric> = metrics.iter().map(|m| m.metric).collect();
        let ws = weights::adjust(&present, weights::proximity(rec.actual_percent_complete));
        score(&metrics, &ws)
    }

    #[test]
    fn contributions_sum_to_score() {
        let b = breakdown();
        let sum: f64 = b.contributions.iter().map(|c| c.contribution).sum();
        assert!((sum - b.score).abs() < 1e-9);
        assert!((0.0..=100.0).contains(&b.score));
    }

    #[test]
    fn gaps_are_nonnegative_and_account_for_all_points() {
        let b = breakdown();
        let mut points = 0.0;
        for c in &b.contributions {
            assert!(c.gap() >= 0.0, "{} gap negative", c.metric);
            points += c.contribution + c.gap();
        }
        // Earned points plus gaps cover the full 100-point scale.
        assert!((points - 100.0).abs() < 1e-9);
    }

    #[test]
    fn perfect_metrics_score_one_hundred() {
        let thresholds = ThresholdSet::default();
        let mut rec = fixtures::record();
        rec.planned_percent_complete = 0.70;
        rec.actual_percent_complete = 0.74;
        rec.forecast_end_date = rec.planned_end_date;
        rec.backlog_items_added_last_4w = 0;
        rec.requirements_changed_last_4w = 0;
        rec.defect_escape_rate_last_4w = 0.0;
        rec.defects_open_critical = 0;
        rec.team_churn_last_4w = 0;
        rec.blocked_days_last_2w = 0;
        rec.unplanned_work_ratio_last_4w = 0.0;
        rec.dependency_count = 0;

        let metrics = normalize::collect(&rec, &thresholds);
        let present: Vec<Metric> = metrics.iter().map(|m| m.metric).collect();
        let ws = weights::adjust(&present, weights::proximity(rec.actual_percent_complete));
        let b = score(&metrics, &ws);
        assert!((b.score - 100.0).abs() < 1e-9);
        assert!(b.contributions.iter().all(|c| c.gap().abs() < 1e-9));
    }

    #[test]
    fn biggest_drag_prefers_heavier_metric_on_ties() {
        use crate::confidence::ConfidenceBreakdown;
        use crate::models::{RawEcho, ScoreResult};

        // Two metrics with identical gaps; Schedule Variance carries the
        // larger max contribution and must rank first.
        let contributions = vec![
            MetricContribution {
                metric: Metric::Dependencies,
                normalized: 0.8,
                weight: 0.25,
                contribution: 20.0,
                max_contribution: 25.0,
            },
            MetricContribution {
                metric: Metric::ScheduleVariance,
                normalized: 0.9,
                weight: 0.50,
                contribution: 45.0,
                max_contribution: 50.0,
            },
            MetricContribution {
                metric: Metric::BlockedDays,
                normalized: 0.96,
                weight: 0.25,
                contribution: 24.0,
                max_contribution: 25.0,
            },
        ];
        let rec = fixtures::record();
        let result = ScoreResult {
            project_id: rec.project_id.clone(),
            project_name: rec.project_name.clone(),
            week_ending: rec.week_ending,
            health_score: 89.0,
            confidence_score: 97.25,
            contributions,
            confidence: ConfidenceBreakdown::none(0.0, 0.0, 0.0),
            raw: RawEcho {
                planned_percent_complete: rec.planned_percent_complete,
                actual_percent_complete: rec.actual_percent_complete,
                schedule_variance: rec.schedule_variance(),
                slip_days: rec.slip_days(),
                net_backlog: rec.net_backlog(),
                requirements_changed: rec.requirements_changed_last_4w,
                defect_escape_rate: rec.defect_escape_rate_last_4w,
                critical_defects: rec.defects_open_critical,
                team_size: rec.team_size,
                team_churn: rec.team_churn_last_4w,
                blocked_days: rec.blocked_days_last_2w,
                unplanned_ratio: rec.unplanned_work_ratio_last_4w,
                dependency_count: rec.dependency_count,
                proximity: 0.0,
                earned_value: None,
                cpi: None,
                spi: None,
                milestone_hit_rate: None,
            },
        };

        let ranked = result.ranked_gaps();
        assert_eq!(ranked[0].metric, Metric::ScheduleVariance);
        assert_eq!(ranked[1].metric, Metric::Dependencies);
        assert_eq!(ranked[2].metric, Metric::BlockedDays);
        assert_eq!(
            result.biggest_drag().unwrap().metric,
            Metric::ScheduleVariance
        );
    }
}
