use std::fmt::Write;

use crate::models::{ProjectSeries, ScoreResult};

/// Health bands, highest first. The label feeds the narrative templates.
const HEALTH_BANDS: [(f64, &str); 3] = [
    (80.0, "on track"),
    (60.0, "under watch"),
    (0.0, "at risk"),
];

const CONFIDENCE_BANDS: [(f64, &str); 3] = [
    (75.0, "steady"),
    (50.0, "shaky"),
    (0.0, "unreliable"),
];

pub fn health_band(score: f64) -> &'static str {
    band(&HEALTH_BANDS, score)
}

pub fn confidence_band(score: f64) -> &'static str {
    band(&CONFIDENCE_BANDS, score)
}

fn band(bands: &[(f64, &'static str)], score: f64) -> &'static str {
    bands
        .iter()
        .find(|(floor, _)| score >= *floor)
        .map(|(_, label)| *label)
        .unwrap_or(bands[bands.len() - 1].1)
}

/// The largest confidence penalty and a phrase describing it, if any
/// penalty bites at all.
fn dominant_penalty(result: &ScoreResult) -> Option<(&'static str, f64)> {
    let c = &result.confidence;
    let candidates = [
        ("an erratic forecast", c.cov_penalty),
        ("requirement churn", c.churn_penalty),
        ("backlog growth", c.backlog_penalty),
        ("schedule slip", c.slip_penalty),
    ];
    candidates
        .into_iter()
        .filter(|(_, points)| *points > 0.0)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}

/// One-sentence summary of a scored week. Deterministic over the result's
/// numbers only, so wording never depends on anything outside the score.
pub fn narrative(result: &ScoreResult, trend_delta: f64) -> String {
    let mut text = format!(
        "{} is {} at {:.1}/100",
        result.project_name,
        health_band(result.health_score),
        result.health_score,
    );

    if trend_delta.abs() >= 0.05 {
        let _ = write!(text, " ({:+.1} this week)", trend_delta);
    }

    if let Some(drag) = result.biggest_drag() {
        if drag.gap() > 0.0 {
            let _ = write!(
                text,
                "; biggest drag is {} (-{:.1} pts)",
                drag.metric,
                drag.gap()
            );
        }
    }

    let _ = write!(
        text,
        ". Forecast confidence is {} at {:.1}/100",
        confidence_band(result.confidence_score),
        result.confidence_score,
    );
    if let Some((phrase, points)) = dominant_penalty(result) {
        let _ = write!(text, ", led down by {} (-{:.1} pts)", phrase, points);
    }
    text.push('.');
    text
}

/// Markdown report over a scored portfolio. Projects are listed worst
/// health first.
pub fn build_report(portfolio: &[ProjectSeries]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Portfolio Health Report");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Portfolio");

    if portfolio.is_empty() {
        let _ = writeln!(output, "No scored projects.");
        return output;
    }

    let mut order: Vec<(&ProjectSeries, &ScoreResult)> = portfolio
        .iter()
        .filter_map(|s| s.latest().map(|latest| (s, latest)))
        .collect();
    order.sort_by(|(_, a), (_, b)| {
        a.health_score
            .partial_cmp(&b.health_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for (series, latest) in &order {
        let _ = writeln!(
            output,
            "- {} ({}): health {:.1} ({:+.1}), confidence {:.1}",
            series.project_name,
            series.project_id,
            latest.health_score,
            series.latest_trend(),
            latest.confidence_score,
        );
    }

    for (series, latest) in &order {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {} ({})", series.project_name, series.project_id);
        let _ = writeln!(
            output,
            "Week ending {}, {} weeks of history.",
            latest.week_ending,
            series.results.len()
        );
        let _ = writeln!(output);
        let _ = writeln!(output, "{}", narrative(latest, series.latest_trend()));
        let _ = writeln!(output);
        let _ = writeln!(output, "Largest gaps:");
        for drag in latest.ranked_gaps().iter().take(3) {
            let _ = writeln!(
                output,
                "- {}: {:.1} of {:.1} pts earned (gap {:.1})",
                drag.metric,
                drag.contribution,
                drag.max_contribution,
                drag.gap()
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine;
    use crate::models::fixtures;
    use crate::thresholds::ThresholdSet;
    use chrono::NaiveDate;

    fn scored_portfolio() -> Vec<ProjectSeries> {
        let mut w1 = fixtures::record();
        w1.week_ending = NaiveDate::from_ymd_opt(2026, 2, 27).unwrap();
        w1.blocked_days_last_2w = 8;
        let w2 = fixtures::record();
        engine::score_portfolio(&[w1, w2], &ThresholdSet::default())
    }

    #[test]
    fn bands_cover_the_scale() {
        assert_eq!(health_band(92.0), "on track");
        assert_eq!(health_band(71.0), "under watch");
        assert_eq!(health_band(12.0), "at risk");
        assert_eq!(confidence_band(97.25), "steady");
        assert_eq!(confidence_band(55.0), "shaky");
        assert_eq!(confidence_band(10.0), "unreliable");
    }

    #[test]
    fn narrative_is_deterministic_and_names_the_drag() {
        let portfolio = scored_portfolio();
        let latest = portfolio[0].latest().unwrap();
        let trend = portfolio[0].latest_trend();

        let a = narrative(latest, trend);
        let b = narrative(latest, trend);
        assert_eq!(a, b);
        assert!(a.contains("Phoenix"));
        let drag = latest.biggest_drag().unwrap();
        assert!(a.contains(drag.metric.label()));
    }

    #[test]
    fn narrative_names_the_dominant_confidence_penalty() {
        let portfolio = scored_portfolio();
        let latest = portfolio[0].latest().unwrap();
        // Fixture week: churn penalty (2.0) outweighs slip (0.75).
        let text = narrative(latest, 0.0);
        assert!(text.contains("requirement churn"));
    }

    #[test]
    fn report_lists_every_project_and_its_gaps() {
        let portfolio = scored_portfolio();
        let report = build_report(&portfolio);
        assert!(report.contains("# Portfolio Health Report"));
        assert!(report.contains("Phoenix (PRJ-001)"));
        assert!(report.contains("Largest gaps:"));
        assert!(report.contains("2 weeks of history"));
    }

    #[test]
    fn empty_portfolio_reports_nothing_scored() {
        let report = build_report(&[]);
        assert!(report.contains("No scored projects."));
    }
}
