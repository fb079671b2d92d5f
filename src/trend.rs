/// Week-over-week health deltas. The first week has no prior to compare
/// against and is pinned to 0.
pub fn deltas(health_scores: &[f64]) -> Vec<f64> {
    health_scores
        .iter()
        .enumerate()
        .map(|(i, score)| if i == 0 { 0.0 } else { score - health_scores[i - 1] })
        .collect()
}
