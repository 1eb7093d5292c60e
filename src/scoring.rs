//! CEPS score aggregation.
//!
//! Combines the per-dimension agent results into one weighted overall
//! score. Dimensions that did not succeed lose their weight, and the
//! remaining weights are renormalized proportionally so they still sum to
//! 1.0. Pure: no I/O, no side effects, order-independent input.

use crate::models::{
    AgentResult, AgentStatus, CepsResult, Dimension, DimensionScore, Grade, RunStats,
};
use chrono::Utc;
use std::collections::HashMap;

/// Fixed base weights; sum to 1.0 by construction.
pub const WEIGHTS: [(Dimension, f64); 5] = [
    (Dimension::Text, 0.25),
    (Dimension::Ux, 0.25),
    (Dimension::Trust, 0.20),
    (Dimension::Tech, 0.15),
    (Dimension::Visual, 0.15),
];

/// Base weight for one dimension.
pub fn base_weight(dimension: Dimension) -> f64 {
    WEIGHTS
        .iter()
        .find(|(d, _)| *d == dimension)
        .map(|(_, w)| *w)
        .unwrap_or(0.0)
}

/// Aggregate agent results into the final [`CepsResult`].
///
/// Tolerates any subset of dimensions being absent or non-successful; if
/// nothing succeeded the result carries `no_data` and score 0 rather than
/// a division by zero.
pub fn aggregate(
    url: &str,
    results: HashMap<Dimension, AgentResult>,
    stats: RunStats,
) -> CepsResult {
    let successful_weight: f64 = Dimension::ALL
        .iter()
        .filter(|dim| {
            results
                .get(dim)
                .map(|r| r.status.is_success())
                .unwrap_or(false)
        })
        .map(|dim| base_weight(*dim))
        .sum();

    let no_data = successful_weight <= 0.0;

    let mut dimensions = Vec::new();
    let mut failed_dimensions = Vec::new();
    let mut overall = 0.0;

    for dim in Dimension::ALL {
        match results.get(&dim) {
            Some(result) if result.status.is_success() => {
                let weight = base_weight(dim) / successful_weight;
                overall += result.score * weight;
                dimensions.push(DimensionScore {
                    dimension: dim,
                    score: Some(result.score),
                    weight_applied: weight,
                    status: AgentStatus::Success,
                });
            }
            Some(result) => {
                failed_dimensions.push(dim);
                dimensions.push(DimensionScore {
                    dimension: dim,
                    score: None,
                    weight_applied: 0.0,
                    status: result.status,
                });
            }
            // Not requested for this run.
            None => {}
        }
    }

    let overall_score = if no_data {
        0.0
    } else {
        (overall * 10.0).round() / 10.0
    };

    CepsResult {
        url: url.to_string(),
        analyzed_at: Utc::now(),
        overall_score,
        grade: Grade::from_score(overall_score),
        no_data,
        dimensions,
        results,
        failed_dimensions,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AgentResult;

    fn success(dimension: Dimension, score: f64) -> (Dimension, AgentResult) {
        (
            dimension,
            AgentResult::success(dimension, score, Vec::new(), String::new()),
        )
    }

    fn full_result_set() -> HashMap<Dimension, AgentResult> {
        HashMap::from([
            success(Dimension::Text, 80.0),
            success(Dimension::Ux, 90.0),
            success(Dimension::Tech, 70.0),
            success(Dimension::Trust, 100.0),
            success(Dimension::Visual, 60.0),
        ])
    }

    #[test]
    fn test_base_weights_sum_to_one() {
        let total: f64 = WEIGHTS.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_success_example() {
        // 0.25*80 + 0.25*90 + 0.15*70 + 0.20*100 + 0.15*60 = 82.0
        let result = aggregate("https://example.com", full_result_set(), RunStats::default());

        assert_eq!(result.overall_score, 82.0);
        assert_eq!(result.grade, Grade::B);
        assert!(!result.no_data);
        assert!(result.failed_dimensions.is_empty());

        let weight_sum: f64 = result.dimensions.iter().map(|d| d.weight_applied).sum();
        assert!((weight_sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_failed_visual_renormalizes_proportionally() {
        let mut results = full_result_set();
        results.insert(
            Dimension::Visual,
            AgentResult::failed(Dimension::Visual, "provider error"),
        );

        let result = aggregate("https://example.com", results, RunStats::default());

        assert_eq!(result.failed_dimensions, vec![Dimension::Visual]);

        // Remaining weights scale by 1/0.85.
        let text = result
            .dimensions
            .iter()
            .find(|d| d.dimension == Dimension::Text)
            .unwrap();
        assert!((text.weight_applied - 0.25 / 0.85).abs() < 1e-9);

        let weight_sum: f64 = result.dimensions.iter().map(|d| d.weight_applied).sum();
        assert!((weight_sum - 1.0).abs() < 1e-9);

        // (0.25*80 + 0.25*90 + 0.15*70 + 0.20*100) / 0.85 = 73.0/0.85
        let expected = ((73.0 / 0.85) * 10.0_f64).round() / 10.0;
        assert_eq!(result.overall_score, expected);
    }

    #[test]
    fn test_all_failed_yields_no_data_marker() {
        let results = HashMap::from([
            (
                Dimension::Text,
                AgentResult::failed(Dimension::Text, "boom"),
            ),
            (Dimension::Visual, AgentResult::timed_out(Dimension::Visual)),
            (Dimension::Ux, AgentResult::skipped(Dimension::Ux)),
        ]);

        let result = aggregate("https://example.com", results, RunStats::default());

        assert!(result.no_data);
        assert_eq!(result.overall_score, 0.0);
        assert_eq!(result.grade, Grade::F);
        assert_eq!(result.failed_dimensions.len(), 3);
    }

    #[test]
    fn test_empty_result_map_yields_no_data() {
        let result = aggregate("https://example.com", HashMap::new(), RunStats::default());
        assert!(result.no_data);
        assert_eq!(result.overall_score, 0.0);
    }

    #[test]
    fn test_skipped_and_timed_out_distinguished_in_report() {
        let mut results = full_result_set();
        results.insert(Dimension::Tech, AgentResult::timed_out(Dimension::Tech));
        results.insert(Dimension::Trust, AgentResult::skipped(Dimension::Trust));

        let result = aggregate("https://example.com", results, RunStats::default());

        let status_of = |dim: Dimension| {
            result
                .dimensions
                .iter()
                .find(|d| d.dimension == dim)
                .unwrap()
                .status
        };
        assert_eq!(status_of(Dimension::Tech), AgentStatus::TimedOut);
        assert_eq!(status_of(Dimension::Trust), AgentStatus::Skipped);
        // Both lose their weight identically.
        assert_eq!(
            result
                .dimensions
                .iter()
                .find(|d| d.dimension == Dimension::Tech)
                .unwrap()
                .weight_applied,
            0.0
        );
    }

    #[test]
    fn test_aggregation_is_deterministic() {
        let a = aggregate("https://example.com", full_result_set(), RunStats::default());
        let b = aggregate("https://example.com", full_result_set(), RunStats::default());
        assert_eq!(a.overall_score, b.overall_score);
        assert_eq!(a.grade, b.grade);
    }

    #[test]
    fn test_single_dimension_run() {
        let results = HashMap::from([success(Dimension::Text, 64.0)]);
        let result = aggregate("https://example.com", results, RunStats::default());

        // A lone successful dimension carries the full weight.
        assert_eq!(result.overall_score, 64.0);
        assert_eq!(result.dimensions.len(), 1);
        assert!((result.dimensions[0].weight_applied - 1.0).abs() < 1e-9);
        assert_eq!(result.grade, Grade::D);
    }

    #[test]
    fn test_rounding_to_one_decimal() {
        let results = HashMap::from([
            success(Dimension::Text, 77.77),
            success(Dimension::Ux, 77.77),
            success(Dimension::Tech, 77.77),
            success(Dimension::Trust, 77.77),
            success(Dimension::Visual, 77.77),
        ]);
        let result = aggregate("https://example.com", results, RunStats::default());
        assert_eq!(result.overall_score, 77.8);
    }
}
