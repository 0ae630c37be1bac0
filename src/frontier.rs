//! # Efficient Frontier
//!
//! $$
//! \sigma^\*(r) = \min_{\mathbf{w}\in\Delta^{N-1},\ \mu^\top\mathbf{w}=r}
//! \sqrt{\mathbf{w}^\top \Sigma \mathbf{w}}
//! $$

use ndarray::Array1;
use ndarray_stats::QuantileExt;
use rayon::prelude::*;
use tracing::debug;

use crate::metrics::portfolio_stats;
use crate::model::ReturnsModel;
use crate::optimizers::min_volatility_for_target;

/// One feasible minimum-variance portfolio at a target return.
#[derive(Clone, Debug)]
pub struct FrontierPoint {
  /// Target return this point was solved for.
  pub target_return: f64,
  /// Volatility of the minimum-variance portfolio at the target.
  pub volatility: f64,
  /// Sharpe ratio of that portfolio.
  pub sharpe: f64,
  /// Weight vector of that portfolio.
  pub weights: Array1<f64>,
}

/// Trace the efficient frontier over `num_points` target returns linearly
/// spaced (inclusive) between the smallest and largest asset mean return.
///
/// Targets where the solver fails are dropped, so the output may be
/// shorter than `num_points`. Points come back ordered by ascending
/// target return; volatility is NOT guaranteed monotone and the output is
/// never re-sorted.
pub fn build_frontier(
  model: &ReturnsModel,
  num_points: usize,
  risk_free: f64,
) -> Vec<FrontierPoint> {
  if num_points == 0 {
    return Vec::new();
  }

  let mean = model.mean_return();
  let (lo, hi) = match (mean.min(), mean.max()) {
    (Ok(&lo), Ok(&hi)) => (lo, hi),
    _ => return Vec::new(),
  };

  let targets = Array1::linspace(lo, hi, num_points);
  let points: Vec<FrontierPoint> = targets
    .to_vec()
    .into_par_iter()
    .map(|target| {
      min_volatility_for_target(model, target).map(|weights| {
        let stats = portfolio_stats(&weights, model, risk_free);
        FrontierPoint {
          target_return: target,
          volatility: stats.volatility,
          sharpe: stats.sharpe,
          weights,
        }
      })
    })
    .collect::<Vec<Option<FrontierPoint>>>()
    .into_iter()
    .flatten()
    .collect();

  let dropped = num_points - points.len();
  if dropped > 0 {
    debug!(dropped, num_points, "frontier targets failed to converge");
  }

  points
}

#[cfg(test)]
mod tests {
  use ndarray::array;

  use super::*;
  use crate::optimizers::TARGET_TOLERANCE;

  fn diag_model() -> ReturnsModel {
    ReturnsModel::from_moments(array![0.10, 0.20], array![[0.04, 0.0], [0.0, 0.09]])
      .unwrap()
  }

  #[test]
  fn frontier_points_satisfy_their_targets() {
    let model = diag_model();
    let frontier = build_frontier(&model, 11, 0.02);

    assert!(frontier.len() >= 6);
    for point in &frontier {
      let achieved = model.mean_return().dot(&point.weights);
      assert!((achieved - point.target_return).abs() <= TARGET_TOLERANCE);
      assert!((point.weights.sum() - 1.0).abs() < 1e-9);
      assert!(point.weights.iter().all(|&w| (0.0..=1.0).contains(&w)));
      assert!(point.volatility >= 0.0);
    }
  }

  #[test]
  fn frontier_is_ordered_by_target_return() {
    let frontier = build_frontier(&diag_model(), 11, 0.02);
    for pair in frontier.windows(2) {
      assert!(pair[0].target_return < pair[1].target_return);
    }
  }

  #[test]
  fn frontier_spans_the_attainable_return_range() {
    let frontier = build_frontier(&diag_model(), 11, 0.02);
    for point in &frontier {
      assert!(point.target_return >= 0.10 - 1e-12);
      assert!(point.target_return <= 0.20 + 1e-12);
    }
  }

  #[test]
  fn zero_points_give_an_empty_frontier() {
    assert!(build_frontier(&diag_model(), 0, 0.02).is_empty());
  }
}
