//! # Monte Carlo Sampler
//!
//! $$
//! w_i = \frac{u_i}{\sum_j u_j}, \qquad u_i \sim \mathcal{U}(0,1)
//! $$
//!
//! Random exploration of the weight simplex. Normalizing independent
//! uniforms biases draws toward the interior relative to a true
//! uniform-simplex sampler; that is an accepted property of this sampler,
//! whose job is broad coverage for visualization and fallback selection,
//! not unbiased estimation.

use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray_rand::RandomExt;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::Uniform;
use rayon::prelude::*;

use crate::error::PortfolioError;
use crate::metrics::portfolio_stats;
use crate::model::ReturnsModel;

/// One batch of random portfolios with their statistics.
///
/// `stats` is 4×count: row 0 expected return, row 1 volatility, row 2
/// Sharpe ratio, row 3 draw index.
#[derive(Clone, Debug)]
pub struct MonteCarloSample {
  stats: Array2<f64>,
  weights: Vec<Array1<f64>>,
}

impl MonteCarloSample {
  /// 4×count statistics matrix.
  pub fn stats(&self) -> &Array2<f64> {
    &self.stats
  }

  /// Drawn weight vectors, indexed by draw.
  pub fn weights(&self) -> &[Array1<f64>] {
    &self.weights
  }

  /// Number of draws.
  pub fn len(&self) -> usize {
    self.weights.len()
  }

  pub fn is_empty(&self) -> bool {
    self.weights.is_empty()
  }

  /// Expected returns per draw.
  pub fn returns(&self) -> ArrayView1<'_, f64> {
    self.stats.row(0)
  }

  /// Volatilities per draw.
  pub fn volatilities(&self) -> ArrayView1<'_, f64> {
    self.stats.row(1)
  }

  /// Sharpe ratios per draw.
  pub fn sharpes(&self) -> ArrayView1<'_, f64> {
    self.stats.row(2)
  }

  /// Index of the draw with the highest finite Sharpe ratio. Non-finite
  /// entries are skipped, never selected.
  pub fn best_sharpe(&self) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &sharpe) in self.sharpes().iter().enumerate() {
      if !sharpe.is_finite() {
        continue;
      }
      if best.map_or(true, |(_, b)| sharpe > b) {
        best = Some((i, sharpe));
      }
    }
    best.map(|(i, _)| i)
  }
}

/// Draw `count` random portfolios and evaluate each against the model.
///
/// Draws are independent and run in parallel; determinism under a fixed
/// `seed` is preserved by deriving a per-draw RNG from the seed and the
/// draw index, so scheduling order cannot change the output.
pub fn sample_portfolios(
  model: &ReturnsModel,
  risk_free: f64,
  count: usize,
  seed: u64,
) -> Result<MonteCarloSample, PortfolioError> {
  if count == 0 {
    return Err(PortfolioError::InsufficientData(
      "monte carlo sampling needs at least one draw".to_string(),
    ));
  }

  let n = model.n_assets();
  let draws: Vec<(Array1<f64>, f64, f64, f64)> = (0..count)
    .into_par_iter()
    .map(|i| {
      let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
      let mut weights = Array1::random_using(n, Uniform::new(0.0, 1.0), &mut rng);
      let total = weights.sum();
      if total > 1e-12 {
        weights /= total;
      } else {
        weights.fill(1.0 / n as f64);
      }
      let stats = portfolio_stats(&weights, model, risk_free);
      (weights, stats.expected_return, stats.volatility, stats.sharpe)
    })
    .collect();

  let mut stats = Array2::zeros((4, count));
  let mut weights = Vec::with_capacity(count);
  for (i, (w, ret, vol, sharpe)) in draws.into_iter().enumerate() {
    stats[[0, i]] = ret;
    stats[[1, i]] = vol;
    stats[[2, i]] = sharpe;
    stats[[3, i]] = i as f64;
    weights.push(w);
  }

  Ok(MonteCarloSample { stats, weights })
}
