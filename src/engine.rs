//! # Portfolio Engine
//!
//! $$
//! (\text{universe}, P, \text{strategy}) \to
//! (\mathbf{w}^\*, \text{stats}, \text{samples}, \text{frontier})
//! $$
//!
//! Orchestration entry point: builds the returns model once per request,
//! runs the sampler and the frontier against it, dispatches the strategy
//! and assembles the immutable result bundle. The engine holds no state
//! between requests.

use ndarray::Array1;
use tracing::debug;
use tracing::info;

use crate::data::AssetUniverse;
use crate::data::PriceHistory;
use crate::data::PriceSource;
use crate::error::PortfolioError;
use crate::frontier::FrontierPoint;
use crate::frontier::build_frontier;
use crate::metrics::portfolio_stats;
use crate::model::ReturnsModel;
use crate::monte_carlo::sample_portfolios;
use crate::optimizers::max_sharpe;
use crate::optimizers::min_volatility;
use crate::types::OptimizationResult;
use crate::types::PortfolioStats;
use crate::types::Strategy;

/// Tolerance on the sum of externally supplied weights.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-2;

/// Runtime configuration for [`PortfolioEngine`].
#[derive(Clone, Debug)]
pub struct PortfolioEngineConfig {
  /// Risk-free rate used in Sharpe computations.
  pub risk_free: f64,
  /// Number of Monte Carlo draws per request.
  pub monte_carlo_count: usize,
  /// Number of target returns swept by the frontier builder.
  pub frontier_points: usize,
  /// Fixed sampler seed; `None` draws one from entropy per request.
  pub seed: Option<u64>,
}

impl Default for PortfolioEngineConfig {
  fn default() -> Self {
    Self {
      risk_free: 0.02,
      monte_carlo_count: 10_000,
      frontier_points: 100,
      seed: None,
    }
  }
}

/// Single entry-point engine for portfolio optimization requests.
#[derive(Clone, Debug, Default)]
pub struct PortfolioEngine {
  config: PortfolioEngineConfig,
}

impl PortfolioEngine {
  /// Construct a new engine with explicit configuration.
  pub fn new(config: PortfolioEngineConfig) -> Self {
    Self { config }
  }

  /// Borrow engine configuration.
  pub fn config(&self) -> &PortfolioEngineConfig {
    &self.config
  }

  /// Optimize a portfolio for the given strategy from raw price history.
  pub fn optimize(
    &self,
    universe: &AssetUniverse,
    history: &PriceHistory,
    strategy: Strategy,
  ) -> Result<OptimizationResult, PortfolioError> {
    let model = ReturnsModel::from_history(history)?;
    self.optimize_model(universe, &model, strategy)
  }

  /// Optimize with the price history pulled from an injected source.
  pub fn optimize_from_source(
    &self,
    source: &dyn PriceSource,
    universe: &AssetUniverse,
    strategy: Strategy,
  ) -> Result<OptimizationResult, PortfolioError> {
    let history = source.price_history(universe)?;
    self.optimize(universe, &history, strategy)
  }

  /// Optimize against a pre-built returns model.
  pub fn optimize_model(
    &self,
    universe: &AssetUniverse,
    model: &ReturnsModel,
    strategy: Strategy,
  ) -> Result<OptimizationResult, PortfolioError> {
    self.check_dimensions(universe, model.n_assets())?;

    let seed = self.config.seed.unwrap_or_else(rand::random);
    info!(
      strategy = %strategy,
      assets = universe.len(),
      draws = self.config.monte_carlo_count,
      "optimizing portfolio"
    );

    let monte_carlo =
      sample_portfolios(model, self.config.risk_free, self.config.monte_carlo_count, seed)?;
    let frontier = build_frontier(model, self.config.frontier_points, self.config.risk_free);

    let weights = match strategy {
      Strategy::MaxSharpe => max_sharpe(model, self.config.risk_free)?,
      Strategy::MinVolatility => min_volatility(model)?,
      Strategy::MonteCarloBest => {
        let best = monte_carlo.best_sharpe().ok_or(
          PortfolioError::OptimizerConvergence {
            strategy: "monte_carlo",
          },
        )?;
        monte_carlo.weights()[best].clone()
      }
    };

    let stats = portfolio_stats(&weights, model, self.config.risk_free);
    debug!(
      expected_return = stats.expected_return,
      volatility = stats.volatility,
      sharpe = stats.sharpe,
      frontier_points = frontier.len(),
      "optimal portfolio found"
    );

    Ok(OptimizationResult {
      strategy,
      tickers: universe.tickers().to_vec(),
      weights,
      stats,
      monte_carlo,
      frontier,
    })
  }

  /// Efficient frontier alone, without strategy dispatch or sampling.
  pub fn frontier(
    &self,
    universe: &AssetUniverse,
    history: &PriceHistory,
  ) -> Result<Vec<FrontierPoint>, PortfolioError> {
    let model = ReturnsModel::from_history(history)?;
    self.check_dimensions(universe, model.n_assets())?;
    Ok(build_frontier(&model, self.config.frontier_points, self.config.risk_free))
  }

  /// Statistics for externally supplied weights.
  ///
  /// Weights must match the universe length, lie in [0, 1] and sum to one
  /// within [`WEIGHT_SUM_TOLERANCE`].
  pub fn stats_for_weights(
    &self,
    universe: &AssetUniverse,
    history: &PriceHistory,
    weights: &[f64],
  ) -> Result<PortfolioStats, PortfolioError> {
    let weights = validate_weights(universe.len(), weights)?;
    let model = ReturnsModel::from_history(history)?;
    self.check_dimensions(universe, model.n_assets())?;
    Ok(portfolio_stats(&weights, &model, self.config.risk_free))
  }

  fn check_dimensions(
    &self,
    universe: &AssetUniverse,
    n_assets: usize,
  ) -> Result<(), PortfolioError> {
    if universe.len() != n_assets {
      return Err(PortfolioError::InvalidUniverse(format!(
        "universe has {} tickers but the model covers {} assets",
        universe.len(),
        n_assets
      )));
    }
    Ok(())
  }
}

fn validate_weights(n: usize, weights: &[f64]) -> Result<Array1<f64>, PortfolioError> {
  if weights.len() != n {
    return Err(PortfolioError::InvalidWeights(format!(
      "expected {n} weights, got {}",
      weights.len()
    )));
  }
  if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0 || **w > 1.0) {
    return Err(PortfolioError::InvalidWeights(format!(
      "weight {w} is outside [0, 1]"
    )));
  }
  let sum: f64 = weights.iter().sum();
  if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
    return Err(PortfolioError::InvalidWeights(format!(
      "weights sum to {sum}, expected 1"
    )));
  }
  Ok(Array1::from_iter(weights.iter().copied()))
}

#[cfg(test)]
mod tests {
  use chrono::Duration;
  use chrono::NaiveDate;

  use super::*;
  use crate::data::InMemoryPriceSource;

  fn universe() -> AssetUniverse {
    AssetUniverse::new(["AAA", "BBB"]).unwrap()
  }

  // Deterministic oscillating series with distinct drift and amplitude
  // per asset, so the covariance is non-degenerate.
  fn fixture_history(universe: &AssetUniverse) -> PriceHistory {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let rows = (0..60)
      .map(|t| {
        let x = t as f64;
        let a = 100.0 * (0.002 * x).exp() * (1.0 + 0.03 * (x * 0.9).sin());
        let b = 80.0 * (0.001 * x).exp() * (1.0 + 0.05 * (x * 1.7).cos());
        (start + Duration::days(t), vec![a, b])
      })
      .collect();
    PriceHistory::new(universe, rows).unwrap()
  }

  fn engine() -> PortfolioEngine {
    PortfolioEngine::new(PortfolioEngineConfig {
      risk_free: 0.02,
      monte_carlo_count: 500,
      frontier_points: 10,
      seed: Some(42),
    })
  }

  #[test]
  fn optimize_is_idempotent_under_a_fixed_seed() {
    let universe = universe();
    let history = fixture_history(&universe);
    let engine = engine();

    let a = engine.optimize(&universe, &history, Strategy::MaxSharpe).unwrap();
    let b = engine.optimize(&universe, &history, Strategy::MaxSharpe).unwrap();

    assert_eq!(a.weights, b.weights);
    assert_eq!(a.stats, b.stats);
    assert_eq!(a.monte_carlo.stats(), b.monte_carlo.stats());
    assert_eq!(a.frontier.len(), b.frontier.len());
  }

  #[test]
  fn every_strategy_returns_simplex_weights() {
    let universe = universe();
    let history = fixture_history(&universe);
    let engine = engine();

    for strategy in [Strategy::MaxSharpe, Strategy::MinVolatility, Strategy::MonteCarloBest] {
      let result = engine.optimize(&universe, &history, strategy).unwrap();
      assert_eq!(result.strategy, strategy);
      assert_eq!(result.tickers, universe.tickers());
      assert!((result.weights.sum() - 1.0).abs() < 1e-9);
      assert_eq!(result.monte_carlo.len(), 500);
    }
  }

  #[test]
  fn monte_carlo_best_picks_a_sampled_portfolio() {
    let universe = universe();
    let history = fixture_history(&universe);
    let result = engine()
      .optimize(&universe, &history, Strategy::MonteCarloBest)
      .unwrap();

    let best = result.monte_carlo.best_sharpe().unwrap();
    assert_eq!(result.weights, result.monte_carlo.weights()[best]);
  }

  #[test]
  fn optimize_from_source_pulls_aligned_history() {
    let universe = universe();
    let mut source = InMemoryPriceSource::new();
    let history = fixture_history(&universe);
    for (i, ticker) in universe.tickers().iter().enumerate() {
      source.insert_series(
        ticker,
        history
          .dates()
          .iter()
          .enumerate()
          .map(|(t, &date)| (date, history.prices()[[t, i]])),
      );
    }

    let result = engine()
      .optimize_from_source(&source, &universe, Strategy::MinVolatility)
      .unwrap();
    assert_eq!(result.tickers, universe.tickers());
  }

  #[test]
  fn custom_weight_validation_rejects_bad_vectors() {
    let universe = universe();
    let history = fixture_history(&universe);
    let engine = engine();

    let err = engine.stats_for_weights(&universe, &history, &[1.0]).unwrap_err();
    assert!(matches!(err, PortfolioError::InvalidWeights(_)));

    let err = engine
      .stats_for_weights(&universe, &history, &[0.8, 0.8])
      .unwrap_err();
    assert!(matches!(err, PortfolioError::InvalidWeights(_)));

    let err = engine
      .stats_for_weights(&universe, &history, &[-0.2, 1.2])
      .unwrap_err();
    assert!(matches!(err, PortfolioError::InvalidWeights(_)));
  }

  #[test]
  fn custom_weights_within_tolerance_are_accepted() {
    let universe = universe();
    let history = fixture_history(&universe);
    let stats = engine()
      .stats_for_weights(&universe, &history, &[0.503, 0.5])
      .unwrap();
    assert!(stats.volatility >= 0.0);
  }

  #[test]
  fn zero_draw_configuration_is_rejected() {
    let universe = universe();
    let history = fixture_history(&universe);
    let engine = PortfolioEngine::new(PortfolioEngineConfig {
      monte_carlo_count: 0,
      ..PortfolioEngineConfig::default()
    });

    let err = engine
      .optimize(&universe, &history, Strategy::MaxSharpe)
      .unwrap_err();
    assert!(matches!(err, PortfolioError::InsufficientData(_)));
  }
}
