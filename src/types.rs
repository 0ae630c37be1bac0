//! # Result Types
//!
//! $$
//! \mathbf{w}^\* = \arg\max_{\mathbf{w}} \frac{\mu^\top\mathbf{w} - r_f}{\sigma_p}
//! $$
//!
//! Strategy enum and result containers returned to the caller.

use std::fmt;
use std::str::FromStr;

use ndarray::Array1;

use crate::error::PortfolioError;
use crate::frontier::FrontierPoint;
use crate::monte_carlo::MonteCarloSample;

/// Supported optimization strategies. A closed set: unrecognized tags are
/// rejected when parsing, never forwarded into the optimizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
  /// Maximize the Sharpe ratio.
  MaxSharpe,
  /// Minimize portfolio volatility.
  MinVolatility,
  /// Take the best-Sharpe draw from the Monte Carlo sample.
  MonteCarloBest,
}

impl Strategy {
  /// Canonical tag for this strategy.
  pub fn as_str(&self) -> &'static str {
    match self {
      Strategy::MaxSharpe => "max_sharpe",
      Strategy::MinVolatility => "min_volatility",
      Strategy::MonteCarloBest => "monte_carlo",
    }
  }
}

impl fmt::Display for Strategy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Strategy {
  type Err = PortfolioError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "max_sharpe" | "max-sharpe" | "maxsharpe" => Ok(Self::MaxSharpe),
      "min_volatility" | "min-volatility" | "minvolatility" | "min_vol" => {
        Ok(Self::MinVolatility)
      }
      "monte_carlo" | "monte-carlo" | "montecarlo" => Ok(Self::MonteCarloBest),
      _ => Err(PortfolioError::UnknownStrategy(s.to_string())),
    }
  }
}

/// Closed-form statistics of one portfolio.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PortfolioStats {
  /// Annualized expected portfolio return.
  pub expected_return: f64,
  /// Annualized portfolio volatility, never negative.
  pub volatility: f64,
  /// Sharpe ratio, `(expected_return - risk_free) / volatility`.
  pub sharpe: f64,
}

/// Immutable bundle returned by [`crate::PortfolioEngine::optimize`].
#[derive(Clone, Debug)]
pub struct OptimizationResult {
  /// Strategy that produced the optimal weights.
  pub strategy: Strategy,
  /// Tickers in weight order.
  pub tickers: Vec<String>,
  /// Optimal weight vector on the simplex.
  pub weights: Array1<f64>,
  /// Statistics of the optimal portfolio.
  pub stats: PortfolioStats,
  /// Full Monte Carlo sample set, for downstream reporting.
  pub monte_carlo: MonteCarloSample,
  /// Efficient frontier, ascending by target return.
  pub frontier: Vec<FrontierPoint>,
}

impl OptimizationResult {
  /// Weights paired with their tickers, in universe order.
  pub fn weights_by_ticker(&self) -> Vec<(&str, f64)> {
    self
      .tickers
      .iter()
      .map(String::as_str)
      .zip(self.weights.iter().copied())
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn strategy_parses_known_tags() {
    assert_eq!("max_sharpe".parse::<Strategy>().unwrap(), Strategy::MaxSharpe);
    assert_eq!("Min-Volatility".parse::<Strategy>().unwrap(), Strategy::MinVolatility);
    assert_eq!(" monte_carlo ".parse::<Strategy>().unwrap(), Strategy::MonteCarloBest);
  }

  #[test]
  fn strategy_rejects_unknown_tags() {
    let err = "risk_parity".parse::<Strategy>().unwrap_err();
    assert!(matches!(err, PortfolioError::UnknownStrategy(_)));
  }

  #[test]
  fn strategy_display_round_trips() {
    for strategy in [Strategy::MaxSharpe, Strategy::MinVolatility, Strategy::MonteCarloBest] {
      assert_eq!(strategy.to_string().parse::<Strategy>().unwrap(), strategy);
    }
  }
}
