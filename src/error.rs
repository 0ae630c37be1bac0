//! # Errors
//!
//! $$
//! \text{request} \to \text{result} \ \lor \ \text{typed failure}
//! $$
//!
//! Failure taxonomy for the optimization core. Every failure is terminal
//! for its request; nothing is retried inside the crate.

use thiserror::Error;

/// Typed failures reported by the portfolio core.
#[derive(Debug, Error)]
pub enum PortfolioError {
  /// The asset universe cannot support an optimization (fewer than two
  /// tickers, duplicates, or model dimensions that do not line up).
  #[error("invalid universe: {0}")]
  InvalidUniverse(String),

  /// Not enough aligned observations to build a returns model.
  #[error("insufficient data: {0}")]
  InsufficientData(String),

  /// A required optimization (max-Sharpe or min-volatility) failed to
  /// converge. Frontier targets are exempt: those are dropped locally.
  #[error("optimizer failed to converge for `{strategy}`")]
  OptimizerConvergence {
    /// Name of the optimization problem that failed.
    strategy: &'static str,
  },

  /// Externally supplied weights violate the simplex invariant.
  #[error("invalid weights: {0}")]
  InvalidWeights(String),

  /// Unrecognized strategy tag, rejected at the parse boundary.
  #[error("unknown strategy `{0}`")]
  UnknownStrategy(String),
}
