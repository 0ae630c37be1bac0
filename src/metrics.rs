//! # Portfolio Metrics
//!
//! $$
//! \mu_p = \mu^\top \mathbf{w}, \qquad
//! \sigma_p = \sqrt{\mathbf{w}^\top \Sigma \mathbf{w}}, \qquad
//! S = \frac{\mu_p - r_f}{\sigma_p}
//! $$

use ndarray::Array1;

use crate::model::ReturnsModel;
use crate::types::PortfolioStats;

/// Volatility below this floor is treated as zero.
pub(crate) const VOL_FLOOR: f64 = 1e-12;

/// Closed-form statistics for a weight vector against a returns model.
///
/// The quadratic form is clamped at zero before the square root so
/// floating-point noise cannot produce a negative variance. A portfolio
/// with numerically zero volatility reports a Sharpe ratio of 0.0; the
/// optimizers never select such a candidate.
pub fn portfolio_stats(
  weights: &Array1<f64>,
  model: &ReturnsModel,
  risk_free: f64,
) -> PortfolioStats {
  let expected_return = model.mean_return().dot(weights);
  let variance = weights.dot(&model.covariance().dot(weights));
  let volatility = variance.max(0.0).sqrt();
  let sharpe = if volatility > VOL_FLOOR {
    (expected_return - risk_free) / volatility
  } else {
    0.0
  };

  PortfolioStats {
    expected_return,
    volatility,
    sharpe,
  }
}

#[cfg(test)]
mod tests {
  use ndarray::array;

  use super::*;

  fn diag_model() -> ReturnsModel {
    ReturnsModel::from_moments(array![0.10, 0.20], array![[0.04, 0.0], [0.0, 0.09]])
      .unwrap()
  }

  #[test]
  fn uniform_weights_average_the_mean_returns() {
    let model = diag_model();
    let weights = array![0.5, 0.5];
    let stats = portfolio_stats(&weights, &model, 0.02);

    assert!((stats.expected_return - 0.15).abs() < 1e-12);
    assert!(stats.volatility >= 0.0);
  }

  #[test]
  fn single_asset_weights_recover_asset_moments() {
    let model = diag_model();
    let stats = portfolio_stats(&array![1.0, 0.0], &model, 0.02);

    assert!((stats.expected_return - 0.10).abs() < 1e-12);
    assert!((stats.volatility - 0.20).abs() < 1e-12);
    assert!((stats.sharpe - 0.40).abs() < 1e-12);
  }

  #[test]
  fn zero_volatility_reports_zero_sharpe() {
    let model =
      ReturnsModel::from_moments(array![0.10, 0.20], array![[0.0, 0.0], [0.0, 0.0]])
        .unwrap();
    let stats = portfolio_stats(&array![0.5, 0.5], &model, 0.02);

    assert_eq!(stats.volatility, 0.0);
    assert_eq!(stats.sharpe, 0.0);
  }
}
