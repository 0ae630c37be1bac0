//! # Returns Model
//!
//! $$
//! r_{t,i} = \ln\frac{P_{t+1,i}}{P_{t,i}}, \qquad
//! \mu = 252\,\bar{r}, \qquad \Sigma = 252\,\mathrm{cov}(r)
//! $$
//!
//! Annualized mean-return vector and covariance matrix derived from an
//! aligned price table. Immutable once built.

use ndarray::Array1;
use ndarray::Array2;
use ndarray::Axis;
use ndarray_stats::CorrelationExt;

use crate::data::PriceHistory;
use crate::error::PortfolioError;

/// Annualization factor applied to daily statistics. Fixed policy, not
/// configuration.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Log-return statistics for an asset universe.
#[derive(Clone, Debug)]
pub struct ReturnsModel {
  log_returns: Array2<f64>,
  mean_return: Array1<f64>,
  covariance: Array2<f64>,
}

impl ReturnsModel {
  /// Derive the model from an aligned price history.
  ///
  /// Log returns are used throughout; both the mean vector and the
  /// sample covariance (ddof = 1) are annualized by
  /// [`TRADING_DAYS_PER_YEAR`].
  pub fn from_history(history: &PriceHistory) -> Result<Self, PortfolioError> {
    let prices = history.prices();
    let (t, n) = prices.dim();
    if n < 2 {
      return Err(PortfolioError::InvalidUniverse(format!(
        "need at least 2 assets, got {n}"
      )));
    }
    if t < 2 {
      return Err(PortfolioError::InsufficientData(format!(
        "need at least 2 price rows, got {t}"
      )));
    }

    let log_returns = Array2::from_shape_fn((t - 1, n), |(row, col)| {
      (prices[[row + 1, col]] / prices[[row, col]]).ln()
    });

    let mean_return = log_returns
      .mean_axis(Axis(0))
      .ok_or_else(|| {
        PortfolioError::InsufficientData("no return observations".to_string())
      })?
      * TRADING_DAYS_PER_YEAR;

    // Sample covariance needs two observations; with one the model
    // degenerates to a riskless zero matrix.
    let covariance = if log_returns.nrows() >= 2 {
      let daily = log_returns.t().cov(1.0).map_err(|e| {
        PortfolioError::InsufficientData(format!("covariance failed: {e}"))
      })?;
      daily * TRADING_DAYS_PER_YEAR
    } else {
      Array2::zeros((n, n))
    };

    Ok(Self {
      log_returns,
      mean_return,
      covariance,
    })
  }

  /// Build a model directly from annualized moments, for callers that
  /// carry their own estimates.
  pub fn from_moments(
    mean_return: Array1<f64>,
    covariance: Array2<f64>,
  ) -> Result<Self, PortfolioError> {
    let n = mean_return.len();
    if n < 2 {
      return Err(PortfolioError::InvalidUniverse(format!(
        "need at least 2 assets, got {n}"
      )));
    }
    if covariance.nrows() != n || covariance.ncols() != n {
      return Err(PortfolioError::InvalidUniverse(format!(
        "covariance is {}x{} but the universe has {n} assets",
        covariance.nrows(),
        covariance.ncols()
      )));
    }
    for i in 0..n {
      if covariance[[i, i]] < 0.0 {
        return Err(PortfolioError::InvalidUniverse(
          "covariance diagonal must be non-negative".to_string(),
        ));
      }
      for j in (i + 1)..n {
        if (covariance[[i, j]] - covariance[[j, i]]).abs() > 1e-8 {
          return Err(PortfolioError::InvalidUniverse(
            "covariance must be symmetric".to_string(),
          ));
        }
      }
    }

    Ok(Self {
      log_returns: Array2::zeros((0, n)),
      mean_return,
      covariance,
    })
  }

  /// Number of assets covered by the model.
  pub fn n_assets(&self) -> usize {
    self.mean_return.len()
  }

  /// Number of return observations behind the moments (0 for models built
  /// from moments directly).
  pub fn n_observations(&self) -> usize {
    self.log_returns.nrows()
  }

  /// (T−1)×N log-return matrix.
  pub fn log_returns(&self) -> &Array2<f64> {
    &self.log_returns
  }

  /// Annualized mean return per asset.
  pub fn mean_return(&self) -> &Array1<f64> {
    &self.mean_return
  }

  /// Annualized N×N covariance matrix.
  pub fn covariance(&self) -> &Array2<f64> {
    &self.covariance
  }

  /// Correlation matrix derived from the covariance. Unit diagonal,
  /// off-diagonal entries clamped to [−1, 1], zero where a variance
  /// vanishes.
  pub fn correlation(&self) -> Array2<f64> {
    let n = self.n_assets();
    Array2::from_shape_fn((n, n), |(i, j)| {
      if i == j {
        return 1.0;
      }
      let denom =
        (self.covariance[[i, i]].max(0.0) * self.covariance[[j, j]].max(0.0)).sqrt();
      if denom > 1e-15 {
        (self.covariance[[i, j]] / denom).clamp(-1.0, 1.0)
      } else {
        0.0
      }
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::data::AssetUniverse;

  fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
  }

  fn history(rows: Vec<(NaiveDate, Vec<f64>)>) -> PriceHistory {
    let universe = AssetUniverse::new(["AAA", "BBB"]).unwrap();
    PriceHistory::new(&universe, rows).unwrap()
  }

  #[test]
  fn log_returns_match_price_ratios() {
    let history = history(vec![
      (day(2), vec![100.0, 50.0]),
      (day(3), vec![110.0, 45.0]),
      (day(4), vec![99.0, 54.0]),
    ]);
    let model = ReturnsModel::from_history(&history).unwrap();

    assert_eq!(model.n_observations(), 2);
    assert!((model.log_returns()[[0, 0]] - (110.0f64 / 100.0).ln()).abs() < 1e-12);
    assert!((model.log_returns()[[1, 1]] - (54.0f64 / 45.0).ln()).abs() < 1e-12);
  }

  #[test]
  fn mean_return_is_annualized_average() {
    let history = history(vec![
      (day(2), vec![100.0, 50.0]),
      (day(3), vec![110.0, 45.0]),
      (day(4), vec![99.0, 54.0]),
    ]);
    let model = ReturnsModel::from_history(&history).unwrap();

    let lr = model.log_returns();
    let expected = (lr[[0, 0]] + lr[[1, 0]]) / 2.0 * TRADING_DAYS_PER_YEAR;
    assert!((model.mean_return()[0] - expected).abs() < 1e-10);
  }

  #[test]
  fn covariance_is_symmetric_with_non_negative_diagonal() {
    let history = history(vec![
      (day(2), vec![100.0, 50.0]),
      (day(3), vec![110.0, 45.0]),
      (day(4), vec![99.0, 54.0]),
      (day(5), vec![104.0, 51.0]),
    ]);
    let model = ReturnsModel::from_history(&history).unwrap();
    let cov = model.covariance();

    for i in 0..2 {
      assert!(cov[[i, i]] >= 0.0);
      for j in 0..2 {
        assert!((cov[[i, j]] - cov[[j, i]]).abs() < 1e-12);
      }
    }
  }

  #[test]
  fn single_observation_degenerates_to_zero_covariance() {
    let history = history(vec![
      (day(2), vec![100.0, 50.0]),
      (day(3), vec![110.0, 45.0]),
    ]);
    let model = ReturnsModel::from_history(&history).unwrap();

    assert_eq!(model.n_observations(), 1);
    assert!(model.covariance().iter().all(|&v| v == 0.0));
  }

  #[test]
  fn mirrored_series_correlate_negatively() {
    // AAA gains exactly what BBB loses in log space each day.
    let history = history(vec![
      (day(2), vec![100.0, 50.0]),
      (day(3), vec![110.0, 50.0 / 1.1]),
      (day(4), vec![100.0, 50.0]),
      (day(5), vec![110.0, 50.0 / 1.1]),
    ]);
    let model = ReturnsModel::from_history(&history).unwrap();
    let corr = model.correlation();

    assert!((corr[[0, 0]] - 1.0).abs() < 1e-12);
    assert!((corr[[0, 1]] + 1.0).abs() < 1e-9);
  }

  #[test]
  fn moments_constructor_rejects_shape_mismatch() {
    let err = ReturnsModel::from_moments(
      ndarray::array![0.1, 0.2],
      ndarray::array![[0.04, 0.0]],
    )
    .unwrap_err();
    assert!(matches!(err, PortfolioError::InvalidUniverse(_)));
  }

  #[test]
  fn moments_constructor_rejects_asymmetric_covariance() {
    let err = ReturnsModel::from_moments(
      ndarray::array![0.1, 0.2],
      ndarray::array![[0.04, 0.01], [0.03, 0.09]],
    )
    .unwrap_err();
    assert!(matches!(err, PortfolioError::InvalidUniverse(_)));
  }
}
