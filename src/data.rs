//! # Market Data
//!
//! $$
//! P \in \mathbb{R}^{T \times N}, \quad P_{t,i} > 0
//! $$
//!
//! Asset universe, aligned price table and the injected price source seam.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::HashSet;

use chrono::NaiveDate;
use ndarray::Array2;

use crate::error::PortfolioError;

fn normalize_ticker(raw: &str) -> String {
  raw.trim().to_uppercase()
}

/// Ordered set of ticker symbols. Column order of every vector and matrix
/// in the crate follows the order of this universe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetUniverse {
  tickers: Vec<String>,
}

impl AssetUniverse {
  /// Build a universe from raw ticker symbols.
  ///
  /// Symbols are trimmed and uppercased; empty entries are discarded.
  /// At least two distinct tickers are required.
  pub fn new<I, S>(tickers: I) -> Result<Self, PortfolioError>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut seen = HashSet::new();
    let mut normalized = Vec::new();

    for raw in tickers {
      let ticker = normalize_ticker(raw.as_ref());
      if ticker.is_empty() {
        continue;
      }
      if !seen.insert(ticker.clone()) {
        return Err(PortfolioError::InvalidUniverse(format!(
          "duplicate ticker `{ticker}`"
        )));
      }
      normalized.push(ticker);
    }

    if normalized.len() < 2 {
      return Err(PortfolioError::InvalidUniverse(format!(
        "need at least 2 tickers, got {}",
        normalized.len()
      )));
    }

    Ok(Self {
      tickers: normalized,
    })
  }

  /// Tickers in column order.
  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  /// Number of assets.
  pub fn len(&self) -> usize {
    self.tickers.len()
  }

  /// Always false: construction requires at least two tickers.
  pub fn is_empty(&self) -> bool {
    self.tickers.is_empty()
  }
}

/// Aligned price table: strictly increasing trading dates, one positive
/// price per asset and date.
#[derive(Clone, Debug)]
pub struct PriceHistory {
  dates: Vec<NaiveDate>,
  prices: Array2<f64>,
}

impl PriceHistory {
  /// Build a history from dense rows.
  ///
  /// Rows are sorted by date, duplicate dates keep the last row, and rows
  /// with a non-positive or non-finite price are dropped. At least two
  /// rows must survive alignment.
  pub fn new(
    universe: &AssetUniverse,
    rows: Vec<(NaiveDate, Vec<f64>)>,
  ) -> Result<Self, PortfolioError> {
    let sparse = rows
      .into_iter()
      .map(|(date, prices)| (date, prices.into_iter().map(Some).collect()))
      .collect();
    Self::from_sparse_rows(universe, sparse)
  }

  /// Build a history from rows that may have gaps. Any row with a missing
  /// value for any asset is dropped, mirroring a dropna over the table.
  pub fn from_sparse_rows(
    universe: &AssetUniverse,
    rows: Vec<(NaiveDate, Vec<Option<f64>>)>,
  ) -> Result<Self, PortfolioError> {
    let n = universe.len();

    // Last write per date wins, keys iterate in date order.
    let mut by_date: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
    for (date, prices) in rows {
      by_date.insert(date, prices);
    }

    let mut dates = Vec::new();
    let mut flat = Vec::new();
    for (date, prices) in by_date {
      if prices.len() != n {
        continue;
      }
      let usable = prices
        .iter()
        .all(|p| matches!(p, Some(v) if v.is_finite() && *v > 0.0));
      if !usable {
        continue;
      }
      dates.push(date);
      flat.extend(prices.into_iter().flatten());
    }

    if dates.len() < 2 {
      return Err(PortfolioError::InsufficientData(format!(
        "need at least 2 aligned price rows, got {}",
        dates.len()
      )));
    }

    let prices = Array2::from_shape_vec((dates.len(), n), flat).map_err(|e| {
      PortfolioError::InsufficientData(format!("malformed price table: {e}"))
    })?;

    Ok(Self { dates, prices })
  }

  /// Trading dates in ascending order.
  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  /// T×N price matrix, rows aligned to [`PriceHistory::dates`].
  pub fn prices(&self) -> &Array2<f64> {
    &self.prices
  }

  /// Number of aligned rows.
  pub fn len(&self) -> usize {
    self.dates.len()
  }

  /// Always false: construction requires at least two rows.
  pub fn is_empty(&self) -> bool {
    self.dates.is_empty()
  }
}

/// Read-only provider of aligned price history. Live fetching, caching and
/// retry policy live behind this seam, outside the core.
pub trait PriceSource {
  /// Aligned history covering exactly the universe's tickers.
  fn price_history(&self, universe: &AssetUniverse) -> Result<PriceHistory, PortfolioError>;
}

/// Fixture-grade [`PriceSource`] over per-ticker series held in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryPriceSource {
  series: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
}

impl InMemoryPriceSource {
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert or extend the series for one ticker. Later points overwrite
  /// earlier ones on the same date.
  pub fn insert_series<I>(&mut self, ticker: &str, points: I)
  where
    I: IntoIterator<Item = (NaiveDate, f64)>,
  {
    let entry = self.series.entry(normalize_ticker(ticker)).or_default();
    for (date, price) in points {
      entry.insert(date, price);
    }
  }
}

impl PriceSource for InMemoryPriceSource {
  fn price_history(&self, universe: &AssetUniverse) -> Result<PriceHistory, PortfolioError> {
    let with_data = universe
      .tickers()
      .iter()
      .filter(|t| self.series.get(*t).is_some_and(|s| !s.is_empty()))
      .count();
    if with_data < 2 {
      return Err(PortfolioError::InsufficientData(format!(
        "only {with_data} tickers have price data, need at least 2"
      )));
    }

    let mut dates = BTreeSet::new();
    for ticker in universe.tickers() {
      if let Some(series) = self.series.get(ticker) {
        dates.extend(series.keys().copied());
      }
    }

    let rows = dates
      .into_iter()
      .map(|date| {
        let prices = universe
          .tickers()
          .iter()
          .map(|t| self.series.get(t).and_then(|s| s.get(&date)).copied())
          .collect();
        (date, prices)
      })
      .collect();

    PriceHistory::from_sparse_rows(universe, rows)
  }
}
