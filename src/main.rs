use std::error::Error;

use chrono::Duration;
use chrono::NaiveDate;
use mpt_rs::AssetUniverse;
use mpt_rs::InMemoryPriceSource;
use mpt_rs::PortfolioEngine;
use mpt_rs::PortfolioEngineConfig;
use mpt_rs::Strategy;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::Distribution;
use rand_distr::Normal;

/// Two years of synthetic daily closes following a geometric Brownian
/// motion with the given annualized drift and volatility.
fn gbm_series(seed: u64, s0: f64, mu: f64, sigma: f64, days: i64) -> Vec<(NaiveDate, f64)> {
  let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
  let mut rng = StdRng::seed_from_u64(seed);
  let normal = Normal::new(0.0, 1.0).unwrap();
  let dt = 1.0 / 252.0;

  let mut price = s0;
  (0..days)
    .map(|t| {
      let z: f64 = normal.sample(&mut rng);
      price *= ((mu - 0.5 * sigma * sigma) * dt + sigma * dt.sqrt() * z).exp();
      (start + Duration::days(t), price)
    })
    .collect()
}

fn main() -> Result<(), Box<dyn Error>> {
  let universe = AssetUniverse::new(["TECH", "ENGY", "BOND"])?;

  let mut source = InMemoryPriceSource::new();
  source.insert_series("TECH", gbm_series(1, 180.0, 0.18, 0.32, 504));
  source.insert_series("ENGY", gbm_series(2, 95.0, 0.10, 0.22, 504));
  source.insert_series("BOND", gbm_series(3, 100.0, 0.04, 0.06, 504));

  let engine = PortfolioEngine::new(PortfolioEngineConfig {
    risk_free: 0.02,
    monte_carlo_count: 10_000,
    frontier_points: 50,
    seed: Some(42),
  });

  for strategy in [Strategy::MaxSharpe, Strategy::MinVolatility, Strategy::MonteCarloBest] {
    let result = engine.optimize_from_source(&source, &universe, strategy)?;

    println!("\nStrategy: {strategy}");
    for (ticker, weight) in result.weights_by_ticker() {
      println!("  {ticker}  {:>6.2}%", weight * 100.0);
    }
    println!(
      "  return {:.4}  volatility {:.4}  sharpe {:.4}  ({} frontier points)",
      result.stats.expected_return,
      result.stats.volatility,
      result.stats.sharpe,
      result.frontier.len()
    );
  }

  Ok(())
}
