//! # mpt-rs
//!
//! $$
//! \mathbf{w}^\* = \arg\max_{\mathbf{w}\in\Delta^{N-1}}
//! \frac{\mu^\top \mathbf{w} - r_f}{\sqrt{\mathbf{w}^\top \Sigma \mathbf{w}}}
//! $$
//!
//! Modern Portfolio Theory statistics and mean-variance optimization:
//! annualized return and covariance models from aligned price history,
//! Monte Carlo exploration of the weight simplex, constrained optimizers
//! for the named strategies, and the efficient frontier.

pub mod data;
pub mod engine;
pub mod error;
pub mod frontier;
pub mod metrics;
pub mod model;
pub mod monte_carlo;
pub mod optimizers;
pub mod types;

pub use data::AssetUniverse;
pub use data::InMemoryPriceSource;
pub use data::PriceHistory;
pub use data::PriceSource;
pub use engine::PortfolioEngine;
pub use engine::PortfolioEngineConfig;
pub use error::PortfolioError;
pub use frontier::FrontierPoint;
pub use frontier::build_frontier;
pub use metrics::portfolio_stats;
pub use model::ReturnsModel;
pub use model::TRADING_DAYS_PER_YEAR;
pub use monte_carlo::MonteCarloSample;
pub use monte_carlo::sample_portfolios;
pub use optimizers::max_sharpe;
pub use optimizers::min_volatility;
pub use optimizers::min_volatility_for_target;
pub use types::OptimizationResult;
pub use types::PortfolioStats;
pub use types::Strategy;
