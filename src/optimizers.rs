//! # Constrained Optimizers
//!
//! $$
//! \min_{\mathbf{w}\in\Delta^{N-1}} f(\mathbf{w})
//! \quad \text{s.t.} \quad g(\mathbf{w}) = 0
//! $$
//!
//! One generic simplex-constrained nonlinear program solved by Nelder-Mead
//! over a softmax reparameterization: the sum-to-one equality and [0, 1]
//! box bounds hold exactly by construction, and an optional extra equality
//! constraint is enforced with a quadratic penalty. The three named
//! problems (max-Sharpe, min-volatility, min-volatility-at-target) are
//! thin closures over this primitive.

use argmin::core::CostFunction;
use argmin::core::Executor;
use argmin::solver::neldermead::NelderMead;
use ndarray::Array1;

use crate::error::PortfolioError;
use crate::metrics::VOL_FLOOR;
use crate::model::ReturnsModel;

const MAX_ITERS: u64 = 5000;
const SD_TOLERANCE: f64 = 1e-8;
const RETURN_PENALTY: f64 = 1e4;
/// A target return is considered met when the achieved portfolio return
/// lies within this distance of it.
pub const TARGET_TOLERANCE: f64 = 1e-3;
/// Sentinel cost for candidates that must never win, e.g. zero-volatility
/// portfolios in Sharpe objectives.
const DEGENERATE_COST: f64 = 1e10;

fn softmax(x: &[f64]) -> Array1<f64> {
  let max_x = x.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
  let exps: Array1<f64> = x.iter().map(|&v| (v - max_x).exp()).collect();
  let sum = exps.sum();
  if sum < 1e-15 {
    Array1::from_elem(x.len(), 1.0 / x.len() as f64)
  } else {
    exps / sum
  }
}

struct SimplexCost<'a, F> {
  objective: F,
  equality: Option<&'a dyn Fn(&Array1<f64>) -> f64>,
  penalty: f64,
}

impl<F> CostFunction for SimplexCost<'_, F>
where
  F: Fn(&Array1<f64>) -> f64,
{
  type Param = Vec<f64>;
  type Output = f64;

  fn cost(&self, x: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
    let w = softmax(x);
    let mut cost = (self.objective)(&w);
    if let Some(residual) = self.equality {
      let r = residual(&w);
      cost += self.penalty * r * r;
    }
    Ok(cost)
  }
}

/// Minimize `objective` over the weight simplex, with an optional extra
/// equality constraint expressed as a residual driven to zero.
///
/// The zero parameter vector maps to the uniform 1/N allocation, which is
/// the initial guess for every problem. Returns `None` when the solver
/// fails to produce a finite best cost.
pub(crate) fn solve_simplex_nlp<F>(
  n: usize,
  objective: F,
  equality: Option<&dyn Fn(&Array1<f64>) -> f64>,
) -> Option<Array1<f64>>
where
  F: Fn(&Array1<f64>) -> f64,
{
  let mut simplex = Vec::with_capacity(n + 1);
  simplex.push(vec![0.0; n]);
  for i in 0..n {
    let mut point = vec![0.0; n];
    point[i] = 1.0;
    simplex.push(point);
  }

  let cost = SimplexCost {
    objective,
    equality,
    penalty: RETURN_PENALTY,
  };

  let solver = NelderMead::new(simplex).with_sd_tolerance(SD_TOLERANCE).ok()?;
  let result = Executor::new(cost, solver)
    .configure(|state| state.max_iters(MAX_ITERS))
    .run()
    .ok()?;

  if !result.state.best_cost.is_finite() || result.state.best_cost >= DEGENERATE_COST {
    return None;
  }
  result.state.best_param.map(|x| softmax(&x))
}

fn volatility_of(w: &Array1<f64>, model: &ReturnsModel) -> f64 {
  w.dot(&model.covariance().dot(w)).max(0.0).sqrt()
}

/// Weights maximizing the Sharpe ratio over the long-only simplex.
///
/// This problem is expected to converge for any valid model; failure is a
/// configuration error surfaced as [`PortfolioError::OptimizerConvergence`].
pub fn max_sharpe(model: &ReturnsModel, risk_free: f64) -> Result<Array1<f64>, PortfolioError> {
  let mu = model.mean_return();
  solve_simplex_nlp(
    model.n_assets(),
    |w: &Array1<f64>| {
      let vol = volatility_of(w, model);
      if vol < VOL_FLOOR {
        return DEGENERATE_COST;
      }
      -(mu.dot(w) - risk_free) / vol
    },
    None,
  )
  .ok_or(PortfolioError::OptimizerConvergence {
    strategy: "max_sharpe",
  })
}

/// Weights minimizing portfolio volatility over the long-only simplex.
pub fn min_volatility(model: &ReturnsModel) -> Result<Array1<f64>, PortfolioError> {
  solve_simplex_nlp(
    model.n_assets(),
    |w: &Array1<f64>| volatility_of(w, model),
    None,
  )
  .ok_or(PortfolioError::OptimizerConvergence {
    strategy: "min_volatility",
  })
}

/// Minimum-volatility weights subject to `mean_return · w = target`.
///
/// Infeasible or unconverged targets yield `None`; the frontier builder
/// drops such points rather than escalating.
pub fn min_volatility_for_target(model: &ReturnsModel, target: f64) -> Option<Array1<f64>> {
  let mu = model.mean_return();
  let residual = |w: &Array1<f64>| mu.dot(w) - target;
  let weights = solve_simplex_nlp(
    model.n_assets(),
    |w: &Array1<f64>| volatility_of(w, model),
    Some(&residual),
  )?;

  if (mu.dot(&weights) - target).abs() > TARGET_TOLERANCE {
    return None;
  }
  Some(weights)
}
