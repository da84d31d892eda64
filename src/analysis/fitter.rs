use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::config::FitConfig;
use crate::error::ForecastError;

const MIN_POINTS: usize = 4;
const CONFIDENCE_LEVEL: f64 = 0.95;
const LAMBDA_INITIAL: f64 = 1e-3;
const LAMBDA_MIN: f64 = 1e-12;
const LAMBDA_MAX: f64 = 1e16;

/// Bounded logistic curve: share(t) = L / (1 + e^(-k (t - t0)))
pub fn logistic(t: f64, ceiling: f64, growth_rate: f64, inflection: f64) -> f64 {
    ceiling / (1.0 + (-growth_rate * (t - inflection)).exp())
}

/// Fitted logistic parameters (L, k, t0). `t0` is in months since the series start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    /// Asymptotic ceiling `L`
    pub ceiling: f64,
    /// Growth rate `k`
    pub growth_rate: f64,
    /// Inflection offset `t0`
    pub inflection: f64,
}

impl LogisticParams {
    pub fn new(ceiling: f64, growth_rate: f64, inflection: f64) -> Self {
        Self {
            ceiling,
            growth_rate,
            inflection,
        }
    }

    /// Evaluate the curve at time index `t`.
    pub fn evaluate(&self, t: f64) -> f64 {
        logistic(t, self.ceiling, self.growth_rate, self.inflection)
    }

    fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.ceiling, self.growth_rate, self.inflection)
    }

    fn from_vector(v: &Vector3<f64>) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// Goodness-of-fit and parameter uncertainty for a fitted curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitDiagnostics {
    pub iterations: usize,
    pub observations: usize,
    /// Residual sum of squares
    pub rss: f64,
    pub rmse: f64,
    pub r_squared: f64,
    /// Standard errors of (L, k, t0); `None` when the normal matrix is singular
    pub std_errors: Option<[f64; 3]>,
    /// Student-t confidence intervals for (L, k, t0)
    pub confidence_intervals: Option<[[f64; 2]; 3]>,
    pub confidence_level: f64,
}

/// A fitted logistic curve with its diagnostics. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedCurve {
    pub params: LogisticParams,
    pub diagnostics: FitDiagnostics,
}

struct Bounds {
    lower: Vector3<f64>,
    upper: Vector3<f64>,
}

impl Bounds {
    fn from_config(config: &FitConfig) -> Self {
        Self {
            lower: Vector3::new(
                config.ceiling_bounds[0],
                config.growth_rate_bounds[0],
                config.inflection_bounds[0],
            ),
            upper: Vector3::new(
                config.ceiling_bounds[1],
                config.growth_rate_bounds[1],
                config.inflection_bounds[1],
            ),
        }
    }

    fn clamp(&self, p: &Vector3<f64>) -> Vector3<f64> {
        Vector3::from_fn(|i, _| p[i].clamp(self.lower[i], self.upper[i]))
    }
}

/// Normal-equation terms at a parameter vector.
struct Linearization {
    /// J^T J
    jtj: Matrix3<f64>,
    /// J^T r, the gradient of `cost`
    gradient: Vector3<f64>,
    /// Half the residual sum of squares
    cost: f64,
}

fn linearize(p: &Vector3<f64>, shares: &[f64]) -> Result<Linearization, ForecastError> {
    let (ceiling, k, t0) = (p[0], p[1], p[2]);
    let mut jtj = Matrix3::zeros();
    let mut gradient = Vector3::zeros();
    let mut cost = 0.0;

    for (i, &observed) in shares.iter().enumerate() {
        let dt = i as f64 - t0;
        let s = 1.0 / (1.0 + (-k * dt).exp());
        let residual = ceiling * s - observed;
        let ds = ceiling * s * (1.0 - s);
        let j = Vector3::new(s, ds * dt, -ds * k);

        jtj += j * j.transpose();
        gradient += j * residual;
        cost += 0.5 * residual * residual;
    }

    if !cost.is_finite() || jtj.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::FitFailure(format!(
            "non-finite residuals at L={ceiling}, k={k}, t0={t0}"
        )));
    }

    Ok(Linearization {
        jtj,
        gradient,
        cost,
    })
}

fn cost_at(p: &Vector3<f64>, shares: &[f64]) -> f64 {
    shares
        .iter()
        .enumerate()
        .map(|(i, &observed)| {
            let r = logistic(i as f64, p[0], p[1], p[2]) - observed;
            0.5 * r * r
        })
        .sum()
}

/// Solve the damped normal equations with parameters outside `free` held fixed.
fn damped_step(
    lin: &Linearization,
    lambda: f64,
    free: &[bool; 3],
) -> Option<Vector3<f64>> {
    let scale = lin.jtj.diagonal().max().max(1.0) * 1e-12;
    let mut a = lin.jtj;
    let mut rhs = -lin.gradient;

    for i in 0..3 {
        a[(i, i)] += lambda * lin.jtj[(i, i)].max(scale);
    }
    for i in 0..3 {
        if !free[i] {
            for j in 0..3 {
                a[(i, j)] = 0.0;
                a[(j, i)] = 0.0;
            }
            a[(i, i)] = 1.0;
            rhs[i] = 0.0;
        }
    }

    a.cholesky()
        .map(|c| c.solve(&rhs))
        .or_else(|| a.lu().solve(&rhs))
        .filter(|step| step.iter().all(|v| v.is_finite()))
}

fn validate_shares(shares: &[f64]) -> Result<(), ForecastError> {
    if shares.len() < MIN_POINTS {
        return Err(ForecastError::InvalidInput(format!(
            "need at least {MIN_POINTS} observations to fit a growth curve, got {}",
            shares.len()
        )));
    }
    if let Some((i, v)) = shares
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite() || !(0.0..=1.0).contains(*v))
    {
        return Err(ForecastError::InvalidInput(format!(
            "share at index {i} must be in 0.0..=1.0, got {v}"
        )));
    }
    Ok(())
}

/// Fit (L, k, t0) to `shares`, indexed 0..N-1 in months, by bounded nonlinear
/// least squares.
///
/// The solver is a projected Levenberg–Marquardt iteration on the analytic
/// Jacobian: every trial point is clamped into the configured box and
/// parameters pinned at a bound with the gradient pushing outward are frozen
/// for that step. The returned parameters always lie inside the bounds.
///
/// # Errors
///
/// - `InvalidInput` for fewer than four points or shares outside 0..=1.
/// - `FitFailure` for a flat series, non-finite residuals, or no convergence
///   within `max_iterations`.
///
/// # Examples
///
/// ```
/// use bev_adoption_forecaster::analysis::{fit_logistic, logistic};
/// use bev_adoption_forecaster::config::FitConfig;
///
/// let shares: Vec<f64> = (0..160).map(|t| logistic(t as f64, 0.98, 0.08, 110.0)).collect();
/// let fit = fit_logistic(&shares, &FitConfig::default()).unwrap();
/// assert!((fit.params.growth_rate - 0.08).abs() < 1e-4);
/// ```
pub fn fit_logistic(shares: &[f64], config: &FitConfig) -> Result<FittedCurve, ForecastError> {
    validate_shares(shares)?;

    let n = shares.len();
    let min = shares.iter().copied().fold(f64::INFINITY, f64::min);
    let max = shares.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max - min <= f64::EPSILON {
        return Err(ForecastError::FitFailure(
            "share series is flat; growth rate and inflection are unidentifiable".to_string(),
        ));
    }

    let bounds = Bounds::from_config(config);
    let initial = LogisticParams::new(
        config.ceiling_hint,
        config.initial_growth_rate,
        config.initial_inflection.unwrap_or(n as f64 / 2.0),
    );
    let mut p = bounds.clamp(&initial.to_vector());
    let mut lambda = LAMBDA_INITIAL;
    let tol = config.tolerance;

    tracing::debug!(
        observations = n,
        ceiling = p[0],
        growth_rate = p[1],
        inflection = p[2],
        "starting logistic fit"
    );

    let mut converged = false;
    let mut iterations = 0;
    let mut lin = linearize(&p, shares)?;

    'outer: while iterations < config.max_iterations {
        iterations += 1;

        let mut free = [true; 3];
        for (i, slot) in free.iter_mut().enumerate() {
            let g = lin.gradient[i];
            let pinned_low = p[i] <= bounds.lower[i] && g > 0.0;
            let pinned_high = p[i] >= bounds.upper[i] && g < 0.0;
            *slot = !(pinned_low || pinned_high);
        }
        let free_gradient = (0..3)
            .filter(|&i| free[i])
            .map(|i| lin.gradient[i].abs())
            .fold(0.0, f64::max);
        if free_gradient <= f64::EPSILON || !free.contains(&true) {
            converged = true;
            break;
        }

        loop {
            let Some(step) = damped_step(&lin, lambda, &free) else {
                lambda *= 10.0;
                if lambda > LAMBDA_MAX {
                    return Err(ForecastError::FitFailure(
                        "normal equations are singular".to_string(),
                    ));
                }
                continue;
            };

            let candidate = bounds.clamp(&(p + step));
            let candidate_cost = cost_at(&candidate, shares);
            if !candidate_cost.is_finite() {
                return Err(ForecastError::FitFailure(
                    "cost became non-finite during fit".to_string(),
                ));
            }

            if candidate_cost < lin.cost {
                let moved = (candidate - p).norm();
                let reduction = (lin.cost - candidate_cost) / lin.cost;
                p = candidate;
                lin = linearize(&p, shares)?;
                lambda = (lambda / 10.0).max(LAMBDA_MIN);

                if reduction < tol || moved <= tol * (p.norm() + tol) || lin.cost == 0.0 {
                    converged = true;
                    break 'outer;
                }
                break;
            }

            lambda *= 10.0;
            if lambda > LAMBDA_MAX {
                // No downhill step exists at working precision.
                converged = true;
                break 'outer;
            }
        }
    }

    if !converged {
        return Err(ForecastError::FitFailure(format!(
            "no convergence after {} iterations (rss {:.3e})",
            config.max_iterations,
            2.0 * lin.cost
        )));
    }

    let params = LogisticParams::from_vector(&p);
    let diagnostics = diagnose(&params, &lin, shares, iterations);

    tracing::info!(
        ceiling = params.ceiling,
        growth_rate = params.growth_rate,
        inflection = params.inflection,
        iterations,
        rss = diagnostics.rss,
        "logistic fit converged"
    );

    Ok(FittedCurve {
        params,
        diagnostics,
    })
}

fn diagnose(
    params: &LogisticParams,
    lin: &Linearization,
    shares: &[f64],
    iterations: usize,
) -> FitDiagnostics {
    let n = shares.len();
    let rss = 2.0 * lin.cost;
    let mean = shares.iter().sum::<f64>() / n as f64;
    let tss: f64 = shares.iter().map(|y| (y - mean).powi(2)).sum();
    let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { 0.0 };

    let dof = n.saturating_sub(3);
    let std_errors = if dof > 0 {
        let sigma2 = rss / dof as f64;
        lin.jtj.try_inverse().and_then(|inv| {
            let se = [0, 1, 2].map(|i| (inv[(i, i)] * sigma2).sqrt());
            se.iter().all(|v| v.is_finite()).then_some(se)
        })
    } else {
        None
    };

    let confidence_intervals = std_errors.and_then(|se| {
        let t_dist = StudentsT::new(0.0, 1.0, dof as f64).ok()?;
        let t_value = t_dist.inverse_cdf(1.0 - (1.0 - CONFIDENCE_LEVEL) / 2.0);
        let p = params.to_vector();
        Some([0, 1, 2].map(|i| [p[i] - t_value * se[i], p[i] + t_value * se[i]]))
    });

    FitDiagnostics {
        iterations,
        observations: n,
        rss,
        rmse: (rss / n as f64).sqrt(),
        r_squared,
        std_errors,
        confidence_intervals,
        confidence_level: CONFIDENCE_LEVEL,
    }
}
