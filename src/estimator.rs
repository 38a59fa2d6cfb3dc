//! Correction estimator
//!
//! Computes the next suggested pump-zero from a user's measurement history.
//! A cheap heuristic (`pz + (a - p) / divisor`) is always computed first and
//! acts as the floor result; a least-squares fit of pump-zero against the
//! predicted-minus-actual delta only overrides it when at least four samples
//! exist and the fit explains more than half the variance. Pure function,
//! full-precision arithmetic; rounding happens at display time.

use crate::model::{Quality, Sample};

/// Minimum number of samples before a fit is attempted.
const MIN_SAMPLES_FOR_FIT: usize = 4;

/// Ordered r² bound table; first bound >= r² wins, exhausted table
/// falls through to the last label.
const QUALITY_BOUNDS: [(f64, Quality); 4] = [
    (0.5, Quality::Poor),
    (0.6, Quality::Fair),
    (0.8, Quality::Good),
    (0.9, Quality::VeryGood),
];

/// Estimator output: suggested value plus how much to trust it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Next suggested pump-zero value
    pub next: f64,
    /// Confidence rating for `next`
    pub quality: Quality,
    /// True when enough history exists but it correlates weakly;
    /// the caller should warn the user their data looks noisy
    pub likely_bad_data: bool,
}

/// Simple linear fit `y = slope * x + intercept` with its r².
#[derive(Debug, Clone, Copy)]
struct LinearFit {
    intercept: f64,
    r2: f64,
}

/// Suggest the next pump-zero for a shot with `predicted`/`actual` weights
/// pulled at `pump_zero`, given the samples from prior eligible records.
pub fn estimate(predicted: f64, actual: f64, pump_zero: f64, samples: &[Sample]) -> Estimate {
    let divisor = if samples.len() < MIN_SAMPLES_FOR_FIT { 2.0 } else { 4.0 };
    let fallback = pump_zero + (actual - predicted) / divisor;

    if samples.len() < MIN_SAMPLES_FOR_FIT {
        return Estimate {
            next: fallback,
            quality: Quality::NeedData,
            likely_bad_data: false,
        };
    }

    let fit = match fit_linear(samples) {
        Some(fit) if fit.r2 > 0.5 => fit,
        // Unreliable or degenerate fit: keep the safe heuristic and flag it
        _ => {
            return Estimate {
                next: fallback,
                quality: Quality::Poor,
                likely_bad_data: true,
            }
        }
    };

    Estimate {
        // The line evaluated at delta = 0: the pump-zero the model
        // predicts when predicted equals actual
        next: fit.intercept,
        quality: label_for_bound(&QUALITY_BOUNDS, fit.r2),
        likely_bad_data: false,
    }
}

/// Ordinary least squares of `pump_zero` on `delta`.
///
/// Returns `None` when the deltas have zero variance (slope undefined).
/// Zero variance in pump-zero with a residual-free fit is a perfect
/// trivial fit and reports r² = 1.
fn fit_linear(samples: &[Sample]) -> Option<LinearFit> {
    let n = samples.len() as f64;
    let mean_x = samples.iter().map(|s| s.delta).sum::<f64>() / n;
    let mean_y = samples.iter().map(|s| s.pump_zero).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for s in samples {
        let dx = s.delta - mean_x;
        let dy = s.pump_zero - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let ss_res: f64 = samples
        .iter()
        .map(|s| {
            let residual = s.pump_zero - (slope * s.delta + intercept);
            residual * residual
        })
        .sum();

    let r2 = if syy == 0.0 { 1.0 } else { 1.0 - ss_res / syy };

    Some(LinearFit { intercept, r2 })
}

/// First bound whose threshold is >= the input wins; a value past the
/// last bound takes the last label.
fn label_for_bound(bounds: &[(f64, Quality)], input: f64) -> Quality {
    for (bound, label) in bounds {
        if *bound >= input {
            return *label;
        }
    }
    bounds[bounds.len() - 1].1
}
