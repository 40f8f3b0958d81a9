// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fits a 2-D Gaussian (diagonal covariance) to total-power data as a
//! function of `(Δaz, Δel)` target coordinates (spec.md §4.3). The Gaussian
//! bump represents an antenna beam pattern convolved with a point source.

pub mod error;

use ndarray::{ArrayView1, ArrayView2};

pub use error::BeamFitError;

use crate::constants::{FIT_STEP_TOLERANCE, MAX_FIT_ITERATIONS, MIN_WIDTH_RATIO};

const NUM_PARAMS: usize = 5;

/// Standard error of the `y` values passed to [`BeamModel::fit`].
pub enum StdY<'a> {
    /// The same measurement error for every point.
    Scalar(f64),
    /// A per-point measurement error.
    PerPoint(ArrayView1<'a, f64>),
}

impl StdY<'_> {
    fn get(&self, i: usize) -> f64 {
        match self {
            StdY::Scalar(s) => *s,
            StdY::PerPoint(v) => v[i],
        }
    }
}

/// Standard deviation of a Gaussian with the given FWHM beamwidth.
pub fn fwhm_to_sigma(fwhm: f64) -> f64 {
    fwhm / 2.0 / (2.0 * std::f64::consts::LN_2).sqrt()
}

/// FWHM beamwidth of a Gaussian with the given standard deviation.
pub fn sigma_to_fwhm(sigma: f64) -> f64 {
    2.0 * (2.0 * std::f64::consts::LN_2).sqrt() * sigma
}

/// A 2-D Gaussian beam model, `h * exp(-((x1-mu1)^2/2sigma1^2 +
/// (x2-mu2)^2/2sigma2^2))`, together with its initial-guess parameters.
#[derive(Clone, Copy, Debug)]
pub struct BeamModel {
    centre: [f64; 2],
    sigma: [f64; 2],
    height: f64,
}

/// The outcome of fitting a [`BeamModel`] to data: fitted parameters, their
/// standard errors, and a validity verdict.
#[derive(Clone, Copy, Debug)]
pub struct FittedBeam {
    pub centre: [f64; 2],
    pub width_fwhm: [f64; 2],
    pub height: f64,
    pub centre_err: [f64; 2],
    pub width_err: [f64; 2],
    pub height_err: f64,
    pub expected_width: [f64; 2],
    pub is_valid: bool,
}

impl BeamModel {
    pub fn new(centre: [f64; 2], width_fwhm: [f64; 2], height: f64) -> Result<Self, BeamFitError> {
        if width_fwhm[0] <= 0.0 || width_fwhm[1] <= 0.0 {
            return Err(BeamFitError::NonPositiveWidth(width_fwhm[0].min(width_fwhm[1])));
        }
        Ok(Self {
            centre,
            sigma: [fwhm_to_sigma(width_fwhm[0]), fwhm_to_sigma(width_fwhm[1])],
            height,
        })
    }

    /// Fits the beam model to `(x, y)` via weighted Gauss-Newton, starting
    /// from this model's initial guess. `x` is `[N, 2]`; `y` is `[N]`.
    /// `expected_width` is the beamwidth predicted from dish geometry, used
    /// only to judge the fit's validity (spec.md §4.3).
    pub fn fit(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        std_y: StdY<'_>,
        thresh_width: f64,
        expected_width: [f64; 2],
    ) -> Result<FittedBeam, BeamFitError> {
        let n = x.shape()[0];
        if n != y.len() {
            return Err(BeamFitError::MismatchedLengths {
                x_len: n,
                y_len: y.len(),
            });
        }
        // spec.md §8 invariant 1 exercises the fit with exactly 5 distinct
        // offsets for this 5-parameter model; an exactly-determined system
        // (zero residual degrees of freedom) still solves uniquely.
        if n < NUM_PARAMS {
            return Err(BeamFitError::TooFewPoints { got: n });
        }

        // Parameters: [mu1, mu2, sigma1, sigma2, h].
        let mut p = [
            self.centre[0],
            self.centre[1],
            self.sigma[0],
            self.sigma[1],
            self.height,
        ];

        let weights: Vec<f64> = (0..n).map(|i| 1.0 / std_y.get(i).powi(2)).collect();

        let mut converged = false;
        for _ in 0..MAX_FIT_ITERATIONS {
            let mut jtj = [[0.0f64; NUM_PARAMS]; NUM_PARAMS];
            let mut jtr = [0.0f64; NUM_PARAMS];

            for i in 0..n {
                let x1 = x[[i, 0]];
                let x2 = x[[i, 1]];
                let (model, jac) = model_and_jacobian(&p, x1, x2);
                let residual = y[i] - model;
                let w = weights[i];

                for a in 0..NUM_PARAMS {
                    jtr[a] += w * jac[a] * residual;
                    for b in 0..NUM_PARAMS {
                        jtj[a][b] += w * jac[a] * jac[b];
                    }
                }
            }

            let delta = match solve_5x5(jtj, jtr) {
                Some(d) => d,
                None => break,
            };

            let mut step_norm = 0.0f64;
            let mut p_norm = 0.0f64;
            for i in 0..NUM_PARAMS {
                p[i] += delta[i];
                step_norm += delta[i] * delta[i];
                p_norm += p[i] * p[i];
            }

            if step_norm.sqrt() < FIT_STEP_TOLERANCE * (p_norm.sqrt() + FIT_STEP_TOLERANCE) {
                converged = true;
                break;
            }
        }

        // Asymptotic covariance: sigma^2 * (J^T W J)^-1, using the weighted
        // residual variance at the converged parameters as sigma^2 (or, if
        // std_y already encodes absolute measurement error, left at 1.0 — we
        // follow the convention that std_y is an absolute error, matching
        // the original workflow's `std_y=1.0` default).
        let mut jtj = [[0.0f64; NUM_PARAMS]; NUM_PARAMS];
        for i in 0..n {
            let x1 = x[[i, 0]];
            let x2 = x[[i, 1]];
            let (_, jac) = model_and_jacobian(&p, x1, x2);
            let w = weights[i];
            for a in 0..NUM_PARAMS {
                for b in 0..NUM_PARAMS {
                    jtj[a][b] += w * jac[a] * jac[b];
                }
            }
        }
        let cov_diag = inverse_diag_5x5(jtj);

        let centre = [p[0], p[1]];
        let width_fwhm = [sigma_to_fwhm(p[2]), sigma_to_fwhm(p[3])];
        let height = p[4];
        let centre_err = [cov_diag[0].max(0.0).sqrt(), cov_diag[1].max(0.0).sqrt()];
        let width_err = [
            sigma_to_fwhm(cov_diag[2].max(0.0).sqrt()),
            sigma_to_fwhm(cov_diag[3].max(0.0).sqrt()),
        ];
        let height_err = cov_diag[4].max(0.0).sqrt();

        let norm_width = [
            width_fwhm[0] / expected_width[0],
            width_fwhm[1] / expected_width[1],
        ];
        let fit_snr = [
            if width_err[0] > 0.0 { p[2] / cov_diag[2].max(0.0).sqrt().max(f64::MIN_POSITIVE) } else { 0.0 },
            if width_err[1] > 0.0 { p[3] / cov_diag[3].max(0.0).sqrt().max(f64::MIN_POSITIVE) } else { 0.0 },
        ];

        let is_valid = converged
            && !centre[0].is_nan()
            && !centre[1].is_nan()
            && height > 0.0
            && norm_width
                .iter()
                .all(|&r| (MIN_WIDTH_RATIO..thresh_width).contains(&r))
            && fit_snr.iter().all(|&s| s > 0.0);

        Ok(FittedBeam {
            centre,
            width_fwhm,
            height,
            centre_err,
            width_err,
            height_err,
            expected_width,
            is_valid,
        })
    }
}

/// Evaluates the Gaussian model and its Jacobian (w.r.t. all 5 parameters)
/// at a single point.
fn model_and_jacobian(p: &[f64; NUM_PARAMS], x1: f64, x2: f64) -> (f64, [f64; NUM_PARAMS]) {
    let (mu1, mu2, sigma1, sigma2, h) = (p[0], p[1], p[2], p[3], p[4]);
    let d1 = x1 - mu1;
    let d2 = x2 - mu2;
    let exponent = -0.5 * (d1 * d1 / (sigma1 * sigma1) + d2 * d2 / (sigma2 * sigma2));
    let g = exponent.exp();
    let model = h * g;

    let jac = [
        model * d1 / (sigma1 * sigma1),
        model * d2 / (sigma2 * sigma2),
        model * d1 * d1 / (sigma1 * sigma1 * sigma1),
        model * d2 * d2 / (sigma2 * sigma2 * sigma2),
        g,
    ];
    (model, jac)
}

/// Solves `a x = b` for a 5x5 system via Gaussian elimination with partial
/// pivoting. Returns `None` if `a` is (numerically) singular.
fn solve_5x5(mut a: [[f64; NUM_PARAMS]; NUM_PARAMS], mut b: [f64; NUM_PARAMS]) -> Option<[f64; NUM_PARAMS]> {
    for col in 0..NUM_PARAMS {
        let mut pivot_row = col;
        let mut pivot_val = a[col][col].abs();
        for row in (col + 1)..NUM_PARAMS {
            if a[row][col].abs() > pivot_val {
                pivot_val = a[row][col].abs();
                pivot_row = row;
            }
        }
        if pivot_val < 1e-300 {
            return None;
        }
        if pivot_row != col {
            a.swap(col, pivot_row);
            b.swap(col, pivot_row);
        }

        for row in (col + 1)..NUM_PARAMS {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..NUM_PARAMS {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0f64; NUM_PARAMS];
    for row in (0..NUM_PARAMS).rev() {
        let mut sum = b[row];
        for k in (row + 1)..NUM_PARAMS {
            sum -= a[row][k] * x[k];
        }
        x[row] = sum / a[row][row];
    }
    Some(x)
}

/// Diagonal of the inverse of a 5x5 matrix, by solving `A x_i = e_i` for
/// each standard basis vector. Good enough for a fixed, small system; not
/// intended as a general-purpose matrix inverse.
fn inverse_diag_5x5(a: [[f64; NUM_PARAMS]; NUM_PARAMS]) -> [f64; NUM_PARAMS] {
    let mut diag = [f64::INFINITY; NUM_PARAMS];
    for i in 0..NUM_PARAMS {
        let mut e = [0.0f64; NUM_PARAMS];
        e[i] = 1.0;
        if let Some(col) = solve_5x5(a, e) {
            diag[i] = col[i];
        }
    }
    diag
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    use super::*;

    fn synthetic_gaussian(mu: [f64; 2], sigma: [f64; 2], h: f64, points: &[[f64; 2]]) -> (Array2<f64>, Vec<f64>) {
        let mut x = Array2::<f64>::zeros((points.len(), 2));
        let mut y = Vec::with_capacity(points.len());
        for (i, p) in points.iter().enumerate() {
            x[[i, 0]] = p[0];
            x[[i, 1]] = p[1];
            let d1 = p[0] - mu[0];
            let d2 = p[1] - mu[1];
            let g = (-0.5 * (d1 * d1 / sigma[0].powi(2) + d2 * d2 / sigma[1].powi(2))).exp();
            y.push(h * g);
        }
        (x, y)
    }

    #[test]
    fn test_fit_recovers_known_gaussian() {
        let mut points = Vec::new();
        for i in -3..=3 {
            for j in -3..=3 {
                points.push([i as f64 * 0.01, j as f64 * 0.01]);
            }
        }
        let true_mu = [0.005, -0.003];
        let true_sigma = [0.02, 0.025];
        let (x, y) = synthetic_gaussian(true_mu, true_sigma, 1.0, &points);

        let model = BeamModel::new([0.0, 0.0], [sigma_to_fwhm(0.018), sigma_to_fwhm(0.022)], 0.9).unwrap();
        let y_arr = ndarray::Array1::from_vec(y);
        let fitted = model
            .fit(
                x.view(),
                y_arr.view(),
                StdY::Scalar(1.0),
                1.5,
                [sigma_to_fwhm(true_sigma[0]), sigma_to_fwhm(true_sigma[1])],
            )
            .unwrap();

        assert_abs_diff_eq!(fitted.centre[0], true_mu[0], epsilon = 1e-4);
        assert_abs_diff_eq!(fitted.centre[1], true_mu[1], epsilon = 1e-4);
        assert!(fitted.height > 0.9);
    }

    #[test]
    fn test_fit_too_few_points_errs() {
        let x = Array2::<f64>::zeros((3, 2));
        let y = ndarray::Array1::<f64>::zeros(3);
        let model = BeamModel::new([0.0, 0.0], [0.1, 0.1], 1.0).unwrap();
        let result = model.fit(x.view(), y.view(), StdY::Scalar(1.0), 1.5, [0.1, 0.1]);
        assert!(result.is_err());
    }

    #[test]
    fn test_fwhm_sigma_roundtrip() {
        let fwhm = 0.1234;
        assert_abs_diff_eq!(sigma_to_fwhm(fwhm_to_sigma(fwhm)), fwhm, epsilon = 1e-12);
    }

    #[test]
    fn test_new_rejects_non_positive_width() {
        assert!(BeamModel::new([0.0, 0.0], [0.0, 1.0], 1.0).is_err());
    }
}
