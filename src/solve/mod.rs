// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Drives a [`crate::beam::BeamModel`] fit for every antenna (and, for the
//! gains path, every retained frequency sub-band) from a
//! [`crate::reduce::ReducedScans`] (spec.md §4.4).

pub mod error;

use ndarray::{Array1, Array2, Axis};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub use error::SolveError;

use crate::antenna::Antenna;
use crate::beam::{BeamModel, FittedBeam, StdY};
use crate::constants::SPEED_OF_LIGHT;
use crate::reduce::ReducedScans;

/// The beamwidth (horizontal, vertical), in the same angular units as the
/// pointing offsets (radians here), an interferometer is expected to see
/// for a dish of `diameter_m` at `freq_hz`, given illumination-pattern
/// beamwidth factors `(k_h, k_v)`.
///
/// This converts the single-dish power beamwidth to the interferometric
/// gain/voltage beamwidth via the standard `sqrt(2)` factor.
pub fn expected_width(
    freq_hz: f64,
    diameter_m: f64,
    beamwidth_factor: (f64, f64),
) -> Result<(f64, f64), SolveError> {
    let wavelength = SPEED_OF_LIGHT / freq_hz;
    if !wavelength.is_finite() {
        return Err(SolveError::NonFiniteWavelength(freq_hz));
    }
    let width_h = 2.0f64.sqrt() * beamwidth_factor.0 * wavelength / diameter_m;
    let width_v = 2.0f64.sqrt() * beamwidth_factor.1 * wavelength / diameter_m;
    Ok((width_h, width_v))
}

/// Drives per-antenna (and, for gains, per-sub-band) beam fits.
pub struct OffsetSolver<'a> {
    antennas: &'a [Antenna],
    thresh_width: f64,
    /// Overrides every antenna's own `beamwidth_factor` for this run, set
    /// from `--bw_factor`. `None` falls back to each antenna's own factor
    /// (spec.md §3's per-antenna `k`).
    beamwidth_factor_override: Option<(f64, f64)>,
}

impl<'a> OffsetSolver<'a> {
    pub fn new(antennas: &'a [Antenna], thresh_width: f64) -> Self {
        Self {
            antennas,
            thresh_width,
            beamwidth_factor_override: None,
        }
    }

    /// Overrides every antenna's own beamwidth factor with `(k_h, k_v)` for
    /// this run (`--bw_factor h v`).
    pub fn with_beamwidth_factor(mut self, beamwidth_factor: (f64, f64)) -> Self {
        self.beamwidth_factor_override = Some(beamwidth_factor);
        self
    }

    fn beamwidth_factor_for(&self, antenna: &Antenna) -> (f64, f64) {
        self.beamwidth_factor_override
            .unwrap_or(antenna.beamwidth_factor)
    }

    /// Fits every antenna's beam. The outer `Vec` is indexed by antenna; the
    /// inner `Vec` holds one [`FittedBeam`] per retained sub-band (always
    /// length 1 for the visibility path).
    pub fn solve(
        &self,
        reduced: &ReducedScans,
        use_weights: bool,
    ) -> Result<Vec<Vec<FittedBeam>>, SolveError> {
        match reduced {
            ReducedScans::Vis { x, y, w, f } => self.solve_vis(x, y, w, *f, use_weights),
            ReducedScans::Gains { x, y, w, f } => self.solve_gains(x, y, w, f, use_weights),
        }
    }

    fn solve_vis(
        &self,
        x: &ndarray::Array3<f64>,
        y: &Array2<f64>,
        w: &Array2<f64>,
        frequency: f64,
        use_weights: bool,
    ) -> Result<Vec<Vec<FittedBeam>>, SolveError> {
        let fit_antenna = |ant_idx: usize, antenna: &Antenna| -> Result<Vec<FittedBeam>, SolveError> {
            let (ew_h, ew_v) =
                expected_width(frequency, antenna.diameter_m, self.beamwidth_factor_for(antenna))?;
            let x_ant = x.index_axis(Axis(1), ant_idx).to_owned();
            let y_ant = y.index_axis(Axis(0), ant_idx).to_owned();
            let w_ant = w.index_axis(Axis(0), ant_idx).to_owned();

            let fitted = self.fit_one(&x_ant, &y_ant, &w_ant, use_weights, (ew_h, ew_v))?;
            Ok(vec![fitted])
        };

        // Antennas are fit independently of one another (spec.md §5), so
        // under the `parallel` feature this loop is driven by a rayon
        // worker pool; the underlying `solve`/`beam` engine itself stays
        // single-threaded and synchronous regardless.
        #[cfg(feature = "parallel")]
        {
            self.antennas
                .par_iter()
                .enumerate()
                .map(|(ant_idx, antenna)| fit_antenna(ant_idx, antenna))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.antennas
                .iter()
                .enumerate()
                .map(|(ant_idx, antenna)| fit_antenna(ant_idx, antenna))
                .collect()
        }
    }

    fn solve_gains(
        &self,
        x: &ndarray::Array3<f64>,
        y: &ndarray::Array3<f64>,
        w: &ndarray::Array3<f64>,
        frequencies: &[f64],
        use_weights: bool,
    ) -> Result<Vec<Vec<FittedBeam>>, SolveError> {
        let num_chunks = frequencies.len();
        let kept_chunks: Vec<usize> = if num_chunks > 2 {
            (1..num_chunks - 1).collect()
        } else {
            (0..num_chunks).collect()
        };

        let fit_antenna = |ant_idx: usize, antenna: &Antenna| -> Result<Vec<FittedBeam>, SolveError> {
            let x_ant = x.index_axis(Axis(1), ant_idx).to_owned();

            // Sub-bands are independent within an antenna (spec.md §5); the
            // parallel feature drives both levels through the same pool.
            #[cfg(feature = "parallel")]
            let chunk_iter = kept_chunks.par_iter();
            #[cfg(not(feature = "parallel"))]
            let chunk_iter = kept_chunks.iter();

            chunk_iter
                .map(|&chunk| {
                    let (ew_h, ew_v) = expected_width(
                        frequencies[chunk],
                        antenna.diameter_m,
                        self.beamwidth_factor_for(antenna),
                    )?;
                    let y_ant = y.index_axis(Axis(0), ant_idx).index_axis(Axis(0), chunk).to_owned();
                    let w_ant = w.index_axis(Axis(0), ant_idx).index_axis(Axis(0), chunk).to_owned();
                    self.fit_one(&x_ant, &y_ant, &w_ant, use_weights, (ew_h, ew_v))
                })
                .collect()
        };

        #[cfg(feature = "parallel")]
        {
            self.antennas
                .par_iter()
                .enumerate()
                .map(|(ant_idx, antenna)| fit_antenna(ant_idx, antenna))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.antennas
                .iter()
                .enumerate()
                .map(|(ant_idx, antenna)| fit_antenna(ant_idx, antenna))
                .collect()
        }
    }

    fn fit_one(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        w: &Array1<f64>,
        use_weights: bool,
        expected_width: (f64, f64),
    ) -> Result<FittedBeam, SolveError> {
        let model = BeamModel::new(
            [0.0, 0.0],
            [expected_width.0, expected_width.1],
            1.0,
        )?;

        let std_y: Array1<f64> = if use_weights {
            w.mapv(|v| if v > 0.0 { 1.0 / v.sqrt() } else { 1e6 })
        } else {
            Array1::from_elem(w.len(), 1.0)
        };

        let fitted = model.fit(
            x.view(),
            y.view(),
            StdY::PerPoint(std_y.view()),
            self.thresh_width,
            [expected_width.0, expected_width.1],
        )?;
        Ok(fitted)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, Array3};

    use super::*;
    use crate::beam::{fwhm_to_sigma, sigma_to_fwhm};

    #[test]
    fn test_expected_width_known_values() {
        // lambda = c / 1 GHz ~= 0.2998 m.
        let (w_h, w_v) = expected_width(1e9, 10.0, (1.0, 1.0)).unwrap();
        let lambda = SPEED_OF_LIGHT / 1e9;
        let expected = 2.0f64.sqrt() * lambda / 10.0;
        assert_abs_diff_eq!(w_h, expected, epsilon = 1e-12);
        assert_abs_diff_eq!(w_v, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_expected_width_asymmetric_factors() {
        let (w_h, w_v) = expected_width(1e9, 10.0, (1.0, 2.0)).unwrap();
        assert_abs_diff_eq!(w_v, 2.0 * w_h, epsilon = 1e-12);
    }

    #[test]
    fn test_expected_width_zero_frequency_errs() {
        assert!(expected_width(0.0, 10.0, (1.22, 1.22)).is_err());
    }

    /// S1: a single antenna's response is a perfect Gaussian sampled at the
    /// 5 literal offsets in spec.md §8, with `sigma = 0.3 deg`. The antenna
    /// geometry is chosen so the expected beamwidth exactly matches the
    /// synthetic Gaussian's FWHM (ratio 1.0, comfortably inside the
    /// `(0.9, thresh_width)` validity band).
    #[test]
    fn test_solve_vis_recovers_centred_gaussian() {
        let sigma_deg = 0.3;
        let fwhm_true_rad = sigma_to_fwhm(sigma_deg.to_radians());
        let freq = 1.4e9;
        let k = 1.22;
        let lambda = SPEED_OF_LIGHT / freq;
        let diameter = 2.0f64.sqrt() * k * lambda / fwhm_true_rad;

        let antennas = vec![Antenna::new("m000", [0.0, 0.0, 0.0], diameter, (k, k))];

        let offsets_deg = [[0.0, -1.0], [0.0, 0.0], [0.0, 1.0], [-1.0, 0.0], [1.0, 0.0]];
        let sigma_rad = fwhm_to_sigma(fwhm_true_rad);

        let mut x = Array3::<f64>::zeros((5, 1, 2));
        let mut y = Array2::<f64>::zeros((1, 5));
        let w = Array2::<f64>::ones((1, 5));
        for (s, offset_deg) in offsets_deg.iter().enumerate() {
            let p = [offset_deg[0].to_radians(), offset_deg[1].to_radians()];
            x[[s, 0, 0]] = p[0];
            x[[s, 0, 1]] = p[1];
            let r2 = p[0] * p[0] / sigma_rad.powi(2) + p[1] * p[1] / sigma_rad.powi(2);
            y[[0, s]] = (-0.5 * r2).exp();
        }

        let reduced = ReducedScans::Vis { x, y, w, f: freq };
        let solver = OffsetSolver::new(&antennas, 1.5);
        let fitted = solver.solve(&reduced, false).unwrap();

        assert_eq!(fitted.len(), 1);
        assert_eq!(fitted[0].len(), 1);
        let beam = &fitted[0][0];
        assert!(beam.is_valid, "beam should be valid: {beam:?}");
        assert_abs_diff_eq!(beam.centre[0], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(beam.centre[1], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(beam.width_fwhm[0], fwhm_true_rad, epsilon = 1e-3 * fwhm_true_rad);
    }

    /// S2: the same Gaussian shifted by `(0.1 deg, -0.05 deg)`.
    #[test]
    fn test_solve_vis_recovers_shifted_gaussian() {
        let sigma_deg = 0.3;
        let fwhm_true_rad = sigma_to_fwhm(sigma_deg.to_radians());
        let freq = 1.4e9;
        let k = 1.22;
        let lambda = SPEED_OF_LIGHT / freq;
        let diameter = 2.0f64.sqrt() * k * lambda / fwhm_true_rad;

        let antennas = vec![Antenna::new("m000", [0.0, 0.0, 0.0], diameter, (k, k))];

        let shift_deg = [0.1, -0.05];
        let offsets_deg = [[0.0, -1.0], [0.0, 0.0], [0.0, 1.0], [-1.0, 0.0], [1.0, 0.0]];
        let sigma_rad = fwhm_to_sigma(fwhm_true_rad);
        let shift_rad = [shift_deg[0].to_radians(), shift_deg[1].to_radians()];

        let mut x = Array3::<f64>::zeros((5, 1, 2));
        let mut y = Array2::<f64>::zeros((1, 5));
        let w = Array2::<f64>::ones((1, 5));
        for (s, offset_deg) in offsets_deg.iter().enumerate() {
            let p = [offset_deg[0].to_radians(), offset_deg[1].to_radians()];
            x[[s, 0, 0]] = p[0];
            x[[s, 0, 1]] = p[1];
            let d0 = p[0] - shift_rad[0];
            let d1 = p[1] - shift_rad[1];
            let r2 = d0 * d0 / sigma_rad.powi(2) + d1 * d1 / sigma_rad.powi(2);
            y[[0, s]] = (-0.5 * r2).exp();
        }

        let reduced = ReducedScans::Vis { x, y, w, f: freq };
        let solver = OffsetSolver::new(&antennas, 1.5);
        let fitted = solver.solve(&reduced, false).unwrap();

        let beam = &fitted[0][0];
        assert!(beam.is_valid);
        assert_abs_diff_eq!(beam.centre[0], shift_rad[0], epsilon = 1e-3f64.to_radians());
        assert_abs_diff_eq!(beam.centre[1], shift_rad[1], epsilon = 1e-3f64.to_radians());
    }

    /// S3: a fit whose width is twice the expected beamwidth is marked
    /// invalid, even though the centre recovers exactly.
    #[test]
    fn test_solve_vis_rejects_too_wide_fit() {
        let expected_fwhm_rad = 0.012;
        let freq = 1.4e9;
        let k = 1.22;
        let lambda = SPEED_OF_LIGHT / freq;
        let diameter = 2.0f64.sqrt() * k * lambda / expected_fwhm_rad;

        let antennas = vec![Antenna::new("m000", [0.0, 0.0, 0.0], diameter, (k, k))];

        // Actual data is twice as wide as expected.
        let true_fwhm_rad = 2.0 * expected_fwhm_rad;
        let sigma_rad = fwhm_to_sigma(true_fwhm_rad);
        let offsets_deg = [[0.0, -1.0], [0.0, 0.0], [0.0, 1.0], [-1.0, 0.0], [1.0, 0.0]];

        let mut x = Array3::<f64>::zeros((5, 1, 2));
        let mut y = Array2::<f64>::zeros((1, 5));
        let w = Array2::<f64>::ones((1, 5));
        for (s, offset_deg) in offsets_deg.iter().enumerate() {
            let p = [offset_deg[0].to_radians(), offset_deg[1].to_radians()];
            x[[s, 0, 0]] = p[0];
            x[[s, 0, 1]] = p[1];
            let r2 = p[0] * p[0] / sigma_rad.powi(2) + p[1] * p[1] / sigma_rad.powi(2);
            y[[0, s]] = (-0.5 * r2).exp();
        }

        let reduced = ReducedScans::Vis { x, y, w, f: freq };
        let solver = OffsetSolver::new(&antennas, 1.5);
        let fitted = solver.solve(&reduced, false).unwrap();

        assert!(!fitted[0][0].is_valid);
    }

    #[test]
    fn test_solve_gains_drops_band_edges() {
        let antennas = vec![Antenna::new("m000", [0.0, 0.0, 0.0], 13.5, (1.22, 1.22))];
        // 4 sub-bands; only the middle two (indices 1, 2) are kept.
        let num_chunks = 4;
        let x = Array3::<f64>::zeros((5, 1, 2));
        let y = Array3::<f64>::from_elem((1, num_chunks, 5), 0.5);
        let w = Array3::<f64>::ones((1, num_chunks, 5));
        let f = vec![1.3e9, 1.35e9, 1.4e9, 1.45e9];

        let reduced = ReducedScans::Gains { x, y, w, f };
        let solver = OffsetSolver::new(&antennas, 1.5);
        let fitted = solver.solve(&reduced, false).unwrap();
        assert_eq!(fitted[0].len(), 2);
    }

    #[test]
    fn test_solve_gains_single_chunk_not_dropped() {
        let antennas = vec![Antenna::new("m000", [0.0, 0.0, 0.0], 13.5, (1.22, 1.22))];
        let x = Array3::<f64>::zeros((5, 1, 2));
        let y = Array3::<f64>::from_elem((1, 1, 5), 0.5);
        let w = Array3::<f64>::ones((1, 1, 5));
        let f = vec![1.4e9];

        let reduced = ReducedScans::Gains { x, y, w, f };
        let solver = OffsetSolver::new(&antennas, 1.5);
        let fitted = solver.solve(&reduced, false).unwrap();
        assert_eq!(fitted[0].len(), 1);
    }

}
