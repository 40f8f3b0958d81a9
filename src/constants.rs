// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

All constants *must* be double precision; this crate does as much arithmetic
as possible in double precision before converting to a lower precision, if
that is ever required.
 */

pub use std::f64::consts::PI;

/// Speed of light in a vacuum (m/s).
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Default maximum ratio of fitted to expected beamwidth before a fit is
/// rejected (see [`crate::beam::FittedBeam::is_valid`]).
pub const DEFAULT_THRESH_WIDTH: f64 = 1.5;

/// Lower bound of the fitted-to-expected beamwidth ratio. Unlike
/// [`DEFAULT_THRESH_WIDTH`], this is not exposed as a configurable option.
pub const MIN_WIDTH_RATIO: f64 = 0.9;

/// Default number of frequency chunks used when solving for antenna gains.
pub const DEFAULT_NUM_CHUNKS: usize = 16;

/// Maximum number of Levenberg-Marquardt iterations attempted by
/// [`crate::beam::BeamModel::fit`].
pub const MAX_FIT_ITERATIONS: usize = 100;

/// Relative step-size convergence tolerance for the beam fit.
pub const FIT_STEP_TOLERANCE: f64 = 1e-10;

/// Default beamwidth factors (horizontal, vertical) used by the CLI when the
/// user doesn't supply `--bw_factor`. These match the values commonly used
/// for MeerKAT-style dishes.
pub const DEFAULT_BW_FACTOR: (f64, f64) = (0.976, 1.098);

/// Gain-calibration solver iteration cap (see [`crate::gaincal`]).
pub const GAINCAL_MAX_ITERATIONS: usize = 200;

/// Gain-calibration solver convergence tolerance.
pub const GAINCAL_TOLERANCE: f64 = 1e-6;
