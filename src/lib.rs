// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Computes per-antenna pointing offsets for a dish interferometer from an
//! interferometric pointing-calibration observation.
//!
//! Given a set of scans taken at commanded pointing offsets from a bright,
//! unresolved calibrator, this crate fits a 2-D Gaussian primary beam to
//! either the autocorrelation visibility amplitudes or the solved antenna
//! gain amplitudes, and reports the az/el/cross-el offset between the
//! commanded and the true pointing centre for every antenna.

pub mod aggregate;
pub mod antenna;
pub mod array_utils;
pub mod beam;
pub mod cli;
pub mod constants;
pub mod coord;
pub(crate) mod error;
pub mod gaincal;
pub mod io;
pub mod logging;
pub mod reduce;
pub mod scan;
pub mod solve;
pub(crate) mod time;

mod run;

pub use error::PointingOffsetError;
pub use run::run_compute;
