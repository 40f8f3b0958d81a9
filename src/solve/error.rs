// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Errors associated with driving the per-antenna beam fits
/// ([`crate::solve`]).
#[derive(Error, Debug)]
pub enum SolveError {
    #[error("frequency {0} Hz gives a non-finite wavelength; check the frequency range")]
    NonFiniteWavelength(f64),

    #[error("beam fit failed: {0}")]
    BeamFit(#[from] crate::beam::BeamFitError),
}
