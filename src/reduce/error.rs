// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Errors associated with reducing raw [`crate::scan::Scan`]s down to the
/// per-antenna, per-scan observable the beam fitter consumes.
#[derive(Error, Debug)]
pub enum ReduceError {
    #[error("no scans were supplied")]
    NoScans,

    #[error("scan {scan} has no autocorrelation baselines")]
    NoAutocorrelations { scan: usize },

    #[error("scan {scan} carries {got} polarisations; expected 2 or 4")]
    UnsupportedPolarisationCount { scan: usize, got: usize },

    #[error("gain calibration failed for scan {scan}: {source}")]
    GainCal {
        scan: usize,
        #[source]
        source: crate::gaincal::GainCalError,
    },
}
