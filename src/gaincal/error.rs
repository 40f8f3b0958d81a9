// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Errors associated with the gain-calibration wrapper ([`crate::gaincal`]).
#[derive(Error, Debug)]
pub enum GainCalError {
    #[error("scan has no cross-correlation baselines to solve gains from")]
    NoCrossCorrelations,

    #[error("too few antennas ({got}) remained unflagged to solve for gains; need more than 4")]
    TooFewAntennas { got: usize },

    #[error("scan carries {got} polarisations; expected 2 or 4")]
    UnsupportedPolarisationCount { got: usize },
}
