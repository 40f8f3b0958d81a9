// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Errors associated with aggregating fitted beams into [`crate::aggregate::OffsetRow`]s.
#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("antenna count ({antennas}) doesn't match fitted-beam count ({fits})")]
    AntennaFitMismatch { antennas: usize, fits: usize },

    #[error("no pointing timestamps were supplied")]
    NoTimestamps,
}
