// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use thiserror::Error;

/// Errors associated with frequency-axis preparation ([`crate::array_utils`]).
#[derive(Error, Debug)]
pub enum ArrayUtilsError {
    #[error("RFI mask file {0} could not be parsed as whitespace-separated 0/1 flags")]
    RfiMaskUnparseable(PathBuf),

    #[error("start_freq ({start}) must be less than end_freq ({end})")]
    InvalidFrequencyRange { start: f64, end: f64 },

    #[error(
        "selecting channels between {start} and {end} left 0 channels out of {num_channels}"
    )]
    NoChannelsSelected {
        start: f64,
        end: f64,
        num_channels: usize,
    },
}
