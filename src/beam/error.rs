// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Errors associated with fitting a [`crate::beam::BeamModel`].
#[derive(Error, Debug)]
pub enum BeamFitError {
    #[error("x has {x_len} points but y has {y_len}; they must match")]
    MismatchedLengths { x_len: usize, y_len: usize },

    #[error("need at least 5 points to fit a 5-parameter beam model, got {got}")]
    TooFewPoints { got: usize },

    #[error("the initial beam width guess must be positive, got {0}")]
    NonPositiveWidth(f64),
}
