// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all pointing-offset-related errors. This should be the
//! *only* error enum that is publicly visible.

use thiserror::Error;

use crate::aggregate::AggregateError;
use crate::array_utils::ArrayUtilsError;
use crate::beam::BeamFitError;
use crate::gaincal::GainCalError;
use crate::io::IoError;
use crate::reduce::ReduceError;
use crate::solve::SolveError;

/// The *only* publicly visible error from this crate.
#[derive(Error, Debug)]
pub enum PointingOffsetError {
    /// An error related to preparing the frequency axis or pointing
    /// timestamps.
    #[error("{0}")]
    ArrayUtils(String),

    /// An error related to reducing scans to a fittable observable.
    #[error("{0}")]
    Reduce(String),

    /// An error related to gain calibration.
    #[error("{0}")]
    GainCal(String),

    /// An error related to the Gaussian beam fit.
    #[error("{0}")]
    BeamFit(String),

    /// An error related to driving the per-antenna/per-sub-band solve.
    #[error("{0}")]
    Solve(String),

    /// An error related to aggregating fitted beams into offsets.
    #[error("{0}")]
    Aggregate(String),

    /// An error related to reading or writing files.
    #[error("{0}")]
    Io(String),

    /// A generic error that can't be clarified further, e.g. CLI argument
    /// validation.
    #[error("{0}")]
    Generic(String),
}

impl From<ArrayUtilsError> for PointingOffsetError {
    fn from(e: ArrayUtilsError) -> Self {
        Self::ArrayUtils(e.to_string())
    }
}

impl From<ReduceError> for PointingOffsetError {
    fn from(e: ReduceError) -> Self {
        let s = e.to_string();
        match e {
            ReduceError::GainCal { source, .. } => Self::from(source),
            _ => Self::Reduce(s),
        }
    }
}

impl From<GainCalError> for PointingOffsetError {
    fn from(e: GainCalError) -> Self {
        Self::GainCal(e.to_string())
    }
}

impl From<BeamFitError> for PointingOffsetError {
    fn from(e: BeamFitError) -> Self {
        Self::BeamFit(e.to_string())
    }
}

impl From<SolveError> for PointingOffsetError {
    fn from(e: SolveError) -> Self {
        let s = e.to_string();
        match e {
            SolveError::BeamFit(e) => Self::from(e),
            _ => Self::Solve(s),
        }
    }
}

impl From<AggregateError> for PointingOffsetError {
    fn from(e: AggregateError) -> Self {
        Self::Aggregate(e.to_string())
    }
}

impl From<IoError> for PointingOffsetError {
    fn from(e: IoError) -> Self {
        Self::Io(e.to_string())
    }
}
