// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The per-scan input record (spec.md §3, §6).

use marlu::c64;
use ndarray::{Array1, Array3, Array4, Axis};
use strum_macros::{Display, EnumString};

use crate::coord::RADec;

/// A single correlation product. Only the parallel-hand products (`XX`,
/// `YY`, `RR`, `LL`) are ever consumed by [`crate::reduce`]; the
/// cross-hands are accepted on input (a 4-pol dataset always carries all
/// four) but dropped during reduction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
pub enum Polarisation {
    XX,
    XY,
    YX,
    YY,
    RR,
    RL,
    LR,
    LL,
}

impl Polarisation {
    /// True for the products kept by the parallel-hand reduction in
    /// `spec.md` §4.2.
    pub fn is_parallel_hand(self) -> bool {
        matches!(self, Self::XX | Self::YY | Self::RR | Self::LL)
    }
}

/// The shared, immutable calibrator target.
#[derive(Clone, Debug)]
pub struct Target {
    pub radec: RADec,
    pub name: String,
}

/// One observation at a single commanded pointing offset.
///
/// `vis`/`weight` are indexed `[time, baseline, channel, polarisation]`;
/// `pointing` is indexed `[time, antenna, 2]` with the last axis holding
/// `(az, el)` offsets from the calibrator, in radians. `antenna1`/
/// `antenna2` give the baseline endpoints (antenna indices into the
/// antenna list shared by every scan).
#[derive(Clone, Debug)]
pub struct Scan {
    pub vis: Array4<c64>,
    pub weight: Array4<f64>,
    pub time: Array1<f64>,
    pub pointing: Array3<f64>,
    pub pointing_time: Array1<f64>,
    pub antenna1: Vec<usize>,
    pub antenna2: Vec<usize>,
    pub frequency: Vec<f64>,
    pub polarisation: Vec<Polarisation>,
}

impl Scan {
    /// Indices of the autocorrelation baselines, i.e. `antenna1 == antenna2`.
    pub fn autocorrelation_baselines(&self) -> Vec<usize> {
        self.antenna1
            .iter()
            .zip(self.antenna2.iter())
            .enumerate()
            .filter_map(|(i, (a1, a2))| if a1 == a2 { Some(i) } else { None })
            .collect()
    }

    /// The antenna index that owns autocorrelation baseline `bl_index`.
    pub fn autocorrelation_antenna(&self, bl_index: usize) -> usize {
        self.antenna1[bl_index]
    }

    /// Restricts this scan to the given channel indices, as produced by
    /// [`crate::array_utils::apply_rfi_mask`] and
    /// [`crate::array_utils::select_channels`].
    pub fn select_channels(&self, channels: &[usize]) -> Self {
        Self {
            vis: self.vis.select(Axis(2), channels),
            weight: self.weight.select(Axis(2), channels),
            time: self.time.clone(),
            pointing: self.pointing.clone(),
            pointing_time: self.pointing_time.clone(),
            antenna1: self.antenna1.clone(),
            antenna2: self.antenna2.clone(),
            frequency: channels.iter().map(|&c| self.frequency[c]).collect(),
            polarisation: self.polarisation.clone(),
        }
    }
}
