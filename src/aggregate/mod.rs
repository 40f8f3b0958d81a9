// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Combines the (possibly several, one per sub-band) fitted beams for each
//! antenna into a single az/el/cross-el pointing-offset row (spec.md §4.5).

pub mod error;

use std::f64::consts::PI;

pub use error::AggregateError;

use crate::antenna::Antenna;
use crate::beam::FittedBeam;
use crate::coord::{elevation, wrap_pi, RADec};
use crate::time::median_timestamp;

const RADIANS_TO_ARCMIN: f64 = (180.0 / PI) * 60.0;

/// One antenna's final, reported pointing offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OffsetRow {
    pub az_arcmin: f64,
    pub el_arcmin: f64,
    pub cross_el_arcmin: f64,
}

impl OffsetRow {
    /// All-NaN row, reported for an antenna with no valid beam fit.
    fn nan() -> Self {
        Self {
            az_arcmin: f64::NAN,
            el_arcmin: f64::NAN,
            cross_el_arcmin: f64::NAN,
        }
    }
}

/// Aggregates `fitted[antenna][sub_band]` into one [`OffsetRow`] per
/// antenna.
///
/// Sub-band centres are combined by inverse-variance weighting (only the
/// valid ones contribute); an antenna with zero valid sub-bands gets a row
/// of NaNs rather than failing the whole run. The cross-elevation offset
/// uses the calibrator's own elevation (not the antenna's actual pointing
/// elevation) at the median pointing timestamp, matching `weighted_average`
/// in the workflow this was built from.
pub fn aggregate(
    antennas: &[Antenna],
    fitted: &[Vec<FittedBeam>],
    target: RADec,
    pointing_times: &[f64],
) -> Result<Vec<OffsetRow>, AggregateError> {
    if antennas.len() != fitted.len() {
        return Err(AggregateError::AntennaFitMismatch {
            antennas: antennas.len(),
            fits: fitted.len(),
        });
    }
    if pointing_times.is_empty() {
        return Err(AggregateError::NoTimestamps);
    }

    let median_time = median_timestamp(pointing_times);

    let mut rows = Vec::with_capacity(antennas.len());
    for (antenna, beams) in antennas.iter().zip(fitted.iter()) {
        let valid: Vec<&FittedBeam> = beams.iter().filter(|b| b.is_valid).collect();
        if valid.is_empty() {
            log::warn!("{} had no valid primary beam fitted", antenna.name);
            rows.push(OffsetRow::nan());
            continue;
        }

        let (az_offset, el_offset) = weighted_centre(&valid);
        let az_offset = wrap_pi(az_offset);
        let el_offset = wrap_pi(el_offset);

        let target_el = elevation(target, antenna.location, median_time);
        let cross_el_offset = az_offset * target_el.cos();

        rows.push(OffsetRow {
            az_arcmin: az_offset * RADIANS_TO_ARCMIN,
            el_arcmin: el_offset * RADIANS_TO_ARCMIN,
            cross_el_arcmin: cross_el_offset * RADIANS_TO_ARCMIN,
        });
    }

    Ok(rows)
}

/// Inverse-variance weighted mean of the (az, el) centres of `valid` beams,
/// using each centre's own standard error as its uncertainty. Falls back to
/// an unweighted mean if every contributing standard error is zero (a
/// single, perfectly-determined fit).
fn weighted_centre(valid: &[&FittedBeam]) -> (f64, f64) {
    let mut sum_w = [0.0f64; 2];
    let mut sum_wc = [0.0f64; 2];
    for beam in valid {
        for axis in 0..2 {
            let err = beam.centre_err[axis];
            let w = if err > 0.0 { 1.0 / (err * err) } else { 0.0 };
            sum_w[axis] += w;
            sum_wc[axis] += w * beam.centre[axis];
        }
    }

    let mut out = [0.0f64; 2];
    for axis in 0..2 {
        out[axis] = if sum_w[axis] > 0.0 {
            sum_wc[axis] / sum_w[axis]
        } else {
            valid.iter().map(|b| b.centre[axis]).sum::<f64>() / valid.len() as f64
        };
    }
    (out[0], out[1])
}
