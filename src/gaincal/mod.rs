// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-antenna complex gain solution, narrowed to the single, unresolved
//! point-source calibrator model a pointing-offset scan actually needs
//! (spec.md §4.6).
//!
//! The iterative solve below is MitchCal/StefCal, the same
//! alternating-direction scheme the direction-independent calibration code
//! in this crate's ancestry hand-rolls for the general multi-source case;
//! here the sky model is fixed at the identity Jones matrix for every
//! baseline and channel, since the calibrator is unresolved and at the
//! phase centre.

pub mod error;

use std::ops::Range;

use marlu::{c64, Jones};
use ndarray::Array1;

pub use error::GainCalError;

use crate::constants::{GAINCAL_MAX_ITERATIONS, GAINCAL_TOLERANCE};
use crate::scan::Scan;

/// The solved, unnormalised antenna gains for one frequency chunk of one
/// scan.
#[derive(Clone, Debug)]
pub struct GainChunk {
    pub gains: Array1<Jones<f64>>,
    pub weights: Array1<f64>,
    pub frequency: f64,
}

/// Solves for one [`GainChunk`] per frequency chunk. Falls back to a single
/// chunk, with a warning, when `num_channels` isn't divisible by
/// `num_chunks` (matching `_compute_gains`'s `ValueError` fallback in the
/// original workflow).
pub fn solve_scan_gains(
    scan: &Scan,
    num_antennas: usize,
    num_chunks: usize,
) -> Result<Vec<GainChunk>, GainCalError> {
    let num_channels = scan.frequency.len();
    let chunks = if num_chunks > 1 {
        if num_channels % num_chunks == 0 {
            num_chunks
        } else {
            log::warn!(
                "{num_channels} frequency channels not divisible by num_chunks={num_chunks}; \
                 using num_chunks=1 instead"
            );
            1
        }
    } else {
        1
    };
    let chan_per_chunk = num_channels / chunks;

    let cross_baselines: Vec<usize> = scan
        .antenna1
        .iter()
        .zip(scan.antenna2.iter())
        .enumerate()
        .filter_map(|(i, (a1, a2))| if a1 != a2 { Some(i) } else { None })
        .collect();
    if cross_baselines.is_empty() {
        return Err(GainCalError::NoCrossCorrelations);
    }

    let mut chunks_out = Vec::with_capacity(chunks);
    for chunk in 0..chunks {
        let chan_start = chunk * chan_per_chunk;
        let chan_range = chan_start..chan_start + chan_per_chunk;
        let frequency =
            scan.frequency[chan_range.clone()].iter().sum::<f64>() / chan_per_chunk as f64;
        let (gains, weights) = solve_chunk(scan, num_antennas, &cross_baselines, chan_range)?;
        chunks_out.push(GainChunk {
            gains,
            weights,
            frequency,
        });
    }
    Ok(chunks_out)
}

/// Averages a channel range of a scan's cross-correlations down to one
/// `Jones<f64>` per `(time, baseline)`, then solves for one gain per
/// antenna via MitchCal.
fn solve_chunk(
    scan: &Scan,
    num_antennas: usize,
    cross_baselines: &[usize],
    chan_range: Range<usize>,
) -> Result<(Array1<Jones<f64>>, Array1<f64>), GainCalError> {
    let npol = scan.polarisation.len();
    if npol != 2 && npol != 4 {
        return Err(GainCalError::UnsupportedPolarisationCount { got: npol });
    }

    let num_times = scan.vis.shape()[0];
    let num_chans = chan_range.len() as f64;

    // data/model indexed [time][baseline index into cross_baselines].
    let mut data = Vec::with_capacity(num_times * cross_baselines.len());
    for t in 0..num_times {
        let mut row = Vec::with_capacity(cross_baselines.len());
        for &bl in cross_baselines {
            let mut acc = [c64::new(0.0, 0.0); 4];
            for chan in chan_range.clone() {
                if npol == 4 {
                    for (pol, slot) in acc.iter_mut().enumerate() {
                        *slot += scan.vis[[t, bl, chan, pol]];
                    }
                } else {
                    acc[0] += scan.vis[[t, bl, chan, 0]];
                    acc[3] += scan.vis[[t, bl, chan, 1]];
                }
            }
            for slot in acc.iter_mut() {
                *slot /= num_chans;
            }
            row.push(Jones::from(acc));
        }
        data.push(row);
    }

    // An unresolved calibrator at the phase centre: the model is the
    // identity Jones matrix on every baseline and channel.
    let model = Jones::from([
        c64::new(1.0, 0.0),
        c64::new(0.0, 0.0),
        c64::new(0.0, 0.0),
        c64::new(1.0, 0.0),
    ]);

    let mut gains: Array1<Jones<f64>> = Array1::from_elem(num_antennas, model);
    let mut failed = vec![false; num_antennas];

    let mut iteration = 0;
    let mut new_gains = gains.clone();
    while iteration < GAINCAL_MAX_ITERATIONS {
        iteration += 1;
        let mut top: Array1<Jones<f64>> = Array1::from_elem(num_antennas, Jones::default());
        let mut bot: Array1<Jones<f64>> = Array1::from_elem(num_antennas, Jones::default());

        for t in 0..num_times {
            for (bl_idx, &bl) in cross_baselines.iter().enumerate() {
                let a1 = scan.antenna1[bl];
                let a2 = scan.antenna2[bl];
                let j_data = data[t][bl_idx];

                let j_a2 = gains[a2];
                let z = j_a2 * model.h();
                top[a1] += j_data * z;
                bot[a1] += z.h() * z;

                let j_a1 = gains[a1];
                let z = j_a1 * model;
                top[a2] += j_data.h() * z;
                bot[a2] += z.h() * z;
            }
        }

        for ant in 0..num_antennas {
            if failed[ant] {
                continue;
            }
            let candidate = top[ant] / bot[ant];
            if candidate.any_nan() {
                failed[ant] = true;
                gains[ant] = Jones::nan();
                new_gains[ant] = Jones::nan();
            } else {
                new_gains[ant] = candidate;
            }
        }

        let num_failed = failed.iter().filter(|&&f| f).count();
        if num_antennas - num_failed <= 4 {
            return Err(GainCalError::TooFewAntennas {
                got: num_antennas - num_failed,
            });
        }

        if iteration % 2 == 0 {
            let mut max_diff: f64 = 0.0;
            for ant in 0..num_antennas {
                if failed[ant] {
                    continue;
                }
                let diff = new_gains[ant] - gains[ant];
                let norm = diff.norm_sqr();
                max_diff = max_diff.max(norm[0]).max(norm[1]).max(norm[2]).max(norm[3]);
                gains[ant] = (gains[ant] + new_gains[ant]) * 0.5;
            }
            if max_diff < GAINCAL_TOLERANCE {
                break;
            }
        } else {
            gains.assign(&new_gains);
        }
    }

    // Per-antenna weight: total weighted cross-correlation count the
    // antenna's solve was built from. A simple, well-conditioned antenna
    // (many unflagged baselines) gets a larger weight than one close to
    // being dropped.
    let mut weights = Array1::<f64>::zeros(num_antennas);
    for &bl in cross_baselines {
        let a1 = scan.antenna1[bl];
        let a2 = scan.antenna2[bl];
        weights[a1] += num_times as f64;
        weights[a2] += num_times as f64;
    }
    for ant in 0..num_antennas {
        if failed[ant] {
            weights[ant] = 0.0;
        }
    }

    Ok((gains, weights))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::{Array3, Array4};

    use super::*;
    use crate::scan::{Polarisation, Scan};

    /// A scan with `num_antennas` antennas, every cross-correlation baseline
    /// present once, `num_times` identical time samples, and `vis` set to
    /// `jones` on every baseline/channel/time (the rest of the fields are
    /// irrelevant to gain calibration and left at a harmless default).
    fn synthetic_scan(num_antennas: usize, num_times: usize, num_chan: usize, jones: [c64; 4]) -> Scan {
        let mut antenna1 = Vec::new();
        let mut antenna2 = Vec::new();
        for a1 in 0..num_antennas {
            for a2 in (a1 + 1)..num_antennas {
                antenna1.push(a1);
                antenna2.push(a2);
            }
        }
        let num_baselines = antenna1.len();

        let mut vis = Array4::<c64>::zeros((num_times, num_baselines, num_chan, 4));
        let weight = Array4::<f64>::ones((num_times, num_baselines, num_chan, 4));
        for t in 0..num_times {
            for bl in 0..num_baselines {
                for chan in 0..num_chan {
                    for (pol, &v) in jones.iter().enumerate() {
                        vis[[t, bl, chan, pol]] = v;
                    }
                }
            }
        }

        Scan {
            vis,
            weight,
            time: Array1::from_vec((0..num_times).map(|t| t as f64).collect()),
            pointing: Array3::<f64>::zeros((num_times, num_antennas, 2)),
            pointing_time: Array1::from_vec((0..num_times).map(|t| t as f64).collect()),
            antenna1,
            antenna2,
            frequency: vec![1.4e9; num_chan],
            polarisation: vec![
                Polarisation::XX,
                Polarisation::XY,
                Polarisation::YX,
                Polarisation::YY,
            ],
        }
    }

    #[test]
    fn test_solve_scan_gains_recovers_identity() {
        let identity = [
            c64::new(1.0, 0.0),
            c64::new(0.0, 0.0),
            c64::new(0.0, 0.0),
            c64::new(1.0, 0.0),
        ];
        let scan = synthetic_scan(6, 2, 4, identity);

        let chunks = solve_scan_gains(&scan, 6, 1).unwrap();
        assert_eq!(chunks.len(), 1);
        let chunk = &chunks[0];
        assert_abs_diff_eq!(chunk.frequency, 1.4e9);
        for ant in 0..6 {
            let norm = chunk.gains[ant].norm_sqr();
            assert_abs_diff_eq!(norm[0].sqrt(), 1.0, epsilon = 1e-6);
            assert_abs_diff_eq!(norm[3].sqrt(), 1.0, epsilon = 1e-6);
            assert!(chunk.weights[ant] > 0.0);
        }
    }

    #[test]
    fn test_solve_scan_gains_falls_back_when_not_divisible() {
        let identity = [
            c64::new(1.0, 0.0),
            c64::new(0.0, 0.0),
            c64::new(0.0, 0.0),
            c64::new(1.0, 0.0),
        ];
        // 4 channels, 3 chunks: doesn't divide, so falls back to 1 chunk.
        let scan = synthetic_scan(6, 1, 4, identity);
        let chunks = solve_scan_gains(&scan, 6, 3).unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_solve_scan_gains_divisible_chunking() {
        let identity = [
            c64::new(1.0, 0.0),
            c64::new(0.0, 0.0),
            c64::new(0.0, 0.0),
            c64::new(1.0, 0.0),
        ];
        let scan = synthetic_scan(6, 1, 4, identity);
        let chunks = solve_scan_gains(&scan, 6, 2).unwrap();
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_solve_scan_gains_no_cross_correlations_errs() {
        let mut scan = synthetic_scan(6, 1, 4, [c64::new(1.0, 0.0); 4]);
        // Turn every baseline into an autocorrelation.
        scan.antenna2 = scan.antenna1.clone();
        let result = solve_scan_gains(&scan, 6, 1);
        assert!(matches!(result, Err(GainCalError::NoCrossCorrelations)));
    }
}
