// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reduces raw [`Scan`]s down to the `(x, y, w, f)` observable the beam
//! fitter needs: per-antenna pointing offsets `x`, per-antenna amplitude (or
//! gain) `y` and its weight `w`, and a representative frequency `f`
//! (spec.md §4.2).

pub mod error;

use ndarray::{Array1, Array2, Array3, ArrayView2, Axis};

pub use error::ReduceError;

use crate::gaincal::solve_scan_gains;
use crate::scan::Scan;

/// How repeated-in-time samples are collapsed to a single value.
///
/// `NoAverage` takes the first timestamp's sample, matching the original
/// workflow's `time_avg=None` default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeAverage {
    NoAverage,
    Median,
    Mean,
}

/// The per-scan reduction, shaped differently depending on whether the
/// observable came from raw visibilities or from solved gains (see
/// `SPEC_FULL.md` §9 design notes on why this is a concrete enum rather
/// than a trait object).
#[derive(Clone, Debug)]
pub enum ReducedScans {
    Vis {
        /// `[scan, antenna, 2]`, average (az, el) pointing offset per scan.
        x: Array3<f64>,
        /// `[antenna, scan]`.
        y: Array2<f64>,
        /// `[antenna, scan]`.
        w: Array2<f64>,
        /// A single representative frequency, Hz.
        f: f64,
    },
    Gains {
        x: Array3<f64>,
        /// `[antenna, chunk, scan]`.
        y: Array3<f64>,
        /// `[antenna, chunk, scan]`.
        w: Array3<f64>,
        /// One representative frequency per chunk, Hz.
        f: Vec<f64>,
    },
}

impl ReducedScans {
    pub fn pointing(&self) -> &Array3<f64> {
        match self {
            ReducedScans::Vis { x, .. } => x,
            ReducedScans::Gains { x, .. } => x,
        }
    }
}

/// Reduces a set of scans using autocorrelation visibility amplitudes
/// (`from_vis` in the original workflow).
///
/// Only autocorrelations are ever consumed; a baseline-to-antenna mapping
/// for cross-correlation visibility amplitudes (flagged `ORC-1572` in the
/// source this crate was built from) is an open question in the upstream
/// workflow and is deliberately not implemented here.
pub fn from_vis(
    scans: &[Scan],
    num_antennas: usize,
    time_avg: TimeAverage,
) -> Result<ReducedScans, ReduceError> {
    if scans.is_empty() {
        return Err(ReduceError::NoScans);
    }

    let mut x = Array3::<f64>::zeros((scans.len(), num_antennas, 2));
    let mut y = Array2::<f64>::zeros((num_antennas, scans.len()));
    let mut w = Array2::<f64>::zeros((num_antennas, scans.len()));
    let mut frequency = 0.0;

    for (scan_idx, scan) in scans.iter().enumerate() {
        x.index_axis_mut(Axis(0), scan_idx)
            .assign(&mean_pointing(scan));

        let auto_baselines = scan.autocorrelation_baselines();
        if auto_baselines.is_empty() {
            return Err(ReduceError::NoAutocorrelations { scan: scan_idx });
        }

        // spec.md §4.2: a 2-pol dataset (XX,YY / RR,LL) is used directly; a
        // 4-pol dataset is reduced to its parallel-hand products only
        // (the first and last of XX,XY,YX,YY). Found by polarisation
        // identity rather than assumed position, so an unusual ordering
        // doesn't silently average in a cross-hand product.
        let parallel_hand_pols: Vec<usize> = scan
            .polarisation
            .iter()
            .enumerate()
            .filter_map(|(i, pol)| pol.is_parallel_hand().then_some(i))
            .collect();
        if scan.polarisation.len() != 2 && scan.polarisation.len() != 4
            || parallel_hand_pols.len() != 2
        {
            return Err(ReduceError::UnsupportedPolarisationCount {
                scan: scan_idx,
                got: scan.polarisation.len(),
            });
        }

        let num_times = scan.vis.shape()[0];
        let mut amp = Array2::<f64>::zeros((num_times, num_antennas));
        let mut weight = Array2::<f64>::zeros((num_times, num_antennas));
        for &bl in &auto_baselines {
            let ant = scan.autocorrelation_antenna(bl);
            for t in 0..num_times {
                let (mut a, mut wsum, mut n) = (0.0, 0.0, 0.0);
                for chan in 0..scan.frequency.len() {
                    for &pol in &parallel_hand_pols {
                        a += scan.vis[[t, bl, chan, pol]].norm();
                        wsum += scan.weight[[t, bl, chan, pol]];
                        n += 1.0;
                    }
                }
                amp[[t, ant]] = a / n;
                weight[[t, ant]] = wsum / n;
            }
        }

        y.index_axis_mut(Axis(1), scan_idx)
            .assign(&time_avg_1d(amp.view(), time_avg));
        w.index_axis_mut(Axis(1), scan_idx)
            .assign(&time_avg_1d(weight.view(), time_avg));

        if scan_idx == 0 {
            // The higher end of the band gives better pointing accuracy.
            frequency = *scan.frequency.last().expect("scan has a frequency axis");
        }
    }

    Ok(ReducedScans::Vis {
        x,
        y,
        w,
        f: frequency,
    })
}

/// Reduces a set of scans by solving for antenna gains in `num_chunks`
/// frequency chunks (`from_gains` in the original workflow).
///
/// Unlike [`from_vis`], this takes no [`TimeAverage`]: [`solve_scan_gains`]
/// solves once over a scan's full time range rather than per timestep (see
/// `DESIGN.md`'s "single gain solve per scan" decision), so by the time a
/// gain table reaches this function its time axis is already collapsed to
/// one sample and there is nothing left to average over. `--time_avg` only
/// has an effect on [`from_vis`].
pub fn from_gains(
    scans: &[Scan],
    num_antennas: usize,
    num_chunks: usize,
) -> Result<ReducedScans, ReduceError> {
    if scans.is_empty() {
        return Err(ReduceError::NoScans);
    }

    // Solve the first scan to discover how many chunks we actually got
    // (solve_scan_gains may fall back to 1 if num_chunks doesn't divide).
    let first_chunks = solve_scan_gains(&scans[0], num_antennas, num_chunks)
        .map_err(|source| ReduceError::GainCal { scan: 0, source })?;
    let n_chunks = first_chunks.len();

    let mut x = Array3::<f64>::zeros((scans.len(), num_antennas, 2));
    let mut y = Array3::<f64>::zeros((num_antennas, n_chunks, scans.len()));
    let mut w = Array3::<f64>::zeros((num_antennas, n_chunks, scans.len()));
    let mut frequency = vec![0.0; n_chunks];

    for (scan_idx, scan) in scans.iter().enumerate() {
        x.index_axis_mut(Axis(0), scan_idx)
            .assign(&mean_pointing(scan));

        let chunks = if scan_idx == 0 {
            first_chunks.clone()
        } else {
            solve_scan_gains(scan, num_antennas, num_chunks)
                .map_err(|source| ReduceError::GainCal { scan: scan_idx, source })?
        };

        for (chunk_idx, chunk) in chunks.iter().enumerate() {
            frequency[chunk_idx] = chunk.frequency;
            for ant in 0..num_antennas {
                let g = chunk.gains[ant];
                let n = g.norm_sqr();
                let amp = 0.5 * (n[0].sqrt() + n[3].sqrt());
                y[[ant, chunk_idx, scan_idx]] = amp;
                w[[ant, chunk_idx, scan_idx]] = chunk.weights[ant];
            }
        }
    }

    Ok(ReducedScans::Gains {
        x,
        y,
        w,
        f: frequency,
    })
}

/// Mean antenna pointing offset over a scan's time axis, shape `[antenna, 2]`.
fn mean_pointing(scan: &Scan) -> Array2<f64> {
    let num_ants = scan.pointing.shape()[1];
    let mut out = Array2::<f64>::zeros((num_ants, 2));
    let num_times = scan.pointing.shape()[0] as f64;
    for t in 0..scan.pointing.shape()[0] {
        for ant in 0..num_ants {
            out[[ant, 0]] += scan.pointing[[t, ant, 0]];
            out[[ant, 1]] += scan.pointing[[t, ant, 1]];
        }
    }
    out.mapv_inplace(|v| v / num_times);
    out
}

/// Collapses `data` (`[time, antenna]`) to `[antenna]` per [`TimeAverage`].
fn time_avg_1d(data: ArrayView2<f64>, mode: TimeAverage) -> Array1<f64> {
    match mode {
        TimeAverage::NoAverage => data.index_axis(Axis(0), 0).to_owned(),
        TimeAverage::Mean => data.mean_axis(Axis(0)).expect("non-empty time axis"),
        TimeAverage::Median => {
            let num_ants = data.shape()[1];
            let mut out = Array1::<f64>::zeros(num_ants);
            for ant in 0..num_ants {
                let mut column: Vec<f64> = data.column(ant).to_vec();
                column.sort_by(|a, b| a.partial_cmp(b).expect("value is not NaN"));
                let mid = column.len() / 2;
                out[ant] = if column.len() % 2 == 0 {
                    0.5 * (column[mid - 1] + column[mid])
                } else {
                    column[mid]
                };
            }
            out
        }
    }
}
