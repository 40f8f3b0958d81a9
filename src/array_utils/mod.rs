// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Frequency-axis and pointing-timestamp preparation (spec.md §4.1).

pub mod error;

use std::path::Path;

use ndarray::{Array1, Array3, ArrayView1, ArrayView3};

pub use error::ArrayUtilsError;

/// Applies an RFI mask, read from a whitespace-separated text file of one
/// `0`/`1` flag per channel, to `freqs`. A `1` flags a channel as
/// RFI-contaminated and drops it.
///
/// If `rfi_path` doesn't exist, the observation is assumed unflagged: this
/// matches the original workflow's behaviour of logging and continuing
/// rather than failing the whole run over a missing mask file.
pub fn apply_rfi_mask(
    freqs: ArrayView1<f64>,
    rfi_path: Option<&Path>,
) -> Result<(Array1<f64>, Vec<usize>), ArrayUtilsError> {
    let all_channels: Vec<usize> = (0..freqs.len()).collect();

    let Some(path) = rfi_path else {
        return Ok((freqs.to_owned(), all_channels));
    };

    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => {
            log::info!(
                "Invalid RFI flagging file {}. No RFI flags applied.",
                path.display()
            );
            return Ok((freqs.to_owned(), all_channels));
        }
    };

    let mut mask: Vec<f64> = contents
        .split_whitespace()
        .map(|tok| tok.parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| ArrayUtilsError::RfiMaskUnparseable(path.to_path_buf()))?;

    // A mask shorter than the frequency axis is zero-padded (the extra,
    // unmasked channels are kept); a longer one is truncated.
    if mask.len() < freqs.len() {
        log::warn!(
            "RFI mask in {} has {} entries, but there are {} frequency channels; \
             treating the missing entries as unflagged",
            path.display(),
            mask.len(),
            freqs.len()
        );
        mask.resize(freqs.len(), 0.0);
    } else if mask.len() > freqs.len() {
        log::warn!(
            "RFI mask in {} has {} entries, but there are only {} frequency channels; \
             truncating the mask",
            path.display(),
            mask.len(),
            freqs.len()
        );
        mask.truncate(freqs.len());
    }

    let mut kept_freqs = Vec::with_capacity(freqs.len());
    let mut kept_channels = Vec::with_capacity(freqs.len());
    for (chan, (&freq, &flag)) in freqs.iter().zip(mask.iter()).enumerate() {
        if flag == 0.0 {
            kept_freqs.push(freq);
            kept_channels.push(chan);
        }
    }

    Ok((Array1::from_vec(kept_freqs), kept_channels))
}

/// Restricts `(freqs, channels)` to the inclusive-exclusive range
/// `start_freq < freq < end_freq`, preserving order.
pub fn select_channels(
    freqs: ArrayView1<f64>,
    channels: &[usize],
    start_freq: f64,
    end_freq: f64,
) -> Result<(Array1<f64>, Vec<usize>), ArrayUtilsError> {
    if start_freq >= end_freq {
        return Err(ArrayUtilsError::InvalidFrequencyRange {
            start: start_freq,
            end: end_freq,
        });
    }

    let mut kept_freqs = Vec::new();
    let mut kept_channels = Vec::new();
    for (&freq, &chan) in freqs.iter().zip(channels.iter()) {
        if freq > start_freq && freq < end_freq {
            kept_freqs.push(freq);
            kept_channels.push(chan);
        }
    }

    if kept_freqs.is_empty() {
        return Err(ArrayUtilsError::NoChannelsSelected {
            start: start_freq,
            end: end_freq,
            num_channels: freqs.len(),
        });
    }

    Ok((Array1::from_vec(kept_freqs), kept_channels))
}

/// Interpolates a per-antenna `(az, el)` pointing-offset series, recorded at
/// `origin_times`, onto `new_times` using nearest-neighbour interpolation
/// (matching `scipy.interpolate.NearestNDInterpolator` as used by the
/// original workflow, but specialised to a 1-D time axis since the
/// two interpolators it builds are only ever queried along time).
///
/// `origin_data` is indexed `[time, antenna, 2]`. If its shape is not `(_,
/// _, 2)` the data is returned unchanged (matching the original's
/// defensive shape check), since the caller has nothing better to fall
/// back on.
pub fn interpolate_pointings(
    origin_data: ArrayView3<f64>,
    origin_times: ArrayView1<f64>,
    new_times: ArrayView1<f64>,
) -> Array3<f64> {
    if origin_data.shape()[2] != 2 {
        log::warn!("Input offset data has the wrong shape, no interpolation done.");
        return origin_data.to_owned();
    }

    let num_ants = origin_data.shape()[1];
    let mut order: Vec<usize> = (0..origin_times.len()).collect();
    order.sort_by(|&a, &b| origin_times[a].partial_cmp(&origin_times[b]).unwrap());

    let sorted_times: Vec<f64> = order.iter().map(|&i| origin_times[i]).collect();

    let mut output = Array3::<f64>::zeros((new_times.len(), num_ants, 2));
    for (new_i, &t) in new_times.iter().enumerate() {
        let nearest = nearest_index(&sorted_times, t);
        let origin_i = order[nearest];
        for ant in 0..num_ants {
            output[[new_i, ant, 0]] = origin_data[[origin_i, ant, 0]];
            output[[new_i, ant, 1]] = origin_data[[origin_i, ant, 1]];
        }
    }

    output
}

/// Index into a sorted slice of the element nearest to `value`.
fn nearest_index(sorted: &[f64], value: f64) -> usize {
    match sorted.binary_search_by(|probe| probe.partial_cmp(&value).unwrap()) {
        Ok(i) => i,
        Err(0) => 0,
        Err(i) if i >= sorted.len() => sorted.len() - 1,
        Err(i) => {
            if (value - sorted[i - 1]).abs() <= (sorted[i] - value).abs() {
                i - 1
            } else {
                i
            }
        }
    }
}
