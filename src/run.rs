// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Wires the `compute` subcommand's arguments to the
//! array_utils/reduce/solve/aggregate/gaincal pipeline. Reading scans and
//! antennas from a measurement set is an external collaborator (spec.md
//! §1); this function takes them already loaded.

use ndarray::Array1;

use crate::aggregate::{self, OffsetRow};
use crate::antenna::Antenna;
use crate::array_utils::{apply_rfi_mask, select_channels};
use crate::cli::ComputeArgs;
use crate::error::PointingOffsetError;
use crate::io;
use crate::reduce;
use crate::scan::{Scan, Target};
use crate::solve::OffsetSolver;

/// Runs the full `compute` pipeline and returns one [`OffsetRow`] per
/// antenna, in the same order as `antennas`.
pub fn run_compute(
    args: &ComputeArgs,
    antennas: &[Antenna],
    scans: &[Scan],
    target: &Target,
) -> Result<Vec<OffsetRow>, PointingOffsetError> {
    log::info!("Fitting primary beams against calibrator {}", target.name);

    let scans = if args.apply_mask {
        scans
            .iter()
            .map(|scan| prepare_scan(scan, args))
            .collect::<Result<Vec<_>, _>>()?
    } else if args.start_freq.is_some() || args.end_freq.is_some() {
        scans
            .iter()
            .map(|scan| select_frequency_range(scan, args))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        scans.to_vec()
    };

    let num_antennas = antennas.len();

    let reduced = if args.fit_to_vis {
        reduce::from_vis(&scans, num_antennas, args.time_average())?
    } else {
        reduce::from_gains(&scans, num_antennas, args.num_chunks)?
    };

    let mut solver = OffsetSolver::new(antennas, args.thresh_width);
    if args.bw_factor.is_some() {
        solver = solver.with_beamwidth_factor(args.beamwidth_factor());
    }
    let fitted = solver.solve(&reduced, args.use_weights)?;

    let pointing_times: Vec<f64> = scans
        .iter()
        .flat_map(|scan| scan.pointing_time.iter().copied())
        .collect();
    let rows = aggregate::aggregate(antennas, &fitted, target.radec, &pointing_times)?;

    if args.save_offset {
        let dir = args
            .results_dir
            .clone()
            .unwrap_or_else(|| std::path::PathBuf::from("."));
        let path = dir.join("pointing_offsets.txt");
        io::write_offsets(&path, antennas, &rows)?;
    }

    Ok(rows)
}

fn prepare_scan(scan: &Scan, args: &ComputeArgs) -> Result<Scan, PointingOffsetError> {
    let freqs = Array1::from_vec(scan.frequency.clone());
    let (masked_freqs, channels) = apply_rfi_mask(freqs.view(), args.rfi_file.as_deref())?;

    let (_, channels) = match (args.start_freq, args.end_freq) {
        (Some(start), Some(end)) => select_channels(masked_freqs.view(), &channels, start, end)?,
        _ => (masked_freqs, channels),
    };

    Ok(scan.select_channels(&channels))
}

fn select_frequency_range(scan: &Scan, args: &ComputeArgs) -> Result<Scan, PointingOffsetError> {
    let freqs = Array1::from_vec(scan.frequency.clone());
    let all_channels: Vec<usize> = (0..freqs.len()).collect();
    let (start, end) = (
        args.start_freq.unwrap_or(f64::NEG_INFINITY),
        args.end_freq.unwrap_or(f64::INFINITY),
    );
    let (_, channels) = select_channels(freqs.view(), &all_channels, start, end)?;
    Ok(scan.select_channels(&channels))
}
