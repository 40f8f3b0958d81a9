// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use pointing_offset::antenna::Antenna;
use pointing_offset::cli::{Args, Command, ComputeArgs};
use pointing_offset::scan::{Scan, Target};
use pointing_offset::{logging, run_compute, PointingOffsetError};

/// Reads the antennas, scans and calibrator target needed to drive
/// [`run_compute`] from a measurement set on disk.
///
/// Measurement-set and antenna-metadata I/O is an external collaborator
/// (see `SPEC_FULL.md` §1): this engine crate only consumes the
/// already-parsed [`Antenna`]/[`Scan`] records. The binary entry point is
/// where a concrete reader is wired in; none ships here, so this stub
/// reports clearly rather than guessing at a measurement-set format.
trait ScanSource {
    fn load(&self, msdir: &Path) -> Result<(Vec<Antenna>, Vec<Scan>, Target), PointingOffsetError>;
}

struct UnimplementedScanSource;

impl ScanSource for UnimplementedScanSource {
    fn load(&self, msdir: &Path) -> Result<(Vec<Antenna>, Vec<Scan>, Target), PointingOffsetError> {
        Err(PointingOffsetError::Generic(format!(
            "no measurement-set reader is wired into this binary; cannot load scans from {}. \
             Implement `ScanSource` for your measurement-set format and substitute it here.",
            msdir.display()
        )))
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let Command::Compute(compute_args) = args.command;

    logging::init(compute_args.verbose);

    match try_main(&compute_args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn try_main(args: &ComputeArgs) -> Result<(), PointingOffsetError> {
    let source = UnimplementedScanSource;
    let (antennas, scans, target) = source.load(&args.msdir)?;

    let rows = run_compute(args, &antennas, &scans, &target)?;
    for (antenna, row) in antennas.iter().zip(rows.iter()) {
        log::info!(
            "{}: az={:.3}' el={:.3}' cross_el={:.3}'",
            antenna.name,
            row.az_arcmin,
            row.el_arcmin,
            row.cross_el_arcmin
        );
    }

    Ok(())
}
