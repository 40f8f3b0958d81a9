// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Handling of command-line arguments.

Strategy: users give arguments to `pointing-offset` (handled by this
module). The binary entry point turns these into the concrete calls needed
to drive `array_utils`/`reduce`/`solve`/`aggregate`/`gaincal` (handled by
`crate::run`). Keeping this split means argument parsing and validation, and
the actual pipeline, don't get tangled together.
*/

use std::path::PathBuf;

use clap::Parser;

use crate::constants::{DEFAULT_BW_FACTOR, DEFAULT_NUM_CHUNKS, DEFAULT_THRESH_WIDTH};
use crate::reduce::TimeAverage;

#[derive(Parser, Debug)]
#[clap(name = "pointing-offset", author, version, about)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Parser, Debug)]
pub enum Command {
    /// Compute per-antenna pointing offsets from a pointing-calibration
    /// observation.
    Compute(ComputeArgs),
}

#[derive(Parser, Debug)]
pub struct ComputeArgs {
    /// Directory containing the scans to process.
    #[clap(long, parse(from_os_str))]
    pub msdir: PathBuf,

    /// Apply an RFI mask before fitting.
    #[clap(long)]
    pub apply_mask: bool,

    /// Path to the RFI mask file (one 0/1 flag per channel).
    #[clap(long, parse(from_os_str), requires = "apply_mask")]
    pub rfi_file: Option<PathBuf>,

    /// Lower bound of the frequency range to keep, in Hz.
    #[clap(long)]
    pub start_freq: Option<f64>,

    /// Upper bound of the frequency range to keep, in Hz.
    #[clap(long)]
    pub end_freq: Option<f64>,

    /// Fit primary beams to visibilities instead of antenna gains.
    #[clap(long)]
    pub fit_to_vis: bool,

    /// Use weights when fitting the primary beams to the gain amplitudes.
    #[clap(long)]
    pub use_weights: bool,

    /// Number of frequency chunks for gain calibration, if fitting to
    /// gains.
    #[clap(long, default_value_t = DEFAULT_NUM_CHUNKS)]
    pub num_chunks: usize,

    /// Beamwidth factor for the (horizontal, vertical) axes.
    #[clap(long, number_of_values = 2, value_names = &["HORIZONTAL", "VERTICAL"])]
    pub bw_factor: Option<Vec<f64>>,

    /// The maximum ratio of the fitted to expected beamwidth.
    #[clap(long, default_value_t = DEFAULT_THRESH_WIDTH)]
    pub thresh_width: f64,

    /// Time-averaging mode for autocorrelation amplitudes, used only when
    /// fitting to visibilities (`--fit_to_vis`): `none`, `median`, or
    /// `mean`. Has no effect on the gains path, which already collapses
    /// each scan's visibilities to a single gain solve.
    #[clap(long, default_value = "none")]
    pub time_avg: String,

    /// Save the offset results to a CSV file.
    #[clap(long)]
    pub save_offset: bool,

    /// Directory where results are saved, if `--save_offset` is given.
    #[clap(long, parse(from_os_str))]
    pub results_dir: Option<PathBuf>,

    /// Verbosity: pass multiple times for more detail.
    #[clap(short, long, parse(from_occurrences))]
    pub verbose: u8,
}

impl ComputeArgs {
    /// The (horizontal, vertical) beamwidth factor, defaulting to the
    /// MeerKAT values if not given on the command line.
    pub fn beamwidth_factor(&self) -> (f64, f64) {
        match &self.bw_factor {
            Some(v) if v.len() == 1 => (v[0], v[0]),
            Some(v) => (v[0], v[1]),
            None => DEFAULT_BW_FACTOR,
        }
    }

    /// Parses `--time_avg` into a [`TimeAverage`], defaulting to no
    /// averaging (with a warning) for an unrecognised value.
    pub fn time_average(&self) -> TimeAverage {
        match self.time_avg.to_lowercase().as_str() {
            "none" => TimeAverage::NoAverage,
            "median" => TimeAverage::Median,
            "mean" => TimeAverage::Mean,
            other => {
                log::warn!("Averaging type '{other}' unknown. Using no averaging!");
                TimeAverage::NoAverage
            }
        }
    }
}
