// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use thiserror::Error;

/// Errors associated with writing the final pointing-offset table.
#[derive(Error, Debug)]
pub enum IoError {
    #[error("couldn't create output file {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("couldn't write row for antenna {antenna} to {path}: {source}")]
    WriteRow {
        path: PathBuf,
        antenna: String,
        #[source]
        source: csv::Error,
    },

    #[error("couldn't flush output file {path}: {source}")]
    Flush {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
