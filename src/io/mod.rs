// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Writes the final per-antenna pointing-offset table (spec.md §6).

pub mod error;

use std::path::Path;

pub use error::IoError;

use crate::aggregate::OffsetRow;
use crate::antenna::Antenna;

/// Writes one headerless CSV row per antenna: `name,az_arcmin,el_arcmin,
/// cross_el_arcmin`, matching `export_pointing_offset_data` in the workflow
/// this was built from (there, a bare `pandas.DataFrame.to_csv`; here, the
/// `csv` crate gives us the same thing without pulling in a dataframe
/// library for one export path).
pub fn write_offsets(path: &Path, antennas: &[Antenna], rows: &[OffsetRow]) -> Result<(), IoError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|source| IoError::Create {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::Other, source),
        })?;

    for (antenna, row) in antennas.iter().zip(rows.iter()) {
        writer
            .write_record(&[
                antenna.name.clone(),
                row.az_arcmin.to_string(),
                row.el_arcmin.to_string(),
                row.cross_el_arcmin.to_string(),
            ])
            .map_err(|source| IoError::WriteRow {
                path: path.to_path_buf(),
                antenna: antenna.name.clone(),
                source,
            })?;
    }

    writer.flush().map_err(|source| IoError::Flush {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_write_offsets_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("offsets.csv");

        let antennas = vec![Antenna::new("m000", [5109360.1, 2006852.6, -3238948.1], 13.5, (1.22, 1.22))];
        let rows = vec![OffsetRow {
            az_arcmin: 1.5,
            el_arcmin: -0.25,
            cross_el_arcmin: 1.2,
        }];

        write_offsets(&path, &antennas, &rows).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("m000,1.5,-0.25,1.2"));
    }
}
