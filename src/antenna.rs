// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Antenna geometry.

use crate::coord::{ecef_to_geodetic, GeodeticLocation};

/// A geographically located dish, immutable for the lifetime of a run.
///
/// Antennas are constructed once (see [`Antenna::new`]) from a
/// configuration file supplied by an external collaborator (spec.md §3) and
/// shared by reference across every scan; nothing in this crate mutates one
/// after construction.
#[derive(Clone, Debug, PartialEq)]
pub struct Antenna {
    pub name: String,
    /// ECEF Cartesian position, metres.
    pub position_m: [f64; 3],
    pub diameter_m: f64,
    /// Beamwidth factor `k` for the (horizontal, vertical) axes.
    pub beamwidth_factor: (f64, f64),
    pub location: GeodeticLocation,
}

impl Antenna {
    pub fn new(
        name: impl Into<String>,
        position_m: [f64; 3],
        diameter_m: f64,
        beamwidth_factor: (f64, f64),
    ) -> Self {
        let location = ecef_to_geodetic(position_m);
        Self {
            name: name.into(),
            position_m,
            diameter_m,
            beamwidth_factor,
            location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_location() {
        let ant = Antenna::new("m000", [6_378_137.0, 0.0, 0.0], 13.5, (1.22, 1.22));
        assert_eq!(ant.name, "m000");
        assert!((ant.location.latitude_rad).abs() < 1e-9);
    }
}
