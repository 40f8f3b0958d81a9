// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Celestial and geodetic coordinate helpers.
//!
//! Everything here operates in radians; conversion to degrees or arcminutes
//! happens only at the crate's output boundary (see [`crate::aggregate`]).

use std::f64::consts::PI;

use crate::time::gmst_radians;

/// A right ascension / declination pair, in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RADec {
    pub ra: f64,
    pub dec: f64,
}

impl RADec {
    pub fn new(ra: f64, dec: f64) -> Self {
        Self { ra, dec }
    }
}

/// A geodetic (WGS84-like) antenna location, in radians and metres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeodeticLocation {
    pub latitude_rad: f64,
    pub longitude_rad: f64,
    pub height_m: f64,
}

/// Wrap an angle (radians) into `(-pi, pi]`.
///
/// This is the one angle-wrapping utility used throughout the crate; see
/// `SPEC_FULL.md` §9 "Angle handling".
pub fn wrap_pi(angle: f64) -> f64 {
    let two_pi = 2.0 * PI;
    let wrapped = angle - two_pi * (angle / two_pi).round();
    if wrapped <= -PI {
        wrapped + two_pi
    } else if wrapped > PI {
        wrapped - two_pi
    } else {
        wrapped
    }
}

/// Elevation of `target` above the horizon at `location`, at the instant
/// described by `gps_seconds`, via the standard spherical-trig hour-angle
/// relation. Used by the aggregator to compute the cross-elevation scaling
/// factor `cos(el_cal)` (spec.md §4.5).
pub fn elevation(target: RADec, location: GeodeticLocation, gps_seconds: f64) -> f64 {
    let lst = gmst_radians(gps_seconds) + location.longitude_rad;
    let hour_angle = lst - target.ra;

    let sin_el = target.dec.sin() * location.latitude_rad.sin()
        + target.dec.cos() * location.latitude_rad.cos() * hour_angle.cos();
    sin_el.clamp(-1.0, 1.0).asin()
}

/// Converts an antenna's ECEF (Earth-Centred, Earth-Fixed) Cartesian
/// position, in metres, to a geodetic location using Bowring's closed-form
/// approximation for the WGS84 ellipsoid.
///
/// Antenna geometry construction from a configuration file is, per
/// `spec.md` §1, an external collaborator; this function provides a
/// concrete, narrow implementation of the one piece of it the aggregator
/// needs (the antenna's latitude/longitude), grounded on
/// `construct_antennas` in the original pointing-offset workflow.
pub fn ecef_to_geodetic(xyz_m: [f64; 3]) -> GeodeticLocation {
    // WGS84 ellipsoid parameters.
    const A: f64 = 6_378_137.0;
    const F: f64 = 1.0 / 298.257_223_563;
    const B: f64 = A * (1.0 - F);
    const E2: f64 = F * (2.0 - F);
    const EP2: f64 = (A * A - B * B) / (B * B);

    let [x, y, z] = xyz_m;
    let p = (x * x + y * y).sqrt();
    let longitude_rad = y.atan2(x);

    let theta = (z * A).atan2(p * B);
    let latitude_rad = (z + EP2 * B * theta.sin().powi(3))
        .atan2(p - E2 * A * theta.cos().powi(3));

    let sin_lat = latitude_rad.sin();
    let n = A / (1.0 - E2 * sin_lat * sin_lat).sqrt();
    let height_m = p / latitude_rad.cos() - n;

    GeodeticLocation {
        latitude_rad,
        longitude_rad,
        height_m,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_wrap_pi_identity_inside_range() {
        assert_abs_diff_eq!(wrap_pi(0.5), 0.5);
        assert_abs_diff_eq!(wrap_pi(-0.5), -0.5);
    }

    #[test]
    fn test_wrap_pi_wraps_above_pi() {
        let wrapped = wrap_pi(PI + 0.1);
        assert_abs_diff_eq!(wrapped, -PI + 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_wrap_pi_wraps_large_multiples() {
        let wrapped = wrap_pi(10.0 * PI + 0.3);
        assert_abs_diff_eq!(wrapped, 0.3, epsilon = 1e-9);
    }

    #[test]
    fn test_elevation_at_zenith() {
        // An antenna at the equator, on the prime meridian, looking at a
        // target at (ra=lst, dec=0) should see it directly overhead.
        let location = GeodeticLocation {
            latitude_rad: 0.0,
            longitude_rad: 0.0,
            height_m: 0.0,
        };
        let gps_seconds = 1_300_000_000.0;
        let lst = gmst_radians(gps_seconds);
        let target = RADec::new(lst, 0.0);
        let el = elevation(target, location, gps_seconds);
        assert_abs_diff_eq!(el, PI / 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ecef_to_geodetic_roundtrip_equator() {
        // A point on the equator at the prime meridian, at sea level.
        let loc = ecef_to_geodetic([6_378_137.0, 0.0, 0.0]);
        assert_abs_diff_eq!(loc.latitude_rad, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(loc.longitude_rad, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(loc.height_m, 0.0, epsilon = 1e-3);
    }
}
