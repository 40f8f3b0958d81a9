// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helper functions around time.
//!
//! Timestamps throughout this crate are plain GPS seconds (the convention
//! used by both the MeerKAT/MeerKAT-extension correlator and `hifitime`'s
//! native epoch).

use hifitime::Epoch;

/// GPS epoch (1980-01-06T00:00:00 UTC) expressed as a Julian date. GPS does
/// not apply leap seconds, so treating a GPS-seconds instant as if it were
/// the same instant in UTC introduces an error of a few tens of seconds at
/// most; for the purposes of computing a calibrator elevation for the
/// cross-elevation scaling, that's several orders of magnitude smaller than
/// the pointing offsets being measured.
const GPS_EPOCH_JD: f64 = 2_444_244.5;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Julian date (UT) for a timestamp given in GPS seconds.
pub(crate) fn gps_seconds_to_jd(gps_seconds: f64) -> f64 {
    GPS_EPOCH_JD + gps_seconds / SECONDS_PER_DAY
}

/// Greenwich Mean Sidereal Time, in radians, for a timestamp given in GPS
/// seconds. Uses the IAU 1982 polynomial approximation, which is accurate
/// to a fraction of an arcsecond over the timescale of a modern
/// observation.
pub(crate) fn gmst_radians(gps_seconds: f64) -> f64 {
    let jd = gps_seconds_to_jd(gps_seconds);
    let t = (jd - 2_451_545.0) / 36_525.0;
    let gmst_deg = 280.460_618_37
        + 360.985_647_366_29 * (jd - 2_451_545.0)
        + 0.000_387_933 * t * t
        - t * t * t / 38_710_000.0;
    let wrapped = gmst_deg.rem_euclid(360.0);
    wrapped.to_radians()
}

/// Median of a slice of GPS timestamps. Panics on an empty slice; callers
/// are expected to have already checked for at least one timestamp.
pub(crate) fn median_timestamp(times: &[f64]) -> f64 {
    let mut sorted = times.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("timestamp is not NaN"));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    }
}

/// Some timestamps may be read in ever so slightly off from their true
/// values because of float errors. This function checks if a supplied
/// [`Epoch`], when represented as GPS seconds, is really close to a neat
/// value in the hundredths. If so, the value is rounded and returned.
///
/// e.g. The GPS time 1090008639.999405 should be 1090008640.0.
#[allow(dead_code)]
pub(crate) fn round_hundredths_of_a_second(e: Epoch) -> Epoch {
    let e_gps = e.as_gpst_seconds() * 100.0;
    if (e_gps.round() - e_gps).abs() < 0.1 {
        Epoch::from_gpst_seconds(e_gps.round() / 100.0)
    } else {
        e
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_round_seconds() {
        let e = Epoch::from_gpst_seconds(1090008639.999405);
        assert_abs_diff_eq!(
            round_hundredths_of_a_second(e).as_gpst_seconds(),
            1090008640.0
        );

        // No rounding.
        let e = Epoch::from_gpst_seconds(1090008640.26);
        assert_abs_diff_eq!(
            round_hundredths_of_a_second(e).as_gpst_seconds(),
            1090008640.26
        );
    }

    #[test]
    fn test_median_timestamp_odd() {
        assert_abs_diff_eq!(median_timestamp(&[3.0, 1.0, 2.0]), 2.0);
    }

    #[test]
    fn test_median_timestamp_even() {
        assert_abs_diff_eq!(median_timestamp(&[1.0, 2.0, 3.0, 4.0]), 2.5);
    }

    #[test]
    fn test_gmst_is_bounded() {
        let gmst = gmst_radians(1_300_000_000.0);
        assert!((0.0..std::f64::consts::TAU).contains(&gmst));
    }
}
