//! Earth rotation on the UT1 scale: rotation angle and sidereal time.
//!
//! The topocentric observer model only needs the Earth Rotation Angle;
//! GMST and local sidereal time ride along for hour-angle work. Every
//! input here is a UT1 Julian Date — the EOP table supplies the
//! UTC→UT1 step, and outside its coverage callers fall back to treating
//! UTC as UT1 (sub-second, well under the position tolerance).
//!
//! ERA is IERS Conventions 2010 eq. 5.15; the GMST accumulated-
//! precession polynomial is Capitaine et al. 2003, Table 2.

use std::f64::consts::TAU;

use crate::julian::J2000_JD;

/// ERA at J2000.0, in turns.
const ERA_J2000_TURNS: f64 = 0.779_057_273_264_0;
/// Sidereal turns per UT1 day.
const TURNS_PER_UT1_DAY: f64 = 1.002_737_811_911_354_48;

/// GMST minus ERA, arcseconds, ascending powers of T (Julian centuries
/// of UT1 since J2000.0).
const GMST_MINUS_ERA_ARCSEC: [f64; 6] = [
    0.014506,
    4612.156534,
    1.3915817,
    -0.00000044,
    -0.000029956,
    -0.0000000368,
];

const ARCSEC_PER_TURN: f64 = 1_296_000.0;

/// Earth Rotation Angle in radians, `[0, 2π)`.
pub fn earth_rotation_angle_rad(jd_ut1: f64) -> f64 {
    let days = jd_ut1 - J2000_JD;
    // Wrap in turns before scaling so large day counts keep precision.
    (ERA_J2000_TURNS + TURNS_PER_UT1_DAY * days).rem_euclid(1.0) * TAU
}

/// Greenwich Mean Sidereal Time in radians, `[0, 2π)`.
pub fn gmst_rad(jd_ut1: f64) -> f64 {
    let t = (jd_ut1 - J2000_JD) / 36525.0;
    let correction_arcsec = GMST_MINUS_ERA_ARCSEC.iter().rev().fold(0.0, |acc, c| acc * t + c);
    (earth_rotation_angle_rad(jd_ut1) + correction_arcsec / ARCSEC_PER_TURN * TAU).rem_euclid(TAU)
}

/// Local sidereal time from GMST and an east longitude, radians `[0, 2π)`.
pub fn local_sidereal_time_rad(gmst: f64, longitude_east_rad: f64) -> f64 {
    (gmst + longitude_east_rad).rem_euclid(TAU)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn era_at_j2000_noon() {
        // 0.77905727... turns is about 280.46°.
        let deg = earth_rotation_angle_rad(J2000_JD).to_degrees();
        assert!((deg - 280.4606).abs() < 0.001, "ERA(J2000) = {deg}°");
    }

    #[test]
    fn era_gains_about_a_degree_per_solar_day() {
        let today = earth_rotation_angle_rad(J2000_JD);
        let tomorrow = earth_rotation_angle_rad(J2000_JD + 1.0);
        let gained = (tomorrow - today).rem_euclid(TAU).to_degrees();
        assert!((gained - 0.9856).abs() < 0.001, "daily gain = {gained}°");
    }

    #[test]
    fn gmst_at_the_millennium_midnight() {
        // 2000-01-01 0h UT1: GMST ≈ 6h 39m 51s ≈ 99.96°.
        let deg = gmst_rad(2_451_544.5).to_degrees();
        assert!((deg - 99.97).abs() < 0.05, "GMST = {deg}°");
    }

    #[test]
    fn gmst_stays_close_to_era() {
        // The accumulated-precession correction is arcseconds per
        // century, so GMST and ERA agree to well under a degree across
        // the service's whole date range.
        for jd in [2_287_184.5, 2_400_000.5, 2_451_545.0, 2_600_000.5] {
            let sep = (gmst_rad(jd) - earth_rotation_angle_rad(jd)).abs();
            let sep = sep.min(TAU - sep);
            assert!(sep.to_degrees() < 0.2, "|GMST-ERA| at {jd}: {}°", sep.to_degrees());
        }
    }

    #[test]
    fn outputs_are_wrapped_even_far_from_j2000() {
        for jd in [2_000_000.25, 2_287_184.5, 2_688_976.5, 3_000_000.75] {
            for angle in [earth_rotation_angle_rad(jd), gmst_rad(jd)] {
                assert!((0.0..TAU).contains(&angle), "angle {angle} at {jd}");
            }
        }
    }

    #[test]
    fn local_time_wraps_past_the_meridian() {
        let lst = local_sidereal_time_rad(6.0, 1.0);
        assert!(((6.0 + 1.0 - TAU) - lst).abs() < 1e-12);
        let west = local_sidereal_time_rad(0.5, -1.0);
        assert!((west - (0.5 - 1.0 + TAU)).abs() < 1e-12);
    }
}
