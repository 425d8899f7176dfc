//! ICRF ↔ mean-ecliptic frame rotation.
//!
//! A single rotation about the X axis by the mean obliquity of the
//! ecliptic. Source: Explanatory Supplement to the Astronomical Almanac,
//! standard equatorial-to-ecliptic rotation. Public domain.

use crate::obliquity::{COS_OBL, SIN_OBL};

/// Rotate a vector from the ICRF (equatorial, J2000-aligned) frame into the
/// mean ecliptic frame, using the J2000.0 mean obliquity.
pub fn icrf_to_ecliptic(v: &[f64; 3]) -> [f64; 3] {
    [v[0], v[1] * COS_OBL + v[2] * SIN_OBL, -v[1] * SIN_OBL + v[2] * COS_OBL]
}

/// Inverse of [`icrf_to_ecliptic`].
pub fn ecliptic_to_icrf(v: &[f64; 3]) -> [f64; 3] {
    [v[0], v[1] * COS_OBL - v[2] * SIN_OBL, v[1] * SIN_OBL + v[2] * COS_OBL]
}

/// Rotate from ICRF into the mean ecliptic **of date** using a
/// epoch-dependent obliquity (radians), instead of the fixed J2000 value.
pub fn icrf_to_ecliptic_of_date(v: &[f64; 3], obliquity_rad: f64) -> [f64; 3] {
    let (s, c) = obliquity_rad.sin_cos();
    [v[0], v[1] * c + v[2] * s, -v[1] * s + v[2] * c]
}

/// Inverse of [`icrf_to_ecliptic_of_date`].
pub fn ecliptic_of_date_to_icrf(v: &[f64; 3], obliquity_rad: f64) -> [f64; 3] {
    let (s, c) = obliquity_rad.sin_cos();
    [v[0], v[1] * c - v[2] * s, v[1] * s + v[2] * c]
}
