//! Julian Date ↔ Gregorian calendar conversions.
//!
//! Source: Fliegel & Van Flandern (1968), "A Machine Algorithm for
//! Processing Calendar Dates", Communications of the ACM. Public domain
//! algorithm; implementation is original.

/// Julian Date of the J2000.0 epoch (2000-Jan-01 12:00 TT).
pub const J2000_JD: f64 = 2_451_545.0;

/// Seconds in a Julian day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Convert a Gregorian calendar date (proleptic, astronomical year numbering)
/// to a Julian Date. `day` may carry a fractional part for the time of day.
pub fn calendar_to_jd(year: i32, month: u32, day: f64) -> f64 {
    let day_int = day.floor();
    let day_frac = day - day_int;

    let a = (14 - month as i64) / 12;
    let y = year as i64 + 4800 - a;
    let m = month as i64 + 12 * a - 3;

    let jdn = day_int as i64 + (153 * m + 2) / 5 + 365 * y + y / 4 - y / 100 + y / 400 - 32045;

    jdn as f64 - 0.5 + day_frac
}

/// Convert a Julian Date back into a Gregorian calendar date.
/// Returns `(year, month, day_with_fraction)`.
pub fn jd_to_calendar(jd: f64) -> (i32, u32, f64) {
    let jd_shifted = jd + 0.5;
    let z = jd_shifted.floor();
    let f = jd_shifted - z;

    let z_i = z as i64;
    let alpha = ((z_i as f64 - 1_867_216.25) / 36524.25).floor() as i64;
    let a = if z_i < 2_299_161 {
        z_i
    } else {
        z_i + 1 + alpha - alpha / 4
    };
    let b = a + 1524;
    let c = ((b as f64 - 122.1) / 365.25).floor() as i64;
    let d = (365.25 * c as f64).floor() as i64;
    let e = ((b - d) as f64 / 30.6001).floor() as i64;

    let day = (b - d - (30.6001 * e as f64) as i64) as f64 + f;
    let month = if e < 14 { e - 1 } else { e - 13 };
    let year = if month > 2 { c - 4716 } else { c - 4715 };

    (year as i32, month as u32, day)
}

/// Convert a Julian Date to seconds past J2000.0 (treating the JD's time
/// scale as carried through unchanged; callers apply time-scale offsets).
pub fn jd_to_tdb_seconds(jd: f64) -> f64 {
    (jd - J2000_JD) * SECONDS_PER_DAY
}

/// Inverse of [`jd_to_tdb_seconds`].
pub fn tdb_seconds_to_jd(seconds: f64) -> f64 {
    seconds / SECONDS_PER_DAY + J2000_JD
}

/// Parse a NAIF-style three-letter month abbreviation (`JAN`..`DEC`,
/// case-insensitive) into a 1-based month number.
pub fn month_from_abbrev(s: &str) -> Option<u32> {
    let upper = s.to_ascii_uppercase();
    let idx = ["JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC"]
        .iter()
        .position(|m| *m == upper)?;
    Some(idx as u32 + 1)
}
