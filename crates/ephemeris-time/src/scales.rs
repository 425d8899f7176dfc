//! UTC → TAI → TT → TDB conversion chain (and inverse).
//!
//! Source: NAIF Time Required Reading, driven by the DELTET/* kernel
//! pool variables parsed by [`crate::lsk`].

use crate::lsk::LskData;

/// TT − TAI, a fixed offset by definition.
const TT_MINUS_TAI: f64 = 32.184;

/// Number of leap seconds in effect at `tai_or_tdb_s` (seconds past J2000,
/// on the UTC-derived leap second epoch table). Returns the most recent
/// entry whose epoch is `<= query`, or `0.0` before the table's first entry.
fn leap_seconds_at(table: &[(f64, f64)], query_tdb_s: f64) -> f64 {
    table
        .iter()
        .rev()
        .find(|(_, epoch)| *epoch <= query_tdb_s)
        .map(|(delta_at, _)| *delta_at)
        .unwrap_or(0.0)
}

/// Periodic TDB − TT correction (the dominant term of the relativistic
/// clock-rate difference), evaluated at TT seconds past J2000.
fn tdb_minus_tt(tt_s: f64, lsk: &LskData) -> f64 {
    let m = lsk.m0 + lsk.m1 * tt_s;
    let e = m + lsk.eb * m.sin();
    lsk.k * e.sin()
}

/// Convert UTC seconds past J2000 to TDB seconds past J2000.
pub fn utc_to_tdb(utc_s: f64, lsk: &LskData) -> f64 {
    let leap = leap_seconds_at(&lsk.leap_seconds, utc_s);
    let tai_s = utc_s + leap;
    let tt_s = tai_s + TT_MINUS_TAI;
    // The periodic correction is a function of TT; since it is a
    // sub-millisecond-scale correction we evaluate it directly at tt_s
    // rather than iterating to convergence.
    tt_s + tdb_minus_tt(tt_s, lsk)
}

/// Convert TDB seconds past J2000 to UTC seconds past J2000.
pub fn tdb_to_utc(tdb_s: f64, lsk: &LskData) -> f64 {
    // Invert the small periodic term by one fixed-point iteration; the
    // correction is bounded by `lsk.k` (~1.7 ms), so a single iteration
    // converges far below any epoch-resolution requirement.
    let tt_s_approx = tdb_s - tdb_minus_tt(tdb_s, lsk);
    let tt_s = tdb_s - tdb_minus_tt(tt_s_approx, lsk);
    let tai_s = tt_s - TT_MINUS_TAI;
    let leap = leap_seconds_at(&lsk.leap_seconds, tai_s);
    tai_s - leap
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_lsk() -> LskData {
        LskData {
            delta_t_a: 32.184,
            k: 1.657e-3,
            eb: 1.671e-2,
            m0: 6.239996,
            m1: 1.99096871e-7,
            leap_seconds: vec![(10.0, -883_655_957.816), (37.0, 536_500_837.184)],
        }
    }

    #[test]
    fn utc_to_tdb_applies_tt_minus_tai_offset() {
        let lsk = sample_lsk();
        let utc_s = 600_000_000.0;
        let tdb = utc_to_tdb(utc_s, &lsk);
        let leap = leap_seconds_at(&lsk.leap_seconds, utc_s);
        // tdb should be close to utc + leap + 32.184 (periodic term is sub-ms)
        let expected = utc_s + leap + TT_MINUS_TAI;
        assert!((tdb - expected).abs() < 0.01, "tdb={tdb}, expected~={expected}");
    }

    #[test]
    fn roundtrip_utc_tdb() {
        let lsk = sample_lsk();
        for &utc in &[0.0, 600_000_000.0, -800_000_000.0] {
            let tdb = utc_to_tdb(utc, &lsk);
            let back = tdb_to_utc(tdb, &lsk);
            assert!((back - utc).abs() < 1e-6, "roundtrip failed: {utc} -> {tdb} -> {back}");
        }
    }

    #[test]
    fn leap_seconds_before_table_is_zero() {
        let lsk = sample_lsk();
        assert_eq!(leap_seconds_at(&lsk.leap_seconds, -1e12), 0.0);
    }

    #[test]
    fn leap_seconds_picks_latest_applicable_entry() {
        let lsk = sample_lsk();
        assert_eq!(leap_seconds_at(&lsk.leap_seconds, 600_000_000.0), 37.0);
        assert_eq!(leap_seconds_at(&lsk.leap_seconds, -800_000_000.0), 10.0);
    }
}
