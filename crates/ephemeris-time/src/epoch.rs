//! The service's native time type and the leap-second table feeding it.
//!
//! Every request resolves to an [`Epoch`] — an instant on the TDB
//! scale — before compute runs. Getting there from a UTC reading goes
//! through the [`LeapSecondKernel`], which carries the `DELTET/*`
//! constants and the ΔAT table of a NAIF leapseconds kernel.

use std::path::Path;

use crate::error::TimeError;
use crate::julian::{calendar_to_jd, jd_to_tdb_seconds, tdb_seconds_to_jd};
use crate::lsk::{parse_lsk, LskData};
use crate::scales;

/// A parsed leapseconds kernel and the scale conversions it enables.
#[derive(Debug, Clone)]
pub struct LeapSecondKernel {
    data: LskData,
}

impl LeapSecondKernel {
    /// Load and parse an LSK file (`naif0012.tls` or newer).
    pub fn load(path: &Path) -> Result<Self, TimeError> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// Parse LSK text content.
    pub fn parse(text: &str) -> Result<Self, TimeError> {
        Ok(Self { data: parse_lsk(text)? })
    }

    /// The raw `DELTET/*` variables.
    pub fn data(&self) -> &LskData {
        &self.data
    }

    /// UTC seconds past J2000 → TDB seconds past J2000.
    ///
    /// "UTC seconds past J2000" means the UTC calendar reading pushed
    /// through the Julian-date arithmetic as-is; the leap-second table
    /// and the TT/TDB periodic term are applied here.
    pub fn utc_to_tdb(&self, utc_s: f64) -> f64 {
        scales::utc_to_tdb(utc_s, &self.data)
    }

    /// Inverse of [`Self::utc_to_tdb`].
    pub fn tdb_to_utc(&self, tdb_s: f64) -> f64 {
        scales::tdb_to_utc(tdb_s, &self.data)
    }
}

/// An instant on the TDB scale, stored as seconds past J2000.0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Epoch(f64);

impl Epoch {
    pub fn from_tdb_seconds(tdb_s: f64) -> Self {
        Self(tdb_s)
    }

    pub fn from_jd_tdb(jd_tdb: f64) -> Self {
        Self(jd_to_tdb_seconds(jd_tdb))
    }

    /// Resolve a UTC calendar reading through the leap-second table.
    pub fn from_utc(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: f64,
        lsk: &LeapSecondKernel,
    ) -> Self {
        let day_fraction = f64::from(day)
            + (f64::from(hour) + (f64::from(minute) + second / 60.0) / 60.0) / 24.0;
        let utc_s = jd_to_tdb_seconds(calendar_to_jd(year, month, day_fraction));
        Self(lsk.utc_to_tdb(utc_s))
    }

    pub fn as_tdb_seconds(self) -> f64 {
        self.0
    }

    pub fn as_jd_tdb(self) -> f64 {
        tdb_seconds_to_jd(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::julian::J2000_JD;

    const MINI_LSK: &str = r#"
\begindata
DELTET/DELTA_T_A = 32.184
DELTET/K         = 1.657D-3
DELTET/EB        = 1.671D-2
DELTET/M         = ( 6.239996 1.99096871D-7 )
DELTET/DELTA_AT  = ( 10, @1972-JAN-1
                     32, @1999-JAN-1 )
\begintext
"#;

    #[test]
    fn jd_construction_round_trips() {
        let jd = 2_459_000.25;
        assert!((Epoch::from_jd_tdb(jd).as_jd_tdb() - jd).abs() < 1e-12);
    }

    #[test]
    fn j2000_is_the_zero_of_the_scale() {
        assert_eq!(Epoch::from_jd_tdb(J2000_JD).as_tdb_seconds(), 0.0);
        assert_eq!(Epoch::from_tdb_seconds(0.0).as_jd_tdb(), J2000_JD);
    }

    #[test]
    fn utc_noon_at_j2000_lands_64_seconds_into_tdb() {
        // TDB − UTC at the epoch = ΔAT (32 s) + TT−TAI (32.184 s),
        // give or take the ~1.7 ms periodic term.
        let lsk = LeapSecondKernel::parse(MINI_LSK).unwrap();
        let epoch = Epoch::from_utc(2000, 1, 1, 12, 0, 0.0, &lsk);
        assert!((epoch.as_tdb_seconds() - 64.184).abs() < 0.01, "{}", epoch.as_tdb_seconds());
    }

    #[test]
    fn utc_round_trips_through_the_kernel() {
        let lsk = LeapSecondKernel::parse(MINI_LSK).unwrap();
        let utc_s = 1.234e8;
        let back = lsk.tdb_to_utc(lsk.utc_to_tdb(utc_s));
        assert!((back - utc_s).abs() < 1e-6);
    }

    #[test]
    fn sub_minute_precision_survives_calendar_conversion() {
        let lsk = LeapSecondKernel::parse(MINI_LSK).unwrap();
        let base = Epoch::from_utc(2024, 6, 1, 10, 30, 0.0, &lsk);
        let later = Epoch::from_utc(2024, 6, 1, 10, 30, 1.5, &lsk);
        assert!((later.as_tdb_seconds() - base.as_tdb_seconds() - 1.5).abs() < 1e-6);
    }
}
