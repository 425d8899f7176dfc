//! Accumulated precession of the equinox along the ecliptic.
//!
//! The sidereal registry's formula entries all reduce to "offset at
//! J2000 plus however far the equinox has precessed since", so this is
//! the one precession quantity the service needs: p_A, the IAU 2006
//! general precession in ecliptic longitude (Capitaine, Wallace &
//! Chapront 2003, Table 1; also IERS Conventions 2010, chapter 5).

/// p_A polynomial, arcseconds, ascending powers of T (Julian centuries
/// of TDB since J2000.0). The constant term is zero by definition.
const P_A_ARCSEC: [f64; 6] = [
    0.0,
    5028.796195,
    1.1054348,
    0.00007964,
    -0.000023857,
    -0.0000000383,
];

/// General precession in ecliptic longitude since J2000.0, arcseconds.
///
/// Positive for epochs after J2000: the equinox has moved westward and
/// every sidereal offset has grown by the same amount. The linear term
/// dominates at roughly 50.29″ per year.
pub fn general_precession_longitude_arcsec(t: f64) -> f64 {
    P_A_ARCSEC.iter().rev().fold(0.0, |acc, c| acc * t + c)
}

/// [`general_precession_longitude_arcsec`] in degrees.
pub fn general_precession_longitude_deg(t: f64) -> f64 {
    general_precession_longitude_arcsec(t) / 3600.0
}
