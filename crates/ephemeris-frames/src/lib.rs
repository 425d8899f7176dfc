//! Reference-frame math for the compute layer: mean obliquity,
//! precession, nutation, the ICRF↔ecliptic rotations, and the
//! spherical form positions are reported in. Pure functions over f64,
//! no dependencies.

pub mod nutation;
pub mod obliquity;
pub mod precession;
pub mod rotation;
pub mod spherical;

pub use nutation::{delaunay_arguments, nutation_iau2000b, Nutation};
pub use obliquity::{
    mean_obliquity_deg, mean_obliquity_rad, COS_OBL, OBLIQUITY_J2000_DEG, OBLIQUITY_J2000_RAD,
    SIN_OBL,
};
pub use precession::{general_precession_longitude_arcsec, general_precession_longitude_deg};
pub use rotation::{
    ecliptic_of_date_to_icrf, ecliptic_to_icrf, icrf_to_ecliptic, icrf_to_ecliptic_of_date,
};
pub use spherical::SphericalCoords;
