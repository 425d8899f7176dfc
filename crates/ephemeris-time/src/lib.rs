//! Time handling for the ephemeris service.
//!
//! Three concerns share this crate: the astronomical time scales a
//! kernel-backed ephemeris runs on (Julian dates, UTC/TAI/TT/TDB via a
//! leapseconds kernel, Earth rotation via the EOP table), the
//! [`Epoch`] type every request resolves to, and the civil-time
//! resolution pipeline that turns a local wall-clock reading plus a
//! place into UTC under a parity profile.

pub mod civil;
pub mod eop;
pub mod epoch;
pub mod error;
pub mod julian;
pub mod lsk;
pub mod scales;
pub mod sidereal;

pub use civil::{
    load_patch_table, parse_civil_datetime, parse_civil_input, resolve_civil, zone_for_coordinate,
    Confidence, HistoricalPatch, ParityProfile, Place, Provenance, TimeResolution,
};
pub use eop::EopKernel;
pub use epoch::{Epoch, LeapSecondKernel};
pub use error::TimeError;
pub use julian::{
    calendar_to_jd, jd_to_calendar, jd_to_tdb_seconds, tdb_seconds_to_jd, J2000_JD,
    SECONDS_PER_DAY,
};
pub use lsk::LskData;
pub use sidereal::{earth_rotation_angle_rad, gmst_rad, local_sidereal_time_rad};
