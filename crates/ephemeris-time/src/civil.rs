//! Civil local datetime → UTC resolution under four historical-accuracy
//! profiles.
//!
//! Flexible parsing narrows loosely-typed client input to a typed naive
//! datetime; coordinate→zone lookup and historical DST rules are consulted
//! only through their interfaces (`tzf-rs` for the offline timezone
//! polygon lookup, `chrono-tz` for the IANA rule database) — this crate
//! never reimplements either.

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, LocalResult, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::{OffsetComponents, Tz};
use serde::Deserialize;

use crate::error::TimeError;

/// The timezone-polygon dataset is several MB and expensive to index;
/// build it once per process.
fn tz_finder() -> &'static tzf_rs::DefaultFinder {
    static FINDER: OnceLock<tzf_rs::DefaultFinder> = OnceLock::new();
    FINDER.get_or_init(tzf_rs::DefaultFinder::new)
}

/// Observer location used for coordinate→zone lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Place {
    pub lat: f64,
    pub lon: f64,
    pub elev_m: f64,
}

/// Named policy for resolving civil local time to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParityProfile {
    /// Coordinate→zone, historical DST, declarative pre-standardization patches.
    StrictHistory,
    /// Coordinate→zone, historical DST, no patches.
    AstroCom,
    /// Reserved; currently an alias of `AstroCom`. No definitive source
    /// material distinguishes the two.
    Clairvision,
    /// Use the caller-provided zone/offset verbatim.
    AsEntered,
}

impl ParityProfile {
    /// `Clairvision` behaves identically to `AstroCom`; everything else is distinct.
    pub const fn canonical(self) -> Self {
        match self {
            Self::Clairvision => Self::AstroCom,
            other => other,
        }
    }

    pub const fn applies_patches(self) -> bool {
        matches!(self.canonical(), Self::StrictHistory)
    }
}

/// Confidence in a resolved [`TimeResolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Provenance attached to a time resolution: which profile and data
/// sources were consulted, and which patches fired.
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    pub profile: ParityProfile,
    pub sources: Vec<String>,
    pub patches_applied: Vec<String>,
}

/// Result of resolving a civil (or pass-through UTC) instant.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeResolution {
    pub utc: DateTime<Utc>,
    pub zone_id: String,
    pub offset_seconds: i32,
    pub dst_active: bool,
    pub confidence: Confidence,
    pub reason: String,
    pub provenance: Provenance,
    pub warnings: Vec<String>,
}

/// A declarative correction for known pre-standardization local-time
/// quirks (e.g. US localities that did not observe DST before 1967).
/// Loaded from a TOML table; kept data-only so additions require no code
/// change.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoricalPatch {
    pub zone_id: String,
    pub year_start: i32,
    pub year_end: i32,
    pub offset_correction_seconds: i32,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct PatchFile {
    #[serde(rename = "patch", default)]
    patches: Vec<HistoricalPatch>,
}

/// Parse a declarative patch-table TOML document (a list of `[[patch]]`
/// entries) into the patches consulted under `strict_history`.
pub fn load_patch_table(text: &str) -> Result<Vec<HistoricalPatch>, TimeError> {
    let file: PatchFile = toml::from_str(text).map_err(|e| TimeError::PatchParse(e.to_string()))?;
    Ok(file.patches)
}

/// Accepted input formats for flexible civil-datetime parsing, tried in
/// priority order: strict ISO first, then common regional variants, then
/// a natural-language form.
const CANDIDATE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M %p",
    "%d/%m/%Y %H:%M",
    "%B %d, %Y %I:%M %p",
    "%b %d, %Y %I:%M %p",
    "%b %d, %Y %H:%M",
];

/// Formats carrying an explicit UTC offset, tried before the naive set.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M %z",
    "%m/%d/%Y %I:%M %p %z",
];

/// Parse a loosely-formatted civil datetime string into a naive datetime,
/// trying each accepted format in priority order.
pub fn parse_civil_datetime(text: &str) -> Result<NaiveDateTime, TimeError> {
    Ok(parse_civil_input(text)?.0)
}

/// Parse a civil datetime string, also capturing any explicit UTC offset
/// the user wrote (e.g. `1962-07-02T23:33:00-05:00`). The naive part is
/// always the *local* reading of the text.
pub fn parse_civil_input(text: &str) -> Result<(NaiveDateTime, Option<i32>), TimeError> {
    let trimmed = text.trim();
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, fmt) {
            return Ok((dt.naive_local(), Some(dt.offset().local_minus_utc())));
        }
    }
    for fmt in CANDIDATE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok((dt, None));
        }
    }
    Err(TimeError::CivilDatetimeUnparseable(text.to_string()))
}

/// Look up the IANA zone id for a coordinate using the bundled offline
/// timezone-polygon dataset.
pub fn zone_for_coordinate(place: Place) -> Result<String, TimeError> {
    let name = tz_finder().get_tz_name(place.lon, place.lat);
    if name.is_empty() {
        return Err(TimeError::ZoneResolutionFailed(format!(
            "no timezone polygon for ({}, {})",
            place.lat, place.lon
        )));
    }
    Ok(name.to_string())
}

fn patch_for<'a>(zone_id: &str, year: i32, patches: &'a [HistoricalPatch]) -> Option<&'a HistoricalPatch> {
    patches
        .iter()
        .find(|p| p.zone_id == zone_id && year >= p.year_start && year <= p.year_end)
}

fn format_offset(offset_s: i32) -> String {
    let sign = if offset_s < 0 { '-' } else { '+' };
    let abs = offset_s.unsigned_abs();
    format!("{sign}{:02}:{:02}", abs / 3600, (abs % 3600) / 60)
}

/// Resolve an already-naive civil datetime in a known IANA zone to UTC,
/// handling DST fall-back ambiguity (earlier instant) and spring-forward
/// gaps (advance to the gap's end).
fn resolve_naive_in_zone(naive: NaiveDateTime, tz: Tz) -> (DateTime<Utc>, bool, Vec<String>) {
    let mut warnings = Vec::new();
    let resolved = match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earlier, _later) => {
            warnings.push("ambiguous local time (DST fall-back); resolved to the earlier instant".to_string());
            earlier
        }
        LocalResult::None => {
            warnings.push("nonexistent local time (DST spring-forward gap); advanced to the gap's end".to_string());
            // Step forward in small increments until the local time exists again.
            let mut probe = naive;
            let mut found = None;
            for _ in 0..240 {
                probe += chrono::Duration::minutes(1);
                if let LocalResult::Single(dt) = tz.from_local_datetime(&probe) {
                    found = Some(dt);
                    break;
                }
            }
            found.unwrap_or_else(|| tz.from_utc_datetime(&naive))
        }
    };
    let dst_active = resolved.offset().fix().local_minus_utc()
        != tz.offset_from_utc_datetime(&resolved.naive_utc()).base_utc_offset().num_seconds() as i32;
    (resolved.with_timezone(&Utc), dst_active, warnings)
}

/// Resolve a civil local datetime + place under a parity profile into a
/// [`TimeResolution`]. `patches` is only consulted under `strict_history`.
///
/// Under `as_entered` the user's own zone (`explicit_zone`) or an offset
/// embedded in the datetime text is used verbatim; the coordinate-derived
/// zone is still computed as a cross-check and any disagreement becomes a
/// warning on the low-confidence result.
pub fn resolve_civil(
    naive_text: &str,
    place: Place,
    profile: ParityProfile,
    explicit_zone: Option<&str>,
    patches: &[HistoricalPatch],
) -> Result<TimeResolution, TimeError> {
    let (naive, explicit_offset_s) = parse_civil_input(naive_text)?;
    let mut sources = vec!["tz-polygon-lookup".to_string()];
    let mut warnings = Vec::new();
    let mut patches_applied = Vec::new();

    let coord_zone_id = zone_for_coordinate(place).ok();

    let (zone_id, confidence) = match profile.canonical() {
        ParityProfile::AsEntered => {
            if explicit_zone.is_none()
                && let Some(offset_s) = explicit_offset_s
            {
                return Ok(resolve_as_entered_offset(naive, offset_s, profile, coord_zone_id));
            }
            let zone = explicit_zone
                .ok_or_else(|| TimeError::ZoneResolutionFailed("as_entered requires an explicit zone or offset".to_string()))?
                .to_string();
            if let Some(ref coord) = coord_zone_id
                && coord != &zone
            {
                warnings.push(format!(
                    "coordinate-derived zone '{coord}' disagrees with the provided zone '{zone}'"
                ));
            }
            sources.push("user-provided".to_string());
            (zone, Confidence::Low)
        }
        _ => {
            if explicit_offset_s.is_some() {
                warnings.push(format!(
                    "explicit offset in the input is ignored under the {profile:?} profile; the coordinate-derived zone governs"
                ));
            }
            let zone = coord_zone_id
                .clone()
                .ok_or_else(|| TimeError::ZoneResolutionFailed("could not determine zone from coordinates".to_string()))?;
            (zone, Confidence::High)
        }
    };

    let tz: Tz = zone_id
        .parse()
        .map_err(|_| TimeError::ZoneResolutionFailed(format!("unknown IANA zone: {zone_id}")))?;

    let (mut utc, dst_active, dst_warnings) = resolve_naive_in_zone(naive, tz);
    warnings.extend(dst_warnings);
    sources.push("iana-tzdata".to_string());

    let mut confidence = confidence;
    if !warnings.is_empty() && confidence == Confidence::High {
        confidence = Confidence::Medium;
    }

    if profile.applies_patches()
        && let Some(patch) = patch_for(&zone_id, naive.year(), patches)
    {
        utc -= chrono::Duration::seconds(patch.offset_correction_seconds as i64);
        patches_applied.push(patch.description.clone());
        sources.push("historical-patch-table".to_string());
    }

    let offset_seconds = tz.offset_from_utc_datetime(&utc.naive_utc()).base_utc_offset().num_seconds() as i32
        + if dst_active {
            tz.offset_from_utc_datetime(&utc.naive_utc()).dst_offset().num_seconds() as i32
        } else {
            0
        };

    Ok(TimeResolution {
        utc,
        zone_id: zone_id.clone(),
        offset_seconds,
        dst_active,
        confidence,
        reason: format!("resolved civil time in {zone_id} under {profile:?} profile"),
        provenance: Provenance { profile, sources, patches_applied },
        warnings,
    })
}

/// `as_entered` with an offset embedded in the datetime text: the offset
/// is applied verbatim; the coordinate-derived zone is recorded only as a
/// cross-check warning when it disagrees.
fn resolve_as_entered_offset(
    naive: NaiveDateTime,
    offset_s: i32,
    profile: ParityProfile,
    coord_zone_id: Option<String>,
) -> TimeResolution {
    let utc = Utc.from_utc_datetime(&(naive - chrono::Duration::seconds(offset_s as i64)));

    let mut warnings = Vec::new();
    if let Some(coord) = &coord_zone_id
        && let Ok(tz) = coord.parse::<Tz>()
    {
        let coord_offset = tz.offset_from_utc_datetime(&utc.naive_utc()).fix().local_minus_utc();
        if coord_offset != offset_s {
            warnings.push(format!(
                "coordinate-derived zone '{coord}' implies offset {}, input carried {}",
                format_offset(coord_offset),
                format_offset(offset_s)
            ));
        }
    }

    TimeResolution {
        utc,
        zone_id: format_offset(offset_s),
        offset_seconds: offset_s,
        dst_active: false,
        confidence: Confidence::Low,
        reason: format!("explicit utc offset used verbatim under {profile:?} profile"),
        provenance: Provenance {
            profile,
            sources: vec!["user-provided".to_string(), "tz-polygon-lookup".to_string()],
            patches_applied: Vec::new(),
        },
        warnings,
    }
}
