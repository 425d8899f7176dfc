//! SPK (Spacecraft and Planet Kernel) segment catalog and Type 2 evaluation.
//!
//! Reads the DAF summary table as SPK segment descriptors (ND=2, NI=6:
//! start/end epoch, target, center, frame, data type, start/end word
//! address) and evaluates Type 2 (Chebyshev position-only) segments.
//!
//! Format reference: NAIF SPK Required Reading.

use std::path::Path;

use crate::interp::chebyshev_with_derivative;
use crate::daf::DafFile;
use crate::error::KernelError;

/// One SPK segment descriptor (one body-pair's coverage within the file).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start_et: f64,
    pub end_et: f64,
    pub target: i32,
    pub center: i32,
    pub frame: i32,
    pub data_type: i32,
    pub start_addr: usize,
    pub end_addr: usize,
}

/// Evaluated Cartesian position and velocity at a requested epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpkEvaluation {
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
}

/// A loaded SPK kernel: its segment catalog plus the underlying DAF bytes.
#[derive(Debug)]
pub struct SpkKernel {
    daf: DafFile,
    segments: Vec<Segment>,
}

impl SpkKernel {
    /// Load and parse an SPK file from disk.
    pub fn load(path: &Path) -> Result<Self, KernelError> {
        let bytes = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                KernelError::NotFound { path: path.display().to_string() }
            } else {
                KernelError::Io(e.to_string())
            }
        })?;
        Self::parse(bytes)
    }

    /// Parse an SPK kernel already read into memory.
    pub fn parse(bytes: Vec<u8>) -> Result<Self, KernelError> {
        let daf = DafFile::parse(bytes)?;
        if daf.file_record.nd != 2 || daf.file_record.ni != 6 {
            return Err(KernelError::BadFormat(format!(
                "not an SPK summary layout: nd={} ni={}",
                daf.file_record.nd, daf.file_record.ni
            )));
        }
        let segments = daf
            .summaries
            .iter()
            .map(|s| Segment {
                start_et: s.doubles[0],
                end_et: s.doubles[1],
                target: s.ints[0],
                center: s.ints[1],
                frame: s.ints[2],
                data_type: s.ints[3],
                start_addr: s.ints[4] as usize,
                end_addr: s.ints[5] as usize,
            })
            .collect();
        Ok(Self { daf, segments })
    }

    /// All segments in the file, in DAF summary order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Find the center body for a given target, if a segment covers it.
    pub fn center_for(&self, target: i32) -> Option<i32> {
        self.segments.iter().find(|s| s.target == target).map(|s| s.center)
    }

    /// Evaluate the state of `target` relative to `center` at `epoch_tdb_s`
    /// (TDB seconds past J2000, matching SPK's "ephemeris time" convention).
    pub fn evaluate(
        &self,
        target: i32,
        center: i32,
        epoch_tdb_s: f64,
    ) -> Result<SpkEvaluation, KernelError> {
        let segment = self
            .segments
            .iter()
            .find(|s| s.target == target && s.center == center)
            .ok_or(KernelError::SegmentNotFound { target, center })?;

        if epoch_tdb_s < segment.start_et || epoch_tdb_s > segment.end_et {
            return Err(KernelError::EpochOutOfRange { target, center, epoch_tdb_s });
        }

        match segment.data_type {
            2 => self.evaluate_type2(segment, epoch_tdb_s),
            other => Err(KernelError::UnsupportedDataType { data_type: other }),
        }
    }

    /// Resolve `body_code` all the way to the solar-system barycenter (0),
    /// summing state vectors along the center chain.
    pub fn resolve_to_ssb(&self, body_code: i32, epoch_tdb_s: f64) -> Result<[f64; 6], KernelError> {
        let mut code = body_code;
        let mut state = [0.0f64; 6];
        while code != 0 {
            let center = match self.center_for(code) {
                Some(c) => c,
                None => {
                    let bary = planet_body_to_barycenter(code);
                    if bary != code {
                        code = bary;
                        continue;
                    }
                    return Err(KernelError::SegmentNotFound { target: code, center: -1 });
                }
            };
            let eval = self.evaluate(code, center, epoch_tdb_s)?;
            state[0] += eval.position_km[0];
            state[1] += eval.position_km[1];
            state[2] += eval.position_km[2];
            state[3] += eval.velocity_km_s[0];
            state[4] += eval.velocity_km_s[1];
            state[5] += eval.velocity_km_s[2];
            code = center;
        }
        Ok(state)
    }

    fn evaluate_type2(&self, segment: &Segment, epoch_tdb_s: f64) -> Result<SpkEvaluation, KernelError> {
        // Trailer: [INIT, INTLEN, RSIZE, N] as the last 4 doubles of the segment.
        let trailer = self.daf.read_doubles(segment.end_addr - 3, 4)?;
        let init = trailer[0];
        let intlen = trailer[1];
        let rsize = trailer[2] as usize;
        let n_records = trailer[3] as usize;

        if intlen <= 0.0 || n_records == 0 {
            return Err(KernelError::BadFormat("invalid Type 2 segment trailer".into()));
        }

        let mut record_index = ((epoch_tdb_s - init) / intlen).floor() as i64;
        record_index = record_index.clamp(0, n_records as i64 - 1);
        let record_addr = segment.start_addr + record_index as usize * rsize;

        let record = self.daf.read_doubles(record_addr, rsize)?;
        let mid = record[0];
        let radius = record[1];
        if radius <= 0.0 {
            return Err(KernelError::BadFormat("non-positive Chebyshev radius".into()));
        }
        let ncoeff = (rsize - 2) / 3;

        let s = (epoch_tdb_s - mid) / radius;
        let mut position = [0.0f64; 3];
        let mut velocity = [0.0f64; 3];
        for axis in 0..3 {
            let start = 2 + axis * ncoeff;
            let (value, slope) = chebyshev_with_derivative(&record[start..start + ncoeff], s);
            position[axis] = value;
            velocity[axis] = slope / radius;
        }

        Ok(SpkEvaluation { position_km: position, velocity_km_s: velocity })
    }
}

/// Map a planet system body (e.g. 499 = Mars) to its barycenter code
/// (e.g. 4 = Mars Barycenter) when no direct segment exists for the body.
/// Earth (399) and Moon (301) resolve through the Earth-Moon barycenter (3).
pub const fn planet_body_to_barycenter(code: i32) -> i32 {
    match code {
        199 => 1,
        299 => 2,
        399 => 3,
        301 => 3,
        499 => 4,
        599 => 5,
        699 => 6,
        799 => 7,
        899 => 8,
        999 => 9,
        other => other,
    }
}
