//! IERS Earth-orientation data: the UT1−UTC (DUT1) table.
//!
//! The topocentric observer rotation needs UT1. DUT1 comes from the
//! IERS `finals2000A.all` product (fixed-width, one line per day,
//! available from <https://datacenter.iers.org/>); of its many columns
//! this service reads only the MJD, the I/P (final/predicted) flag,
//! and the UT1−UTC value:
//!
//! - columns 8–15: Modified Julian Date (F8.2)
//! - column 58: `I` (IERS final) or `P` (prediction)
//! - columns 59–68: UT1−UTC in seconds (F10.7)
//!
//! Epochs outside the table window are an error here; the compute
//! layer treats that error as "fall back to the mean-rotation model"
//! and records the fallback in provenance.

use crate::error::TimeError;

const MJD_JD_OFFSET: f64 = 2_400_000.5;

/// One daily DUT1 sample.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DutSample {
    mjd: f64,
    dut1_s: f64,
}

/// Loaded DUT1 table, ready for UT1 conversions.
#[derive(Debug, Clone)]
pub struct EopKernel {
    samples: Vec<DutSample>,
}

impl EopKernel {
    /// Load a `finals2000A.all` file from disk.
    pub fn load(path: &std::path::Path) -> Result<Self, TimeError> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// Parse `finals2000A.all` content. Lines without a usable MJD,
    /// flag, or DUT1 field (the un-predicted tail of the file) are
    /// skipped.
    pub fn parse(content: &str) -> Result<Self, TimeError> {
        let mut samples: Vec<DutSample> = content.lines().filter_map(parse_line).collect();
        if samples.is_empty() {
            return Err(TimeError::EopParse("no usable DUT1 lines found".into()));
        }
        samples.sort_by(|a, b| a.mjd.total_cmp(&b.mjd));
        Ok(Self { samples })
    }

    /// Number of daily samples loaded.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// First and last MJD covered.
    pub fn mjd_span(&self) -> (f64, f64) {
        (self.samples[0].mjd, self.samples[self.samples.len() - 1].mjd)
    }

    /// UT1−UTC in seconds at `mjd`, linearly interpolated between the
    /// bracketing daily samples.
    pub fn dut1_seconds(&self, mjd: f64) -> Result<f64, TimeError> {
        let (first, last) = self.mjd_span();
        if !(first..=last).contains(&mjd) {
            return Err(TimeError::EopOutOfRange);
        }

        let upper = self.samples.partition_point(|s| s.mjd <= mjd);
        let right = self.samples[upper.min(self.samples.len() - 1)];
        let left = self.samples[upper.saturating_sub(1)];

        let width = right.mjd - left.mjd;
        if width <= 0.0 {
            return Ok(left.dut1_s);
        }
        let along = (mjd - left.mjd) / width;
        Ok(left.dut1_s + along * (right.dut1_s - left.dut1_s))
    }

    /// UTC Julian Date → UT1 Julian Date.
    pub fn utc_to_ut1_jd(&self, jd_utc: f64) -> Result<f64, TimeError> {
        let dut1 = self.dut1_seconds(jd_utc - MJD_JD_OFFSET)?;
        Ok(jd_utc + dut1 / 86_400.0)
    }
}

/// Pull a fixed-width field as a trimmed float.
fn float_field(line: &str, range: std::ops::Range<usize>) -> Option<f64> {
    line.get(range)?.trim().parse().ok()
}

fn parse_line(line: &str) -> Option<DutSample> {
    let flag = *line.as_bytes().get(57)?;
    if !matches!(flag, b'I' | b'P') {
        return None;
    }
    Some(DutSample {
        mjd: float_field(line, 7..15)?,
        dut1_s: float_field(line, 58..68)?,
    })
}
