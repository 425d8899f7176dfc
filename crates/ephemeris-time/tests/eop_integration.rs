//! Tests against a real IERS finals2000A.all file, skipped when the
//! data file is not on disk.

use std::path::Path;

use ephemeris_time::EopKernel;

const EOP_PATH: &str = "../../data/finals2000A.all";

fn load_eop() -> Option<EopKernel> {
    if !Path::new(EOP_PATH).exists() {
        eprintln!("Skipping eop_integration: {EOP_PATH} not found");
        return None;
    }
    EopKernel::load(Path::new(EOP_PATH)).ok()
}

#[test]
fn real_file_carries_decades_of_daily_samples() {
    let Some(eop) = load_eop() else { return };
    assert!(
        eop.sample_count() > 10_000,
        "expected >10000 samples, got {}",
        eop.sample_count()
    );
    let (start, end) = eop.mjd_span();
    assert!(end - start > 10_000.0, "span {start}..{end} looks too short");
}

#[test]
fn dut1_stays_under_the_leap_second_bound() {
    // IERS schedules leap seconds precisely to keep |UT1-UTC| < 0.9 s.
    let Some(eop) = load_eop() else { return };
    let (start, end) = eop.mjd_span();
    let mut mjd = start;
    while mjd <= end {
        let dut1 = eop.dut1_seconds(mjd).expect("inside span");
        assert!(dut1.abs() < 0.9, "DUT1 at MJD {mjd} = {dut1} s");
        mjd += 73.0;
    }
}

#[test]
fn ut1_conversion_moves_less_than_a_second() {
    let Some(eop) = load_eop() else { return };
    let (start, end) = eop.mjd_span();
    let mjd = (start + end) / 2.0;
    let jd_utc = mjd + 2_400_000.5;
    let jd_ut1 = eop.utc_to_ut1_jd(jd_utc).unwrap();
    assert!(((jd_ut1 - jd_utc) * 86_400.0).abs() < 0.9);
}
