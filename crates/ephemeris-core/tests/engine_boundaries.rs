//! Engine behavior at and beyond kernel coverage, plus the chain
//! arithmetic the compute layer leans on. Skipped without
//! `kernels/data/de442s.bsp`.

use std::path::PathBuf;

use ephemeris_core::{Body, Engine, EngineConfig, EngineError, Observer, Query};

fn engine() -> Option<Engine> {
    let spk = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../kernels/data/de442s.bsp");
    if !spk.exists() {
        eprintln!("Skipping: de442s.bsp not found");
        return None;
    }
    Some(Engine::new(EngineConfig { spk_paths: vec![spk] }).expect("engine loads"))
}

fn norm_km(v: &[f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

const AU_KM: f64 = 149_597_870.7;

#[test]
fn epochs_outside_every_segment_fail_with_the_range_error() {
    let Some(engine) = engine() else { return };
    // Far before 1550 CE and far after 2650 CE.
    for jd in [2_000_000.5, 2_900_000.5] {
        let err = engine
            .query(Query {
                target: Body::Sun,
                observer: Observer::SolarSystemBarycenter,
                epoch_tdb_jd: jd,
            })
            .unwrap_err();
        assert!(
            matches!(err, EngineError::EpochOutOfRange { .. }),
            "at {jd}: {err:?}"
        );
    }
}

#[test]
fn epochs_inside_coverage_succeed_at_both_ends() {
    let Some(engine) = engine() else { return };
    // Comfortably within the kernel's ~1550..2650 window.
    for jd in [2_305_000.5, 2_451_545.0, 2_670_000.5] {
        let state = engine
            .query(Query {
                target: Body::Earth,
                observer: Observer::SolarSystemBarycenter,
                epoch_tdb_jd: jd,
            })
            .unwrap_or_else(|e| panic!("at {jd}: {e}"));
        let au = norm_km(&state.position_km) / AU_KM;
        assert!((0.95..1.05).contains(&au), "Earth at {jd}: {au} au from SSB");
    }
}

#[test]
fn sun_hugs_the_barycenter() {
    let Some(engine) = engine() else { return };
    let state = engine
        .query(Query {
            target: Body::Sun,
            observer: Observer::SolarSystemBarycenter,
            epoch_tdb_jd: 2_451_545.0,
        })
        .unwrap();
    // The Sun wanders from the barycenter by at most a couple of solar
    // radii (~0.01 au).
    assert!(norm_km(&state.position_km) / AU_KM < 0.02);
}

#[test]
fn moon_relative_to_earth_is_consistent_with_the_chain_difference() {
    let Some(engine) = engine() else { return };
    let jd = 2_451_545.0;
    let direct = engine
        .query(Query { target: Body::Moon, observer: Observer::Body(Body::Earth), epoch_tdb_jd: jd })
        .unwrap();
    let moon = engine
        .query(Query { target: Body::Moon, observer: Observer::SolarSystemBarycenter, epoch_tdb_jd: jd })
        .unwrap();
    let earth = engine
        .query(Query { target: Body::Earth, observer: Observer::SolarSystemBarycenter, epoch_tdb_jd: jd })
        .unwrap();

    for i in 0..3 {
        let diff = moon.position_km[i] - earth.position_km[i];
        assert!((direct.position_km[i] - diff).abs() < 1e-6);
    }
    let distance = norm_km(&direct.position_km);
    assert!((356_000.0..407_000.0).contains(&distance), "Moon at {distance} km");
}

#[test]
fn velocities_are_in_heliocentric_scale() {
    let Some(engine) = engine() else { return };
    let earth = engine
        .query(Query {
            target: Body::Earth,
            observer: Observer::SolarSystemBarycenter,
            epoch_tdb_jd: 2_451_545.0,
        })
        .unwrap();
    let speed = norm_km(&earth.velocity_km_s);
    assert!((29.0..31.0).contains(&speed), "Earth orbital speed = {speed} km/s");
}

#[test]
fn degenerate_queries_are_rejected_before_any_evaluation() {
    let Some(engine) = engine() else { return };
    let same = engine
        .query(Query { target: Body::Mars, observer: Observer::Body(Body::Mars), epoch_tdb_jd: 2_451_545.0 })
        .unwrap_err();
    assert!(matches!(same, EngineError::InvalidQuery(_)));

    let nan = engine
        .query(Query { target: Body::Sun, observer: Observer::SolarSystemBarycenter, epoch_tdb_jd: f64::NAN })
        .unwrap_err();
    assert!(matches!(nan, EngineError::InvalidQuery(_)));
}
