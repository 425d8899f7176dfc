//! Longitudes of the Moon's orbital nodes, for the node bodies.
//!
//! The ascending node (Rahu) is the fifth Delaunay argument; the
//! descending node (Ketu) sits opposite. The "true" node adds the
//! short-period osculation terms from Meeus, *Astronomical Algorithms*
//! (2nd ed.), chapter 47, on top of the mean polynomial.

use ephemeris_frames::delaunay_arguments;

/// Which node is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LunarNode {
    /// Ascending node (north / Rahu).
    Rahu,
    /// Descending node (south / Ketu), always opposite Rahu.
    Ketu,
}

/// Mean (smooth polynomial) or true (osculating) node longitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeMode {
    #[default]
    Mean,
    True,
}

/// One osculation term: integer multiples of the Delaunay arguments
/// `[l, l', F, D, Ω]` and a sine amplitude in degrees.
struct OscTerm {
    arg: [i8; 5],
    amp_deg: f64,
}

const fn osc(arg: [i8; 5], amp_deg: f64) -> OscTerm {
    OscTerm { arg, amp_deg }
}

/// Meeus Table 47.B, largest terms first. The leading Ω term dominates
/// at ±1.5°; everything past the table contributes under a
/// milliarcsecond-scale residual irrelevant at this service's accuracy.
#[rustfmt::skip]
static OSCULATION: [OscTerm; 13] = [
    osc([0, 0, 0, 0, 1], -1.4979),
    osc([0, 0, 2, -2, 0], 0.1500),
    osc([0, 0, 2, 0, 0], -0.1226),
    osc([0, 0, 0, 0, 2], 0.1176),
    osc([1, 0, 0, 0, 0], -0.0801),
    osc([0, 1, 0, 0, 0], 0.0056),
    osc([0, 0, 2, 0, -2], -0.0047),
    osc([1, 0, 2, 0, 0], -0.0043),
    osc([0, 0, 2, -2, 2], 0.0040),
    osc([0, 1, 0, 0, -1], 0.0037),
    osc([0, 0, 0, 2, 0], -0.0030),
    osc([2, 0, 0, 0, 0], -0.0020),
    osc([0, 1, 2, -2, 0], 0.0015),
];

fn wrap360(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Node longitude in degrees `[0, 360)` at `t` Julian centuries of TDB
/// since J2000.0.
pub fn lunar_node_deg(node: LunarNode, t: f64, mode: NodeMode) -> f64 {
    let args = delaunay_arguments(t);
    let mut lon = args[4].to_degrees();

    if mode == NodeMode::True {
        lon += OSCULATION
            .iter()
            .map(|term| {
                let phase: f64 = term
                    .arg
                    .iter()
                    .zip(&args)
                    .map(|(&n, &a)| f64::from(n) * a)
                    .sum();
                term.amp_deg * phase.sin()
            })
            .sum::<f64>();
    }

    if node == LunarNode::Ketu {
        lon += 180.0;
    }
    wrap360(lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separation_deg(a: f64, b: f64) -> f64 {
        let d = (a - b).rem_euclid(360.0);
        d.min(360.0 - d)
    }

    #[test]
    fn mean_rahu_at_j2000() {
        let deg = lunar_node_deg(LunarNode::Rahu, 0.0, NodeMode::Mean);
        assert!((deg - 125.0445).abs() < 0.01, "Rahu(J2000) = {deg}");
    }

    #[test]
    fn ketu_always_opposes_rahu() {
        for t in [-1.0, 0.0, 0.13, 2.5] {
            for mode in [NodeMode::Mean, NodeMode::True] {
                let rahu = lunar_node_deg(LunarNode::Rahu, t, mode);
                let ketu = lunar_node_deg(LunarNode::Ketu, t, mode);
                assert!(
                    (separation_deg(rahu, ketu) - 180.0).abs() < 1e-9,
                    "t={t} mode={mode:?}: Rahu={rahu} Ketu={ketu}"
                );
            }
        }
    }

    #[test]
    fn mean_node_regresses_nineteen_degrees_per_year() {
        let start = lunar_node_deg(LunarNode::Rahu, 0.0, NodeMode::Mean);
        let one_year = lunar_node_deg(LunarNode::Rahu, 0.01, NodeMode::Mean);
        let motion = separation_deg(start, one_year);
        assert!((motion - 19.34).abs() < 0.2, "yearly motion = {motion}");
        // And it is retrograde: a small step forward in time moves the
        // node to a smaller longitude (modulo wrap).
        let step = lunar_node_deg(LunarNode::Rahu, 1e-4, NodeMode::Mean);
        assert!((start - step).rem_euclid(360.0) < 1.0);
    }

    #[test]
    fn osculation_stays_within_two_degrees() {
        for t in [-3.0, -0.5, 0.0, 0.24, 1.7, 6.0] {
            let mean = lunar_node_deg(LunarNode::Rahu, t, NodeMode::Mean);
            let true_ = lunar_node_deg(LunarNode::Rahu, t, NodeMode::True);
            assert!(separation_deg(mean, true_) < 2.0, "t={t}: mean={mean} true={true_}");
        }
    }

    #[test]
    fn osculation_is_not_identically_zero() {
        let mut max_sep = 0.0_f64;
        for i in 0..50 {
            let t = i as f64 * 0.004;
            let mean = lunar_node_deg(LunarNode::Rahu, t, NodeMode::Mean);
            let true_ = lunar_node_deg(LunarNode::Rahu, t, NodeMode::True);
            max_sep = max_sep.max(separation_deg(mean, true_));
        }
        assert!(max_sep > 0.5, "largest osculation seen: {max_sep}");
    }

    #[test]
    fn output_is_always_wrapped() {
        for t in [-6.0, -1.0, 0.0, 4.0, 11.0] {
            for node in [LunarNode::Rahu, LunarNode::Ketu] {
                for mode in [NodeMode::Mean, NodeMode::True] {
                    let deg = lunar_node_deg(node, t, mode);
                    assert!((0.0..360.0).contains(&deg), "{node:?}/{mode:?}/{t}: {deg}");
                }
            }
        }
    }
}
