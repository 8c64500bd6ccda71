//! The de Jong/Clifford style map and its slowly drifting parameters.

use std::f64::consts::TAU;

use crate::config::{PHASE_STEP_E, PHASE_STEP_F};

const BASE_A: f64 = -1.4;
const BASE_B: f64 = -1.6;
const BASE_C: f64 = 1.0;
const BASE_D: f64 = 0.7;

/// Amplitude of the sinusoidal offset added to each base parameter.
const DRIFT: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Parameters {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Parameters {
    fn from_phases(e: f64, f: f64) -> Self {
        Self {
            a: BASE_A + e.sin() * DRIFT,
            b: BASE_B + f.sin() * DRIFT,
            c: BASE_C + f.cos() * DRIFT,
            d: BASE_D + e.cos() * DRIFT,
        }
    }
}

/// Current point, shape parameters and the two phase accumulators driving them.
#[derive(Clone, Debug, PartialEq)]
pub struct AttractorState {
    point: Point,
    parameters: Parameters,
    e: f64,
    f: f64,
}

impl AttractorState {
    pub fn new() -> Self {
        Self {
            point: Point { x: 0.0, y: 0.0 },
            parameters: Parameters {
                a: -1.4,
                b: 1.6,
                c: 1.0,
                d: 0.7,
            },
            e: 0.0,
            f: 1.0,
        }
    }

    pub fn point(&self) -> Point {
        self.point
    }

    pub fn parameters(&self) -> Parameters {
        self.parameters
    }

    pub fn phases(&self) -> (f64, f64) {
        (self.e, self.f)
    }

    /// Move both phases forward one frame and recompute the shape parameters from them.
    pub fn advance_phase(&mut self) {
        self.e = wrap_phase(self.e + PHASE_STEP_E);
        self.f = wrap_phase(self.f + PHASE_STEP_F);
        self.parameters = Parameters::from_phases(self.e, self.f);
    }

    /// Apply the map once and return the new point.
    pub fn step(&mut self) -> Point {
        let Point { x, y } = self.point;
        let Parameters { a, b, c, d } = self.parameters;

        self.point = Point {
            x: (a * y).sin() + c * (a * x).cos(),
            y: (b * x).sin() + d * (b * y).cos(),
        };
        self.point
    }
}

impl Default for AttractorState {
    fn default() -> Self {
        Self::new()
    }
}

fn wrap_phase(phase: f64) -> f64 {
    if phase >= TAU {
        0.0
    } else {
        phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_step_from_seed() {
        let mut state = AttractorState::new();
        let point = state.step();

        assert!((point.x - 1.0).abs() < 1e-12);
        assert!((point.y - 0.7).abs() < 1e-12);
        assert_eq!(state.point(), point);
    }

    #[test]
    fn phase_e_wraps_once_per_cycle() {
        let mut state = AttractorState::new();
        let mut wraps = Vec::new();
        let mut previous = state.phases().0;

        for frame in 1..=629 * 3 {
            state.advance_phase();
            let (e, _) = state.phases();
            if e < previous {
                assert_eq!(e, 0.0);
                wraps.push(frame);
            }
            previous = e;
        }

        assert_eq!(wraps, vec![629, 1258, 1887]);
    }

    #[test]
    fn phases_stay_in_range() {
        let mut state = AttractorState::new();
        for _ in 0..10_000 {
            state.advance_phase();
            let (e, f) = state.phases();
            assert!((0.0..TAU).contains(&e), "e = {}", e);
            assert!((0.0..TAU).contains(&f), "f = {}", f);
        }
    }

    #[test]
    fn parameters_follow_phases() {
        let mut state = AttractorState::new();
        for _ in 0..5_000 {
            state.advance_phase();
            let (e, f) = state.phases();
            let Parameters { a, b, c, d } = state.parameters();

            assert_eq!(state.parameters(), Parameters::from_phases(e, f));
            assert!((-1.9..=-0.9).contains(&a));
            assert!((-2.1..=-1.1).contains(&b));
            assert!((0.5..=1.5).contains(&c));
            assert!((0.2..=1.2).contains(&d));
        }
    }

    #[test]
    fn trajectory_is_bounded() {
        let mut state = AttractorState::new();
        for frame in 0..50 {
            state.advance_phase();
            for _ in 0..1_000 {
                let Point { x, y } = state.step();
                let limit = 1.0 + state.parameters().c.abs().max(state.parameters().d.abs());
                assert!(x.abs() <= limit && y.abs() <= limit, "frame {}: ({}, {})", frame, x, y);
            }
        }
    }
}
