//! Graphite interlayer expansion: three graphene sheets drift apart one
//! second after entry and the ions between them speed up.

use glam::Vec3;
use rand::Rng;
use serde::Serialize;

use super::ions::{IonField, ION_COLOR};
use crate::color::Rgb;
use crate::smoothing::Smoothed;

pub const COLLAPSED_SEPARATION: f32 = 0.5;
pub const EXPANDED_SEPARATION: f32 = 1.8;
/// Seconds after entry before the sheets start to expand.
pub const EXPANSION_DELAY: f32 = 1.0;
pub const SEPARATION_RATE: f32 = 2.0;

pub const ION_COUNT: usize = 15;
pub const COLLAPSED_ION_SPEED: f32 = 0.5;
pub const EXPANDED_ION_SPEED: f32 = 3.0;
const ION_BOUNDS: Vec3 = Vec3::new(6.0, 0.0, 6.0);
const ION_LANE_MARGIN: f32 = 0.5;

/// Distance of the outer sheet anchors from the centre.
pub const SHEET_ANCHOR: f32 = 2.0;
pub const SHEET_SIZE: f32 = 8.0;
pub const SHEET_GRID: usize = 8;
pub const ATOM_RADIUS: f32 = 0.1;
pub const ATOM_COLOR: Rgb = Rgb::from_u8(0x33, 0x41, 0x55);
pub const SHEET_COLOR: Rgb = Rgb::from_u8(0x94, 0xA3, 0xB8);
const MIDDLE_SHEET_OPACITY: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SheetPose {
    pub y: f32,
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnodeFrame {
    pub elapsed: f32,
    pub expanded: bool,
    pub separation: f32,
    pub sheets: [SheetPose; 3],
    pub ion_speed: f32,
    pub ion_color: Rgb,
    pub ions: Vec<[f32; 3]>,
}

#[derive(Debug, Clone)]
pub struct AnodeSimulator {
    elapsed: f32,
    separation: Smoothed<f32>,
    ions: IonField,
}

impl AnodeSimulator {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            elapsed: 0.0,
            separation: Smoothed::new(COLLAPSED_SEPARATION, SEPARATION_RATE),
            ions: IonField::generate(ION_COUNT, ION_BOUNDS, ION_COLOR, rng),
        }
    }

    pub fn advance(&mut self, dt: f32) {
        if dt.is_nan() || dt <= 0.0 {
            return;
        }
        self.elapsed += dt;
        let target = if self.is_expanded() {
            EXPANDED_SEPARATION
        } else {
            COLLAPSED_SEPARATION
        };
        self.separation.step(target, dt);
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_expanded(&self) -> bool {
        self.elapsed >= EXPANSION_DELAY
    }

    pub fn separation(&self) -> f32 {
        self.separation.value()
    }

    pub fn ion_speed(&self) -> f32 {
        if self.is_expanded() {
            EXPANDED_ION_SPEED
        } else {
            COLLAPSED_ION_SPEED
        }
    }

    pub fn ion_color(&self) -> Rgb {
        self.ions.color()
    }

    pub fn sheets(&self) -> [SheetPose; 3] {
        let separation = self.separation();
        [
            SheetPose {
                y: SHEET_ANCHOR + separation,
                opacity: 1.0,
            },
            SheetPose {
                y: -SHEET_ANCHOR - separation,
                opacity: 1.0,
            },
            SheetPose {
                y: 0.0,
                opacity: MIDDLE_SHEET_OPACITY,
            },
        ]
    }

    pub fn ion_positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        let separation = self.separation();
        let lane = (-separation + ION_LANE_MARGIN, separation - ION_LANE_MARGIN);
        self.ions
            .poses(self.elapsed, self.ion_speed(), lane, ION_COUNT)
    }

    pub fn frame(&self) -> AnodeFrame {
        AnodeFrame {
            elapsed: self.elapsed,
            expanded: self.is_expanded(),
            separation: self.separation(),
            sheets: self.sheets(),
            ion_speed: self.ion_speed(),
            ion_color: self.ion_color(),
            ions: self.ion_positions().map(|position| position.to_array()).collect(),
        }
    }
}

/// Atom positions on one sheet, in the sheet's local x/z plane.
pub fn sheet_atoms() -> impl Iterator<Item = (f32, f32)> {
    let half = (SHEET_GRID as f32 - 1.0) * 0.5;
    (0..SHEET_GRID * SHEET_GRID).map(move |index| {
        let x = (index % SHEET_GRID) as f32 - half;
        let z = (index / SHEET_GRID) as f32 - half;
        (x, z)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn simulator() -> AnodeSimulator {
        AnodeSimulator::new(&mut StdRng::seed_from_u64(11))
    }

    #[test]
    fn starts_collapsed_with_slow_ions() {
        let sim = simulator();
        assert_eq!(sim.separation(), COLLAPSED_SEPARATION);
        assert!(!sim.is_expanded());
        assert_eq!(sim.ion_speed(), COLLAPSED_ION_SPEED);
        assert_eq!(sim.frame().ions.len(), ION_COUNT);
    }

    #[test]
    fn frame_carries_the_ion_color() {
        assert_eq!(simulator().frame().ion_color, ION_COLOR);
    }

    #[test]
    fn holds_collapsed_until_delay_elapses() {
        let mut sim = simulator();
        for _ in 0..50 {
            sim.advance(1.0 / 60.0);
        }
        assert!(!sim.is_expanded());
        assert_eq!(sim.separation(), COLLAPSED_SEPARATION);
    }

    #[test]
    fn expands_monotonically_without_overshoot() {
        let mut sim = simulator();
        let mut previous = sim.separation();
        for _ in 0..(60 * 6) {
            sim.advance(1.0 / 60.0);
            let current = sim.separation();
            assert!(current >= previous);
            assert!(current <= EXPANDED_SEPARATION);
            previous = current;
        }
        assert!(sim.is_expanded());
        assert_eq!(sim.ion_speed(), EXPANDED_ION_SPEED);
        assert!(EXPANDED_SEPARATION - previous < 0.01);
    }

    #[test]
    fn sheets_track_separation() {
        let mut sim = simulator();
        for _ in 0..120 {
            sim.advance(1.0 / 30.0);
        }
        let [top, bottom, middle] = sim.sheets();
        assert!((top.y - (SHEET_ANCHOR + sim.separation())).abs() < 1e-6);
        assert!((bottom.y + top.y).abs() < 1e-6);
        assert_eq!(middle.y, 0.0);
        assert!(middle.opacity < top.opacity);
    }

    #[test]
    fn sheet_grid_is_centred() {
        let atoms: Vec<(f32, f32)> = sheet_atoms().collect();
        assert_eq!(atoms.len(), 64);
        assert_eq!(atoms[0], (-3.5, -3.5));
        assert_eq!(atoms[63], (3.5, 3.5));
    }

    #[test]
    fn ignores_non_positive_steps() {
        let mut sim = simulator();
        sim.advance(0.0);
        sim.advance(-1.0);
        sim.advance(f32::NAN);
        assert_eq!(sim.elapsed(), 0.0);
    }
}
