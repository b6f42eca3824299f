//! Drifting lithium ions shared by both micro scenes. Each ion keeps a random
//! lateral offset, depth offset and phase picked once at construction; poses
//! are produced lazily for a given time so callers can restart the walk as
//! often as they like.

use glam::Vec3;
use rand::Rng;

use crate::color::Rgb;

/// Primary ion tint.
pub const ION_COLOR: Rgb = Rgb::from_u8(0xEF, 0x44, 0x44);
/// Lighter tint used inside the glass electrolyte.
pub const GLASS_ION_COLOR: Rgb = Rgb::from_u8(0xFC, 0xA5, 0xA5);

const BOB_AMPLITUDE: f32 = 0.1;
const BOB_FREQUENCY: f32 = 5.0;
const MAX_PHASE: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct IonSeed {
    x_offset: f32,
    z_offset: f32,
    phase: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IonField {
    seeds: Vec<IonSeed>,
    bounds: Vec3,
    color: Rgb,
}

impl IonField {
    pub fn generate<R: Rng + ?Sized>(count: usize, bounds: Vec3, color: Rgb, rng: &mut R) -> Self {
        let seeds = (0..count)
            .map(|_| IonSeed {
                x_offset: (rng.gen::<f32>() - 0.5) * bounds.x,
                z_offset: (rng.gen::<f32>() - 0.5) * bounds.z,
                phase: rng.gen::<f32>() * MAX_PHASE,
            })
            .collect();
        Self {
            seeds,
            bounds,
            color,
        }
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    /// Poses of the first `count` ions at `time`, drifting along x at `speed`
    /// and bobbing around the middle of `y_range`. Yields nothing when the
    /// speed is not positive.
    pub fn poses(&self, time: f32, speed: f32, y_range: (f32, f32), count: usize) -> IonPoses<'_> {
        let visible = if speed > 0.0 && speed.is_finite() {
            count.min(self.seeds.len())
        } else {
            0
        };
        IonPoses {
            seeds: self.seeds[..visible].iter(),
            time,
            speed,
            width: self.bounds.x,
            y_mid: (y_range.0 + y_range.1) * 0.5,
        }
    }
}

/// Lazy iterator over ion positions; clone it to replay the same frame.
#[derive(Debug, Clone)]
pub struct IonPoses<'a> {
    seeds: std::slice::Iter<'a, IonSeed>,
    time: f32,
    speed: f32,
    width: f32,
    y_mid: f32,
}

impl Iterator for IonPoses<'_> {
    type Item = Vec3;

    fn next(&mut self) -> Option<Self::Item> {
        let seed = self.seeds.next()?;
        let local = self.time + seed.phase;
        let travelled = local * self.speed + seed.x_offset;
        let x = if self.width > 0.0 {
            travelled.rem_euclid(self.width) - self.width * 0.5
        } else {
            0.0
        };
        let y = self.y_mid + (local * BOB_FREQUENCY).sin() * BOB_AMPLITUDE;
        Some(Vec3::new(x, y, seed.z_offset))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.seeds.size_hint()
    }
}

impl ExactSizeIterator for IonPoses<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn field(count: usize) -> IonField {
        let mut rng = StdRng::seed_from_u64(7);
        IonField::generate(count, Vec3::new(6.0, 0.0, 6.0), ION_COLOR, &mut rng)
    }

    #[test]
    fn poses_wrap_inside_the_box() {
        let ions = field(15);
        for step in 0..200 {
            let time = step as f32 * 0.37;
            for pose in ions.poses(time, 3.0, (-1.0, 1.0), 15) {
                assert!(pose.x >= -3.0 && pose.x <= 3.0, "x out of range: {}", pose.x);
                assert!(pose.y.abs() <= BOB_AMPLITUDE + 1e-5);
                assert!(pose.z.abs() <= 3.0);
            }
        }
    }

    #[test]
    fn non_positive_speed_hides_ions() {
        let ions = field(15);
        assert_eq!(ions.poses(1.0, 0.0, (0.0, 0.0), 15).count(), 0);
        assert_eq!(ions.poses(1.0, -2.0, (0.0, 0.0), 15).count(), 0);
    }

    #[test]
    fn count_is_capped_by_capacity() {
        let ions = field(30);
        assert_eq!(ions.poses(0.0, 2.0, (-2.0, 2.0), 12).len(), 12);
        assert_eq!(ions.poses(0.0, 2.0, (-2.0, 2.0), 99).len(), 30);
    }

    #[test]
    fn iterator_is_restartable() {
        let ions = field(5);
        let poses = ions.poses(4.2, 0.5, (-1.0, 1.0), 5);
        let first: Vec<Vec3> = poses.clone().collect();
        let second: Vec<Vec3> = poses.collect();
        assert_eq!(first, second);
        assert_eq!(first, ions.poses(4.2, 0.5, (-1.0, 1.0), 5).collect::<Vec<_>>());
    }

    #[test]
    fn ions_move_with_time() {
        let ions = field(1);
        let a = ions.poses(0.0, 1.0, (0.0, 0.0), 1).next().expect("pose");
        let b = ions.poses(0.5, 1.0, (0.0, 0.0), 1).next().expect("pose");
        assert_ne!(a.x, b.x);
        assert_eq!(a.z, b.z);
    }
}
