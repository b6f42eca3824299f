//! Exponential decay toward a target, shared by every animated quantity in
//! the scene (layer emphasis, stack spacing, camera look-at, sheet
//! separation, node scale). The blend factor `1 - e^(-rate * dt)` stays in
//! `[0, 1)`, so a value never overshoots its target and converges at the
//! same speed regardless of frame rate.

use glam::Vec3;

/// Linear interpolation used by [`Smoothed`].
pub trait Lerp: Copy {
    fn lerp(self, target: Self, amount: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(self, target: Self, amount: f32) -> Self {
        self + (target - self) * amount
    }
}

impl Lerp for Vec3 {
    fn lerp(self, target: Self, amount: f32) -> Self {
        Vec3::lerp(self, target, amount)
    }
}

/// Blend factor for one step of exponential smoothing.
pub fn damp_factor(rate: f32, dt: f32) -> f32 {
    if !rate.is_finite() || !dt.is_finite() || rate <= 0.0 || dt <= 0.0 {
        return 0.0;
    }
    1.0 - (-rate * dt).exp()
}

/// Single-step exponential smoothing of `current` toward `target`.
pub fn damp<T: Lerp>(current: T, target: T, rate: f32, dt: f32) -> T {
    current.lerp(target, damp_factor(rate, dt))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoothed<T: Lerp> {
    value: T,
    rate: f32,
}

impl<T: Lerp> Smoothed<T> {
    pub fn new(value: T, rate: f32) -> Self {
        Self { value, rate }
    }

    pub fn value(&self) -> T {
        self.value
    }

    /// Advance one frame toward `target` and return the new value.
    pub fn step(&mut self, target: T, dt: f32) -> T {
        self.value = damp(self.value, target, self.rate, dt);
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damp_factor_is_bounded() {
        assert_eq!(damp_factor(3.0, 0.0), 0.0);
        assert_eq!(damp_factor(3.0, -1.0), 0.0);
        assert_eq!(damp_factor(0.0, 1.0), 0.0);
        let big = damp_factor(3.0, 1000.0);
        assert!(big <= 1.0 && big > 0.99);
    }

    #[test]
    fn smoothing_approaches_without_overshoot() {
        let mut value = Smoothed::new(0.0_f32, 2.0);
        let mut previous = value.value();
        for _ in 0..240 {
            let next = value.step(1.0, 1.0 / 60.0);
            assert!(next >= previous);
            assert!(next <= 1.0);
            previous = next;
        }
        assert!((1.0 - previous) < 1e-3);
    }

    #[test]
    fn frame_rate_does_not_change_convergence() {
        let mut coarse = Smoothed::new(0.0_f32, 3.0);
        let mut fine = Smoothed::new(0.0_f32, 3.0);
        for _ in 0..30 {
            coarse.step(10.0, 1.0 / 30.0);
        }
        for _ in 0..120 {
            fine.step(10.0, 1.0 / 120.0);
        }
        assert!((coarse.value() - fine.value()).abs() < 1e-3);
    }

    #[test]
    fn vectors_smooth_componentwise() {
        let mut target = Smoothed::new(Vec3::ZERO, 3.0);
        target.step(Vec3::new(0.0, 3.0, 0.0), 0.1);
        let value = target.value();
        assert_eq!(value.x, 0.0);
        assert!(value.y > 0.0 && value.y < 3.0);
    }
}
