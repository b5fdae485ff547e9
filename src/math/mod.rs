//! Math utilities and types for 3D graphics and game logic.
//!
//! This module provides matrix and vector types and operations, as well as
//! helper functions for angle conversions and frame-rate independent easing.
//! All types are designed to be compatible with GPU memory layouts (e.g., for
//! use with WGPU/WGSL).
//!
//! # Module Organization
//!
//! - [`vec`] module contains all vector operations
//! - [`mat`] module contains all matrix operations
//! - Utility functions like angle conversions are provided at root level

pub mod mat;
pub mod vec;

/// Converts degrees to radians.
///
/// This handles angle wrapping by first normalizing the input to the range (-360, 360).
///
/// # Arguments
///
/// * `degrees` - The angle in degrees (can be any finite value)
///
/// # Returns
///
/// The angle in radians in range (-2π, 2π)
pub fn deg_to_rad(degrees: f32) -> f32 {
    (degrees % 360.0) * (std::f32::consts::PI / 180.0)
}

/// Exponential-decay interpolation of `current` towards `target`.
///
/// Produces `target - (target - current) * exp(-rate * delta)`, so the result
/// depends on elapsed time rather than on how many frames it was split into.
///
/// # Arguments
///
/// * `current` - The value this frame starts from
/// * `target` - The value being approached
/// * `rate` - Decay rate per second; larger values converge faster
/// * `delta` - Elapsed time in seconds
pub fn damp(current: f32, target: f32, rate: f32, delta: f32) -> f32 {
    target - (target - current) * (-rate * delta).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_deg_to_rad() {
        assert_relative_eq!(deg_to_rad(180.0), std::f32::consts::PI);
        assert_relative_eq!(deg_to_rad(75.0), 1.308_997, epsilon = 1e-6);
    }

    /// Two half steps land where one full step does.
    #[test]
    fn test_damp_is_frame_rate_independent() {
        let one = damp(0.0, 3.1, 6.0, 0.1);
        let two = damp(damp(0.0, 3.1, 6.0, 0.05), 3.1, 6.0, 0.05);
        assert_relative_eq!(one, two, epsilon = 1e-5);
    }

    #[test]
    fn test_damp_never_overshoots() {
        let mut y = 1.5;
        for _ in 0..500 {
            let next = damp(y, 3.1, 6.0, 0.5);
            assert!(next >= y && next <= 3.1);
            y = next;
        }
    }
}
