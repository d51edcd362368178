//! Math type re-exports and tolerance helpers.

// Re-export glam types used throughout the crate
pub use glam::{Vec2, Vec3, Vec4};

/// Absolute tolerance for position/attribute comparison after a round trip.
///
/// Positions survive the interchange document bit-exactly (f32 in, f32 out),
/// but cross-kernel transfers may re-derive values, so structural equality
/// uses this epsilon rather than bit equality.
pub const POSITION_EPSILON: f32 = 1e-6;

/// Compare two floats within an absolute tolerance.
#[inline]
pub fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

/// Compare two Vec3 values component-wise within an absolute tolerance.
#[inline]
pub fn vec3_approx_eq(a: Vec3, b: Vec3, eps: f32) -> bool {
    approx_eq(a.x, b.x, eps) && approx_eq(a.y, b.y, eps) && approx_eq(a.z, b.z, eps)
}

/// Compare two Vec4 values component-wise within an absolute tolerance.
#[inline]
pub fn vec4_approx_eq(a: Vec4, b: Vec4, eps: f32) -> bool {
    approx_eq(a.x, b.x, eps)
        && approx_eq(a.y, b.y, eps)
        && approx_eq(a.z, b.z, eps)
        && approx_eq(a.w, b.w, eps)
}

/// Compare two position slices element-wise within an absolute tolerance.
pub fn positions_approx_eq(a: &[Vec3], b: &[Vec3], eps: f32) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| vec3_approx_eq(*x, *y, eps))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_eq() {
        assert!(approx_eq(1.0, 1.0 + 1e-7, POSITION_EPSILON));
        assert!(!approx_eq(1.0, 1.0 + 1e-4, POSITION_EPSILON));
    }

    #[test]
    fn test_vec3_approx_eq() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(1.0 + 5e-7, 2.0, 3.0 - 5e-7);
        assert!(vec3_approx_eq(a, b, POSITION_EPSILON));
        assert!(!vec3_approx_eq(a, Vec3::new(1.1, 2.0, 3.0), POSITION_EPSILON));
    }
}
