//! Core types for long-period ground motion processing
//!
//! Samples are three-component accelerations. By convention the first two
//! components are the horizontal axes (NS, EW) and the third is vertical (UD).
//!
//! ## Units
//!
//! No unit conversion is performed anywhere in the crate. The reference
//! thresholds assume acceleration in gal (cm/s²), which makes velocities and
//! Sva values come out in cm/s:
//!
//! ```text
//!   raw [gal] → offset [gal] → high-pass [gal] → ∫dt → velocity [cm/s]
//!                                     │
//!                                     └→ SDOF bank → Sva [cm/s]
//! ```

/// A three-component vector `[x, y, z]`.
pub type Vec3 = [f64; 3];

/// Number of components in one acceleration sample.
pub const AXES: usize = 3;

/// Result type for LPGM operations
pub type LpgmResult<T> = Result<T, LpgmError>;

/// Errors that can occur while building or driving the pipeline
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LpgmError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl LpgmError {
    /// Whether the caller can keep using the instance after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, LpgmError::InvalidInput(_))
    }
}

/// Helper functions for three-component vectors
pub mod vec3 {
    use super::Vec3;

    /// The zero vector
    pub const ZERO: Vec3 = [0.0; 3];

    /// Component-wise `a - b`
    #[inline]
    pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    /// Component-wise `a + b`
    #[inline]
    pub fn add(a: Vec3, b: Vec3) -> Vec3 {
        [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
    }

    /// `a * k`
    #[inline]
    pub fn scale(a: Vec3, k: f64) -> Vec3 {
        [a[0] * k, a[1] * k, a[2] * k]
    }

    /// True when every component is finite
    #[inline]
    pub fn is_finite(a: &Vec3) -> bool {
        a.iter().all(|v| v.is_finite())
    }

    /// Euclidean norm of the horizontal components only
    #[inline]
    pub fn horizontal_norm(a: Vec3) -> f64 {
        a[0].hypot(a[1])
    }
}

/// Validate a raw sample slice and convert it into a [`Vec3`].
///
/// Rejects slices of the wrong length and any non-finite component.
pub fn sample_from_slice(raw: &[f64]) -> LpgmResult<Vec3> {
    if raw.len() != AXES {
        return Err(LpgmError::InvalidInput(format!(
            "expected {} acceleration components, got {}",
            AXES,
            raw.len()
        )));
    }
    let sample = [raw[0], raw[1], raw[2]];
    if let Some(axis) = sample.iter().position(|v| !v.is_finite()) {
        return Err(LpgmError::InvalidInput(format!(
            "non-finite acceleration on axis {}: {}",
            axis, sample[axis]
        )));
    }
    Ok(sample)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_vec3_ops() {
        let a = [1.0, 2.0, 3.0];
        let b = [0.5, 0.5, 0.5];
        assert_eq!(vec3::sub(a, b), [0.5, 1.5, 2.5]);
        assert_eq!(vec3::add(a, b), [1.5, 2.5, 3.5]);
        assert_eq!(vec3::scale(a, 2.0), [2.0, 4.0, 6.0]);
        assert_relative_eq!(vec3::horizontal_norm([3.0, 4.0, 100.0]), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sample_from_slice() {
        assert_eq!(sample_from_slice(&[1.0, 2.0, 3.0]).unwrap(), [1.0, 2.0, 3.0]);
        assert!(matches!(
            sample_from_slice(&[1.0, 2.0]),
            Err(LpgmError::InvalidInput(_))
        ));
        assert!(matches!(
            sample_from_slice(&[1.0, 2.0, 3.0, 4.0]),
            Err(LpgmError::InvalidInput(_))
        ));
        assert!(sample_from_slice(&[1.0, f64::NAN, 3.0]).is_err());
        assert!(sample_from_slice(&[f64::INFINITY, 0.0, 0.0]).is_err());
        assert!(sample_from_slice(&[0.0, 0.0, f64::NEG_INFINITY]).is_err());
    }

    #[test]
    fn test_error_recoverability() {
        assert!(LpgmError::InvalidInput("x".into()).is_recoverable());
        assert!(!LpgmError::InvalidConfiguration("x".into()).is_recoverable());
        assert_eq!(
            LpgmError::InvalidConfiguration("sample_rate must be positive".into()).to_string(),
            "Invalid configuration: sample_rate must be positive"
        );
    }
}
