//! IIR high-pass section for drift removal
//!
//! A single second-order Butterworth section designed with the bilinear
//! transform. The section is stateless: callers own the delay lines and
//! evaluate the direct-form-I difference equation
//!
//! ```text
//! y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
//! ```
//!
//! which lets a three-axis conditioner run one coefficient set over
//! shift-registered vectors.
//!
//! ## Example
//!
//! ```rust
//! use lpgm_core::filters::Biquad;
//!
//! // 20 s cutoff period at 100 Hz
//! let hp = Biquad::butterworth_highpass(1.0 / 20.0, 100.0).unwrap();
//! assert!(hp.is_stable());
//! assert!(hp.magnitude_response(0.0) < 1e-12);
//! ```

use crate::types::{LpgmError, LpgmResult, Vec3};
use num_complex::Complex64;
use std::f64::consts::PI;

/// A single biquad (second-order section) coefficient set.
///
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    /// Numerator coefficients [b0, b1, b2]
    b: [f64; 3],
    /// Denominator coefficients [a1, a2] (a0 is normalized to 1)
    a: [f64; 2],
}

impl Biquad {
    /// Create a new biquad section with given coefficients.
    ///
    /// # Arguments
    /// * `b` - Numerator coefficients [b0, b1, b2]
    /// * `a` - Denominator coefficients [a1, a2] (a0 assumed to be 1)
    pub fn new(b: [f64; 3], a: [f64; 2]) -> Self {
        Self { b, a }
    }

    /// Create a pass-through (unity gain) biquad.
    pub fn unity() -> Self {
        Self::new([1.0, 0.0, 0.0], [0.0, 0.0])
    }

    /// Design a 2nd-order Butterworth highpass.
    ///
    /// # Arguments
    /// * `cutoff_hz` - Cutoff frequency in Hz (-3 dB point)
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// Fails when the sample rate is not positive or the cutoff is not
    /// strictly between 0 and Nyquist.
    pub fn butterworth_highpass(cutoff_hz: f64, sample_rate: f64) -> LpgmResult<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(LpgmError::InvalidConfiguration(format!(
                "sample rate must be positive, got {}",
                sample_rate
            )));
        }
        if !(cutoff_hz.is_finite() && cutoff_hz > 0.0 && cutoff_hz < sample_rate / 2.0) {
            return Err(LpgmError::InvalidConfiguration(format!(
                "high-pass cutoff {} Hz must lie in (0, {}) Hz",
                cutoff_hz,
                sample_rate / 2.0
            )));
        }

        let wc = prewarp(cutoff_hz, sample_rate);
        let pole = butterworth_pole_pair() * wc;
        let (b, a) = bilinear_2pole_highpass(pole, 2.0 * sample_rate);
        Ok(Self::new(b, a))
    }

    /// Evaluate the difference equation on one scalar channel.
    ///
    /// `x` holds `[x[n], x[n-1], x[n-2]]`, `y` holds `[y[n-1], y[n-2]]`.
    #[inline]
    pub fn difference(&self, x: [f64; 3], y: [f64; 2]) -> f64 {
        self.b[0] * x[0] + self.b[1] * x[1] + self.b[2] * x[2] - self.a[0] * y[0] - self.a[1] * y[1]
    }

    /// Evaluate the difference equation on every axis of a vector signal.
    #[inline]
    pub fn difference_vec3(&self, x: [Vec3; 3], y: [Vec3; 2]) -> Vec3 {
        let mut out = [0.0; 3];
        for (axis, o) in out.iter_mut().enumerate() {
            *o = self.difference(
                [x[0][axis], x[1][axis], x[2][axis]],
                [y[0][axis], y[1][axis]],
            );
        }
        out
    }

    /// Get the numerator coefficients.
    pub fn numerator(&self) -> &[f64; 3] {
        &self.b
    }

    /// Get the denominator coefficients.
    pub fn denominator(&self) -> &[f64; 2] {
        &self.a
    }

    /// Check if this biquad is stable (poles inside unit circle).
    pub fn is_stable(&self) -> bool {
        // For 1 + a1*z^-1 + a2*z^-2: |a2| < 1 and |a1| < 1 + a2
        self.a[1].abs() < 1.0 && self.a[0].abs() < 1.0 + self.a[1]
    }

    /// Complex frequency response H(e^jω) at a normalized frequency
    /// (cycles per sample, 0 to 0.5).
    pub fn frequency_response(&self, normalized_freq: f64) -> Complex64 {
        let omega = 2.0 * PI * normalized_freq;
        let z_inv = Complex64::new(omega.cos(), -omega.sin());
        let z_inv2 = z_inv * z_inv;

        let num = self.b[0] + self.b[1] * z_inv + self.b[2] * z_inv2;
        let den = 1.0 + self.a[0] * z_inv + self.a[1] * z_inv2;
        num / den
    }

    /// Magnitude response (linear) at a normalized frequency.
    pub fn magnitude_response(&self, normalized_freq: f64) -> f64 {
        self.frequency_response(normalized_freq).norm()
    }
}

// ============================================================================
// Design Functions
// ============================================================================

/// Pre-warp frequency for bilinear transform.
fn prewarp(freq_hz: f64, sample_rate: f64) -> f64 {
    2.0 * sample_rate * (PI * freq_hz / sample_rate).tan()
}

/// Upper-half-plane pole of the normalized 2nd-order Butterworth prototype.
fn butterworth_pole_pair() -> Complex64 {
    let theta = 3.0 * PI / 4.0;
    Complex64::new(theta.cos(), theta.sin())
}

/// Bilinear transform of s^2 / ((s - p)(s - p*)) with k = 2*fs.
fn bilinear_2pole_highpass(p: Complex64, k: f64) -> ([f64; 3], [f64; 2]) {
    let p_mag_sq = p.norm_sqr();
    let k2 = k * k;
    let d = k2 - 2.0 * k * p.re + p_mag_sq;

    let b0 = k2 / d;
    let b1 = -2.0 * k2 / d;
    let b2 = k2 / d;

    let a1 = 2.0 * (p_mag_sq - k2) / d;
    let a2 = (k2 + 2.0 * k * p.re + p_mag_sq) / d;

    ([b0, b1, b2], [a1, a2])
}
