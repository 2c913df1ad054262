//! # LPGM Core Library
//!
//! Real-time computation of the Absolute Velocity Response Spectrum (Sva)
//! and the Japan Meteorological Agency Long-Period Ground Motion (LPGM)
//! class from a stream of raw three-axis acceleration.
//!
//! ## Overview
//!
//! Every sample runs the same fixed chain:
//!
//! - **Conditioning**: the first sample is captured as the static offset
//!   (gravity and sensor bias) and subtracted, a 2nd-order Butterworth
//!   high-pass (20 s cutoff) removes drift, and the filtered acceleration is
//!   integrated into ground velocity with the trapezoidal rule.
//! - **Oscillator bank**: 32 damped SDOF oscillators (h = 5 %, periods
//!   1.6 s to 7.8 s in 0.2 s steps) advance with the exact Nigam–Jennings
//!   recursion. Sva per period is the norm of the two horizontal absolute
//!   velocities.
//! - **Classification**: the largest Sva of each tick enters a 30 s rolling
//!   window whose maximum is mapped to class 0 to 4.
//!
//! ## Signal Flow
//!
//! ```text
//! raw [gal] → −reference → HPF → ∫ → velocity ─┐
//!                            │                 ▼
//!                            └──────▶ SDOF bank (32) → Sva [cm/s]
//!                                                        │ max
//!                                                        ▼
//!                                        30 s rolling max → LPGM 0..4
//! ```
//!
//! ## Requirements on the input
//!
//! - The sample rate must be constant.
//! - The first two axes must be horizontal and the sensor must sit on the
//!   ground floor or a rigid, level surface tied to the ground.
//! - Acceleration must be unfiltered (no gravity compensation) and in gal
//!   for the class thresholds to apply.
//!
//! ## Example
//!
//! ```rust
//! use lpgm_core::{LpgmCalculator, LpgmClass};
//!
//! let mut calc = LpgmCalculator::new(100.0).unwrap();
//! let class = calc.update(&[1.2, -0.4, 980.1]).unwrap();
//! assert_eq!(class, LpgmClass::Class0);
//!
//! let sva = calc.spectrum();           // 32 values, cm/s
//! let peak = calc.rolling_max_sva();   // 30 s maximum, cm/s
//! assert_eq!(sva.len(), 32);
//! assert_eq!(peak, 0.0);
//! ```

pub mod calculator;
pub mod classifier;
pub mod conditioner;
pub mod config;
pub mod filters;
pub mod observe;
pub mod oscillator;
pub mod rolling_max;
pub mod types;

pub use calculator::{LpgmCalculator, LpgmReport};
pub use classifier::{Classifier, LpgmClass, CLASS_THRESHOLDS};
pub use config::{ConfigError, LpgmConfig};
pub use oscillator::{period_grid, Mat2, OscillatorBank, OscillatorCoefficients};
pub use rolling_max::RollingMaxWindow;
pub use types::{LpgmError, LpgmResult, Vec3};
