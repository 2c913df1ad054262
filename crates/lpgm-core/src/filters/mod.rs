//! Digital Filters for Signal Conditioning
//!
//! The conditioner needs exactly one filter: a causal 2nd-order Butterworth
//! high-pass that strips the slow drift left after offset removal, so that
//! integrating acceleration into velocity does not run away.
//!
//! ```text
//! raw - reference → [HPF, 20 s cutoff] → trapezoidal ∫ → velocity
//! ```

pub mod iir;

pub use iir::Biquad;
