//! Signal conditioning: offset removal, high-pass filtering, integration
//!
//! The conditioner turns raw, gravity-uncompensated acceleration into the
//! filtered acceleration and ground velocity consumed by the oscillator
//! bank.
//!
//! 1. The first sample ever seen is captured as the reference and
//!    subtracted from every sample, including itself. The reference is
//!    never refreshed, so a drifting static bias is left to the high-pass.
//! 2. The offset-removed sample enters a three-tap shift register and the
//!    high-pass difference equation runs over it and the two-tap output
//!    register.
//! 3. Velocity accumulates the trapezoidal integral of the filtered
//!    acceleration. It is never reset.
//!
//! The type is `Copy`, which lets the caller compute the next state with
//! [`SignalConditioner::advanced`] and commit it only once the whole tick
//! has succeeded.

use crate::filters::Biquad;
use crate::types::{vec3, Vec3};

/// Per-tick state of the conditioning chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalConditioner {
    highpass: Biquad,
    dt: f64,
    /// First raw sample, `None` until the first update.
    reference: Option<Vec3>,
    /// `[x[n], x[n-1], x[n-2]]` offset-removed acceleration.
    offset: [Vec3; 3],
    /// `[y[n], y[n-1]]` filtered acceleration.
    filtered: [Vec3; 2],
    velocity: Vec3,
}

impl SignalConditioner {
    /// Create a conditioner with all registers zeroed.
    pub fn new(highpass: Biquad, dt: f64) -> Self {
        Self {
            highpass,
            dt,
            reference: None,
            offset: [vec3::ZERO; 3],
            filtered: [vec3::ZERO; 2],
            velocity: vec3::ZERO,
        }
    }

    /// Return the state after consuming one raw sample, leaving `self` as is.
    ///
    /// The sample is assumed to be finite; validation happens upstream.
    pub fn advanced(&self, raw: Vec3) -> Self {
        let mut next = *self;
        next.process(raw);
        next
    }

    /// Consume one raw sample in place.
    pub fn process(&mut self, raw: Vec3) {
        let reference = *self.reference.get_or_insert(raw);

        self.offset = [vec3::sub(raw, reference), self.offset[0], self.offset[1]];

        let filtered = self.highpass.difference_vec3(self.offset, self.filtered);
        self.filtered = [filtered, self.filtered[0]];

        let increment = vec3::scale(vec3::add(self.filtered[1], self.filtered[0]), self.dt / 2.0);
        self.velocity = vec3::add(self.velocity, increment);
    }

    /// Whether the reference sample has been captured.
    pub fn is_initialized(&self) -> bool {
        self.reference.is_some()
    }

    /// The captured reference sample.
    pub fn reference(&self) -> Option<Vec3> {
        self.reference
    }

    /// Latest offset-removed acceleration.
    pub fn offset_acceleration(&self) -> Vec3 {
        self.offset[0]
    }

    /// Latest high-pass filtered acceleration.
    pub fn filtered_acceleration(&self) -> Vec3 {
        self.filtered[0]
    }

    /// Filtered acceleration from the previous tick.
    pub fn previous_filtered_acceleration(&self) -> Vec3 {
        self.filtered[1]
    }

    /// Running velocity estimate.
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// True when every register holds finite values.
    pub fn is_finite(&self) -> bool {
        self.offset.iter().all(vec3::is_finite)
            && self.filtered.iter().all(vec3::is_finite)
            && vec3::is_finite(&self.velocity)
    }
}
