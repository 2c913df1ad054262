//! SDOF oscillator bank for the absolute velocity response spectrum
//!
//! Each target period owns a damped single-degree-of-freedom oscillator
//! driven by the high-pass filtered horizontal ground acceleration. The
//! per-step update uses the exact solution for acceleration that varies
//! linearly between two samples (Nigam & Jennings, 1969):
//!
//! ```text
//! [x ]        [x ]        [a[n-1]]
//! [x']   = A  [x']    + B [a[n]  ]
//!     n+1          n
//! ```
//!
//! `x`/`x'` are the displacement and velocity of the oscillator relative to
//! the ground. State is kept as a 2×2 matrix whose columns are the two
//! horizontal axes, so both axes advance with one matrix product.
//!
//! The absolute velocity response for a period is the oscillator's
//! relative velocity plus the ground velocity, and the reported Sva is the
//! Euclidean norm over the two horizontal axes.
//!
//! ## Example
//!
//! ```rust
//! use lpgm_core::oscillator::{period_grid, OscillatorBank};
//!
//! let periods = period_grid(1.6, 7.8, 32).unwrap();
//! let mut bank = OscillatorBank::new(&periods, 0.05, 0.01).unwrap();
//!
//! bank.stage([0.0; 3], [1.0, 0.0, 0.0], [0.005, 0.0, 0.0]).unwrap();
//! bank.commit();
//! assert_eq!(bank.spectrum().len(), 32);
//! ```

use crate::types::{LpgmError, LpgmResult, Vec3};
use std::f64::consts::PI;
use std::ops::{Add, Mul};

/// Shortest default target period in seconds.
pub const DEFAULT_PERIOD_MIN_S: f64 = 1.6;
/// Longest default target period in seconds.
pub const DEFAULT_PERIOD_MAX_S: f64 = 7.8;
/// Number of default target periods (0.2 s spacing).
pub const DEFAULT_PERIOD_COUNT: usize = 32;
/// Fraction of critical damping used by the JMA method.
pub const DEFAULT_DAMPING: f64 = 0.05;

/// A 2×2 matrix stored row-major: `m[row][col]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Mat2 {
    pub m: [[f64; 2]; 2],
}

impl Mat2 {
    /// Zero matrix.
    pub const ZERO: Mat2 = Mat2 { m: [[0.0; 2]; 2] };

    /// Identity matrix.
    pub const IDENTITY: Mat2 = Mat2 {
        m: [[1.0, 0.0], [0.0, 1.0]],
    };

    #[inline]
    pub const fn new(m: [[f64; 2]; 2]) -> Self {
        Self { m }
    }

    /// Element at `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.m[row][col]
    }

    /// One row as an array over columns.
    #[inline]
    pub fn row(&self, row: usize) -> [f64; 2] {
        self.m[row]
    }

    pub fn is_finite(&self) -> bool {
        self.m.iter().flatten().all(|v| v.is_finite())
    }

    /// Largest absolute entry.
    pub fn max_abs(&self) -> f64 {
        self.m.iter().flatten().fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }
}

impl Mul for Mat2 {
    type Output = Mat2;

    #[inline]
    fn mul(self, rhs: Mat2) -> Mat2 {
        let a = &self.m;
        let b = &rhs.m;
        Mat2::new([
            [
                a[0][0] * b[0][0] + a[0][1] * b[1][0],
                a[0][0] * b[0][1] + a[0][1] * b[1][1],
            ],
            [
                a[1][0] * b[0][0] + a[1][1] * b[1][0],
                a[1][0] * b[0][1] + a[1][1] * b[1][1],
            ],
        ])
    }
}

impl Add for Mat2 {
    type Output = Mat2;

    #[inline]
    fn add(self, rhs: Mat2) -> Mat2 {
        Mat2::new([
            [self.m[0][0] + rhs.m[0][0], self.m[0][1] + rhs.m[0][1]],
            [self.m[1][0] + rhs.m[1][0], self.m[1][1] + rhs.m[1][1]],
        ])
    }
}

/// Linearly spaced period grid, inclusive of both ends.
///
/// The last point is pinned to `stop` so the grid ends exactly on the
/// configured longest period.
pub fn period_grid(start: f64, stop: f64, count: usize) -> LpgmResult<Vec<f64>> {
    if count == 0 {
        return Err(LpgmError::InvalidConfiguration(
            "period grid must contain at least one period".to_string(),
        ));
    }
    if count == 1 {
        return Ok(vec![start]);
    }
    let step = (stop - start) / (count - 1) as f64;
    let mut grid: Vec<f64> = (0..count).map(|i| start + step * i as f64).collect();
    grid[count - 1] = stop;
    Ok(grid)
}

/// Discrete-time transition pair for one oscillator period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorCoefficients {
    /// Natural period in seconds.
    pub period: f64,
    /// Free-decay transition matrix.
    pub a: Mat2,
    /// Forcing matrix applied to `[a[n-1]; a[n]]`.
    pub b: Mat2,
}

impl OscillatorCoefficients {
    /// Exact piecewise-linear-forcing coefficients (Nigam & Jennings, 1969).
    ///
    /// # Arguments
    /// * `period` - Natural period in seconds (> 0)
    /// * `damping` - Fraction of critical damping, in `[0, 1)`
    /// * `dt` - Sample period in seconds (> 0)
    pub fn nigam_jennings(period: f64, damping: f64, dt: f64) -> LpgmResult<Self> {
        if !(period.is_finite() && period > 0.0) {
            return Err(LpgmError::InvalidConfiguration(format!(
                "oscillator period must be positive, got {}",
                period
            )));
        }
        if !(damping.is_finite() && (0.0..1.0).contains(&damping)) {
            return Err(LpgmError::InvalidConfiguration(format!(
                "damping ratio must lie in [0, 1), got {}",
                damping
            )));
        }
        if !(dt.is_finite() && dt > 0.0) {
            return Err(LpgmError::InvalidConfiguration(format!(
                "sample period must be positive, got {}",
                dt
            )));
        }

        let beta = damping;
        let w = 2.0 * PI / period;
        let root = (1.0 - beta * beta).sqrt();
        let wd = w * root;
        let sw = (wd * dt).sin();
        let cw = (wd * dt).cos();
        let e = (-beta * w * dt).exp();

        let w2 = w * w;
        let w3 = w2 * w;

        let a = Mat2::new([
            [e * (beta / root * sw + cw), sw * e / wd],
            [-sw * e * w / root, e * (cw - beta / root * sw)],
        ]);

        let k1 = (2.0 * beta * beta - 1.0) / (w2 * dt);
        let k2 = 2.0 * beta / (w3 * dt);
        let s_term = sw / wd;
        let c_term = cw - beta * sw / root;
        let d_term = wd * sw + beta * w * cw;

        let b = Mat2::new([
            [
                e * ((k1 + beta / w) * s_term + (k2 + 1.0 / w2) * cw) - k2,
                -e * (k1 * s_term + k2 * cw) + k2 - 1.0 / w2,
            ],
            [
                e * ((k1 + beta / w) * c_term - (k2 + 1.0 / w2) * d_term) + 1.0 / (w2 * dt),
                -e * (k1 * c_term - k2 * d_term) - 1.0 / (w2 * dt),
            ],
        ]);

        Ok(Self { period, a, b })
    }

    /// Advance a state by one sample given the stacked forcing matrix.
    #[inline]
    pub fn step(&self, state: Mat2, forcing: Mat2) -> Mat2 {
        self.a * state + self.b * forcing
    }
}

/// Bank of SDOF oscillators, one per target period.
///
/// Updates are two-phase: [`stage`](Self::stage) computes the next state
/// and spectrum into scratch buffers, [`commit`](Self::commit) publishes
/// them. A staged step that is never committed leaves the bank unchanged.
#[derive(Debug, Clone)]
pub struct OscillatorBank {
    coefficients: Vec<OscillatorCoefficients>,
    state: Vec<Mat2>,
    sva: Vec<f64>,
    pending_state: Vec<Mat2>,
    pending_sva: Vec<f64>,
}

impl OscillatorBank {
    /// Precompute coefficients for every period. All oscillators start at rest.
    pub fn new(periods: &[f64], damping: f64, dt: f64) -> LpgmResult<Self> {
        if periods.is_empty() {
            return Err(LpgmError::InvalidConfiguration(
                "oscillator bank needs at least one period".to_string(),
            ));
        }
        let coefficients = periods
            .iter()
            .map(|&p| OscillatorCoefficients::nigam_jennings(p, damping, dt))
            .collect::<LpgmResult<Vec<_>>>()?;

        let n = coefficients.len();
        Ok(Self {
            coefficients,
            state: vec![Mat2::ZERO; n],
            sva: vec![0.0; n],
            pending_state: vec![Mat2::ZERO; n],
            pending_sva: vec![0.0; n],
        })
    }

    /// Compute the next state from the previous and current filtered
    /// accelerations and the current ground velocity.
    ///
    /// Only the horizontal components are used. Fails without touching the
    /// published state if any result is non-finite.
    pub fn stage(&mut self, acc_prev: Vec3, acc_curr: Vec3, velocity: Vec3) -> LpgmResult<&[f64]> {
        let forcing = Mat2::new([[acc_prev[0], acc_prev[1]], [acc_curr[0], acc_curr[1]]]);

        for (j, coeffs) in self.coefficients.iter().enumerate() {
            let next = coeffs.step(self.state[j], forcing);
            let rel_vel = next.row(1);
            let sva = (rel_vel[0] + velocity[0]).hypot(rel_vel[1] + velocity[1]);
            if !(next.is_finite() && sva.is_finite()) {
                return Err(LpgmError::InvalidInput(format!(
                    "oscillator response at period {} s is not finite",
                    coeffs.period
                )));
            }
            self.pending_state[j] = next;
            self.pending_sva[j] = sva;
        }
        Ok(&self.pending_sva)
    }

    /// Publish the most recently staged step.
    pub fn commit(&mut self) {
        std::mem::swap(&mut self.state, &mut self.pending_state);
        std::mem::swap(&mut self.sva, &mut self.pending_sva);
    }

    /// Current Sva per period, in period order.
    pub fn spectrum(&self) -> &[f64] {
        &self.sva
    }

    /// Per-period oscillator state (rows: displacement, velocity; columns: axes).
    pub fn states(&self) -> &[Mat2] {
        &self.state
    }

    /// Configured periods in seconds.
    pub fn periods(&self) -> Vec<f64> {
        self.coefficients.iter().map(|c| c.period).collect()
    }

    /// Number of oscillators.
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }
}
