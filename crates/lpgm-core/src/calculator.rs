//! Per-sample LPGM calculator
//!
//! [`LpgmCalculator`] chains the conditioner, the oscillator bank and the
//! classifier and owns all of their state. Each call to
//! [`update`](LpgmCalculator::update) runs one tick:
//!
//! ```text
//! raw ─▶ validate ─▶ conditioner ─▶ oscillator bank ─▶ classifier ─▶ class
//!           │             (staged)        (staged)           │
//!           └──── reject: nothing changes ◀── non-finite ────┘
//! ```
//!
//! The instance has two states: uninitialized until the first accepted
//! sample is captured as the reference, running afterwards. A rejected
//! sample leaves every published value exactly as it was, including the
//! uninitialized state.
//!
//! The calculator has no internal locking. Feed it from a single owner.
//!
//! ## Example
//!
//! ```rust
//! use lpgm_core::{LpgmCalculator, LpgmClass};
//!
//! let mut calc = LpgmCalculator::new(100.0).unwrap();
//! // Sensor at rest, 1 g on the vertical axis (gal)
//! for _ in 0..100 {
//!     let class = calc.update(&[0.3, -0.2, 980.7]).unwrap();
//!     assert_eq!(class, LpgmClass::Class0);
//! }
//! assert!(calc.update(&[f64::NAN, 0.0, 0.0]).is_err());
//! assert_eq!(calc.spectrum().len(), 32);
//! ```

use crate::classifier::{Classifier, LpgmClass};
use crate::conditioner::SignalConditioner;
use crate::config::LpgmConfig;
use crate::filters::Biquad;
use crate::oscillator::OscillatorBank;
use crate::types::{sample_from_slice, LpgmError, LpgmResult, Vec3};
use serde::Serialize;

/// Everything the calculator publishes after a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LpgmReport {
    /// Ticks accepted so far
    pub samples: u64,
    /// Current LPGM class
    pub class: LpgmClass,
    /// Maximum Sva over the rolling window (cm/s)
    pub max_sva_window: f64,
    /// Maximum Sva of the current tick (cm/s)
    pub max_sva: f64,
    /// Sva per period (cm/s), ascending period order
    pub spectrum: Vec<f64>,
    /// High-pass filtered acceleration
    pub filtered_acceleration: Vec3,
    /// Ground velocity
    pub velocity: Vec3,
}

/// Real-time absolute velocity response spectrum and LPGM classifier.
#[derive(Debug, Clone)]
pub struct LpgmCalculator {
    config: LpgmConfig,
    conditioner: SignalConditioner,
    bank: OscillatorBank,
    classifier: Classifier,
    samples: u64,
}

impl LpgmCalculator {
    /// Create a calculator with the JMA defaults at `sample_rate` Hz.
    ///
    /// Fails with [`LpgmError::InvalidConfiguration`] if the sample rate is
    /// not a positive finite number.
    pub fn new(sample_rate: f64) -> LpgmResult<Self> {
        Self::with_config(LpgmConfig::with_sample_rate(sample_rate))
    }

    /// Create a calculator from a full configuration.
    pub fn with_config(config: LpgmConfig) -> LpgmResult<Self> {
        config.validate()?;

        let periods = config.periods()?;
        let dt = config.sample_period();
        let highpass = Biquad::butterworth_highpass(config.cutoff_hz(), config.sample_rate)?;
        let bank = OscillatorBank::new(&periods, config.spectrum.damping, dt)?;
        let classifier = Classifier::new(config.window_capacity())?;

        tracing::info!(
            sample_rate = config.sample_rate,
            damping = config.spectrum.damping,
            periods = periods.len(),
            window = config.window_capacity(),
            "LPGM calculator ready"
        );

        Ok(Self {
            conditioner: SignalConditioner::new(highpass, dt),
            bank,
            classifier,
            samples: 0,
            config,
        })
    }

    /// Process one raw acceleration sample `[x, y, z]` and return the class.
    ///
    /// The first two components must be horizontal. Fails with
    /// [`LpgmError::InvalidInput`] on a wrong component count, a non-finite
    /// component, or a sample that would drive the recursion non-finite; in
    /// every failure case the calculator state is left untouched.
    pub fn update(&mut self, raw: &[f64]) -> LpgmResult<LpgmClass> {
        let sample = sample_from_slice(raw).map_err(|e| self.reject(e))?;
        self.update_vec3(sample)
    }

    /// Same as [`update`](Self::update) for an already-shaped sample.
    pub fn update_vec3(&mut self, raw: Vec3) -> LpgmResult<LpgmClass> {
        if raw.iter().any(|v| !v.is_finite()) {
            return Err(self.reject(LpgmError::InvalidInput(format!(
                "non-finite acceleration sample {:?}",
                raw
            ))));
        }

        let next = self.conditioner.advanced(raw);
        if !next.is_finite() {
            return Err(self.reject(LpgmError::InvalidInput(
                "sample drives the conditioner out of range".to_string(),
            )));
        }

        let staged = self
            .bank
            .stage(
                next.previous_filtered_acceleration(),
                next.filtered_acceleration(),
                next.velocity(),
            )
            .map(|_| ());
        if let Err(e) = staged {
            return Err(self.reject(e));
        }

        // Commit point: nothing below can fail.
        if !self.conditioner.is_initialized() {
            tracing::debug!(reference = ?raw, "Captured reference acceleration");
        }
        self.conditioner = next;
        self.bank.commit();
        self.samples += 1;

        let previous = self.classifier.class();
        let class = self.classifier.update(self.bank.spectrum());
        if class != previous {
            tracing::info!(
                from = previous.as_u8(),
                to = class.as_u8(),
                max_sva_window = self.classifier.rolling_max(),
                "LPGM class changed"
            );
        }
        Ok(class)
    }

    fn reject(&self, err: LpgmError) -> LpgmError {
        tracing::warn!(samples = self.samples, "Rejected sample: {}", err);
        err
    }

    /// Last computed LPGM class.
    pub fn lpgm_class(&self) -> LpgmClass {
        self.classifier.class()
    }

    /// Current Sva per period (cm/s), ascending period order.
    pub fn spectrum(&self) -> &[f64] {
        self.bank.spectrum()
    }

    /// Latest high-pass filtered acceleration.
    pub fn filtered_acceleration(&self) -> Vec3 {
        self.conditioner.filtered_acceleration()
    }

    /// Running velocity estimate.
    pub fn velocity(&self) -> Vec3 {
        self.conditioner.velocity()
    }

    /// Maximum Sva over the rolling window (cm/s).
    pub fn rolling_max_sva(&self) -> f64 {
        self.classifier.rolling_max()
    }

    /// Maximum Sva of the latest tick (cm/s).
    pub fn current_max_sva(&self) -> f64 {
        self.classifier.window().latest()
    }

    /// Rolling window of per-tick maxima, oldest first.
    pub fn rolling_window(&self) -> impl Iterator<Item = f64> + '_ {
        self.classifier.window().iter()
    }

    /// Copy of the rolling window, oldest first.
    pub fn rolling_window_snapshot(&self) -> Vec<f64> {
        self.classifier.window().snapshot()
    }

    /// Latest offset-removed acceleration.
    pub fn offset_acceleration(&self) -> Vec3 {
        self.conditioner.offset_acceleration()
    }

    /// The first accepted sample, once captured.
    pub fn reference_acceleration(&self) -> Option<Vec3> {
        self.conditioner.reference()
    }

    /// Whether the reference sample has been captured.
    pub fn is_initialized(&self) -> bool {
        self.conditioner.is_initialized()
    }

    /// Target periods in seconds, in spectrum order.
    pub fn periods(&self) -> Vec<f64> {
        self.bank.periods()
    }

    pub fn sample_rate(&self) -> f64 {
        self.config.sample_rate
    }

    pub fn damping(&self) -> f64 {
        self.config.spectrum.damping
    }

    /// Number of accepted samples.
    pub fn samples_processed(&self) -> u64 {
        self.samples
    }

    /// Configuration the calculator was built from.
    pub fn config(&self) -> &LpgmConfig {
        &self.config
    }

    /// Snapshot of every published output.
    pub fn report(&self) -> LpgmReport {
        LpgmReport {
            samples: self.samples,
            class: self.lpgm_class(),
            max_sva_window: self.rolling_max_sva(),
            max_sva: self.current_max_sva(),
            spectrum: self.spectrum().to_vec(),
            filtered_acceleration: self.filtered_acceleration(),
            velocity: self.velocity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f64::consts::PI;

    fn noisy_record(n: usize, seed: u64) -> Vec<Vec3> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|i| {
                let t = i as f64 * 0.01;
                let swell = 40.0 * (2.0 * PI * t / 4.0).sin() * (-((t - 20.0) / 8.0).powi(2)).exp();
                [
                    3.0 + swell + rng.gen_range(-1.0..1.0),
                    -1.0 + 0.5 * swell + rng.gen_range(-1.0..1.0),
                    980.0 + rng.gen_range(-1.0..1.0),
                ]
            })
            .collect()
    }

    #[test]
    fn test_construction_errors() {
        for rate in [0.0, -100.0, f64::NAN, f64::INFINITY, 1e18, f64::MAX] {
            assert!(matches!(
                LpgmCalculator::new(rate),
                Err(LpgmError::InvalidConfiguration(_))
            ));
        }

        let mut config = LpgmConfig::default();
        config.spectrum.periods = Some(vec![1.6, 0.0, 3.0]);
        assert!(matches!(
            LpgmCalculator::with_config(config),
            Err(LpgmError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_initial_state() {
        let calc = LpgmCalculator::new(100.0).unwrap();
        assert!(!calc.is_initialized());
        assert_eq!(calc.lpgm_class(), LpgmClass::Class0);
        assert_eq!(calc.spectrum(), &[0.0; 32][..]);
        assert_eq!(calc.periods().len(), 32);
        assert_eq!(calc.rolling_window_snapshot().len(), 3000);
        assert!(calc.rolling_window().all(|v| v == 0.0));
        assert_eq!(calc.rolling_max_sva(), 0.0);
        assert_eq!(calc.velocity(), [0.0; 3]);
        assert_eq!(calc.filtered_acceleration(), [0.0; 3]);
        assert_eq!(calc.damping(), 0.05);
        assert_eq!(calc.sample_rate(), 100.0);
    }

    #[test]
    fn test_determinism() {
        let record = noisy_record(4000, 11);
        let mut a = LpgmCalculator::new(100.0).unwrap();
        let mut b = LpgmCalculator::new(100.0).unwrap();
        for sample in &record {
            let ca = a.update(sample).unwrap();
            let cb = b.update(sample).unwrap();
            assert_eq!(ca, cb);
            assert_eq!(a.report(), b.report());
        }
        assert_eq!(a.rolling_window_snapshot(), b.rolling_window_snapshot());
    }

    #[test]
    fn test_offset_removal_idempotence() {
        let mut calc = LpgmCalculator::new(100.0).unwrap();
        let r0 = [4.2, -7.5, 979.9];
        for _ in 0..1000 {
            assert_eq!(calc.update(&r0).unwrap(), LpgmClass::Class0);
            assert_eq!(calc.offset_acceleration(), [0.0; 3]);
            assert_eq!(calc.filtered_acceleration(), [0.0; 3]);
            assert_eq!(calc.velocity(), [0.0; 3]);
            assert!(calc.spectrum().iter().all(|&s| s == 0.0));
        }
        assert_eq!(calc.reference_acceleration(), Some(r0));
    }

    #[test]
    fn test_zero_input_stability() {
        let fs = 20.0;
        let mut calc = LpgmCalculator::new(fs).unwrap();
        calc.update(&[0.0, 0.0, 0.0]).unwrap();

        // 2 s burst of 4 s shaking, then silence
        let mut peak = 0.0_f64;
        for i in 0..40 {
            let t = i as f64 / fs;
            let a = 20.0 * (2.0 * PI * t / 4.0).sin();
            calc.update(&[a, -a, 0.0]).unwrap();
            peak = peak.max(calc.current_max_sva());
        }
        for _ in 0..(400.0 * fs) as usize {
            calc.update(&[0.0, 0.0, 0.0]).unwrap();
            peak = peak.max(calc.current_max_sva());
            assert!(calc.current_max_sva().is_finite());
        }
        assert!(peak > 0.0);
        assert!(
            calc.current_max_sva() < peak * 1e-3,
            "response did not decay: {} vs peak {}",
            calc.current_max_sva(),
            peak
        );
        assert_eq!(calc.lpgm_class(), LpgmClass::Class0);
        assert!(calc.rolling_max_sva() < peak * 1e-3);
    }

    #[test]
    fn test_rolling_window_tracks_tick_maxima() {
        // 2 Hz keeps the window at 60 ticks
        let fs = 2.0;
        let mut calc = LpgmCalculator::new(fs).unwrap();
        let capacity = 60;
        assert_eq!(calc.rolling_window_snapshot().len(), capacity);

        let mut rng = StdRng::seed_from_u64(3);
        let mut maxima = vec![0.0; capacity];
        for _ in 0..(3 * capacity) {
            let sample = [rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0), 980.0];
            calc.update(&sample).unwrap();

            let tick_max = calc.spectrum().iter().copied().fold(0.0_f64, f64::max);
            assert_eq!(calc.current_max_sva(), tick_max);
            maxima.push(tick_max);

            let tail = &maxima[maxima.len() - capacity..];
            let snapshot = calc.rolling_window_snapshot();
            assert_eq!(snapshot, tail);
            let brute = tail.iter().copied().fold(f64::MIN, f64::max);
            assert_eq!(calc.rolling_max_sva(), brute);
            assert_eq!(calc.lpgm_class(), LpgmClass::from_max_sva(brute));
        }
    }

    #[test]
    fn test_threshold_boundary_through_window() {
        let mut calc = LpgmCalculator::new(10.0).unwrap();
        assert_eq!(calc.classifier.push_max(14.999), LpgmClass::Class1);
        assert_eq!(calc.lpgm_class(), LpgmClass::Class1);
        assert_eq!(calc.classifier.push_max(15.0), LpgmClass::Class2);
        assert_eq!(calc.lpgm_class(), LpgmClass::Class2);
        assert_eq!(calc.rolling_max_sva(), 15.0);
    }

    #[test]
    fn test_invalid_input_leaves_state_unchanged() {
        let mut calc = LpgmCalculator::new(100.0).unwrap();

        // Rejected before the reference is captured
        assert!(calc.update(&[f64::NAN, 0.0, 0.0]).is_err());
        assert!(!calc.is_initialized());
        assert_eq!(calc.samples_processed(), 0);

        for sample in noisy_record(500, 5) {
            calc.update(&sample).unwrap();
        }
        let before = calc.report();
        let window_before = calc.rolling_window_snapshot();
        let reference_before = calc.reference_acceleration();

        let bad: [&[f64]; 6] = [
            &[f64::NAN, 0.0, 980.0],
            &[0.0, f64::INFINITY, 980.0],
            &[0.0, 0.0, f64::NEG_INFINITY],
            &[0.0, 0.0],
            &[0.0, 0.0, 0.0, 0.0],
            &[],
        ];
        for sample in bad {
            let err = calc.update(sample).unwrap_err();
            assert!(matches!(err, LpgmError::InvalidInput(_)));
            assert!(err.is_recoverable());
            assert_eq!(calc.report(), before);
            assert_eq!(calc.rolling_window_snapshot(), window_before);
            assert_eq!(calc.reference_acceleration(), reference_before);
        }

        // Carries on normally afterwards
        let mut resumed = calc.clone();
        assert!(resumed.update(&[3.0, -1.0, 980.0]).is_ok());
        assert_eq!(resumed.samples_processed(), before.samples + 1);

        // Finite samples whose difference overflows the high-pass recursion
        calc.update(&[1e308, 0.0, 980.0]).unwrap();
        let before_overflow = calc.report();
        let err = calc.update(&[-1e308, 0.0, 980.0]).unwrap_err();
        assert!(matches!(err, LpgmError::InvalidInput(_)));
        assert_eq!(calc.report(), before_overflow);
    }

    /// Exact response of the 5.0 s oscillator to a one-sample pulse,
    /// integrated independently with fine-step RK4.
    #[test]
    fn test_impulse_response_matches_independent_integration() {
        let fs = 100.0;
        let dt = 1.0 / fs;
        let beta = 0.05;
        let mut calc = LpgmCalculator::new(fs).unwrap();
        let idx = calc
            .periods()
            .iter()
            .position(|p| (p - 5.0).abs() < 1e-9)
            .unwrap();

        // Tick 0 is the zero reference, the pulse is the first offset sample
        let ticks = 3000;
        let mut raw = vec![[0.0; 3]; ticks];
        raw[1] = [1.0, 0.0, 0.0];

        let mut sva = Vec::with_capacity(ticks);
        for sample in &raw {
            calc.update(sample).unwrap();
            sva.push(calc.spectrum()[idx]);
        }

        // Reference: same high-pass, trapezoid velocity, RK4 oscillator
        let hp = Biquad::butterworth_highpass(0.05, fs).unwrap();
        let w = 2.0 * PI / 5.0;
        let substeps = 50;
        let h = dt / substeps as f64;
        let (mut x, mut v) = (0.0_f64, 0.0_f64);
        let mut xs = [0.0; 3];
        let mut ys = [0.0; 2];
        let mut vel = 0.0;
        let mut expected = Vec::with_capacity(ticks);
        for sample in &raw {
            xs = [sample[0], xs[0], xs[1]];
            let acc = hp.difference(xs, ys);
            let acc_prev = ys[0];
            ys = [acc, ys[0]];
            vel += (acc_prev + acc) * dt / 2.0;

            let ground = |s: f64| acc_prev + (acc - acc_prev) * s / dt;
            let f = |s: f64, x: f64, v: f64| (v, -2.0 * beta * w * v - w * w * x - ground(s));
            for k in 0..substeps {
                let s = k as f64 * h;
                let (k1x, k1v) = f(s, x, v);
                let (k2x, k2v) = f(s + h / 2.0, x + h / 2.0 * k1x, v + h / 2.0 * k1v);
                let (k3x, k3v) = f(s + h / 2.0, x + h / 2.0 * k2x, v + h / 2.0 * k2v);
                let (k4x, k4v) = f(s + h, x + h * k3x, v + h * k3v);
                x += h / 6.0 * (k1x + 2.0 * k2x + 2.0 * k3x + k4x);
                v += h / 6.0 * (k1v + 2.0 * k2v + 2.0 * k3v + k4v);
            }
            expected.push((v + vel).abs());
        }

        let peak = expected.iter().copied().fold(0.0_f64, f64::max);
        assert!(peak > 0.0);
        for (got, want) in sva.iter().zip(&expected) {
            assert_relative_eq!(*got, *want, epsilon = 1e-6 * peak);
        }

        // Bounded peak early, decaying tail
        let peak_tick = sva
            .iter()
            .enumerate()
            .fold((0, 0.0_f64), |acc, (i, &s)| if s > acc.1 { (i, s) } else { acc })
            .0;
        assert!(peak_tick < 1000, "peak at tick {}", peak_tick);
        let tail = sva[ticks - 500..].iter().copied().fold(0.0_f64, f64::max);
        assert!(tail < peak);
    }

    #[test]
    fn test_report_serializes() {
        let mut calc = LpgmCalculator::new(50.0).unwrap();
        for sample in noisy_record(200, 9) {
            calc.update(&sample).unwrap();
        }
        let report = calc.report();
        assert_eq!(report.samples, 200);
        assert_eq!(report.spectrum.len(), 32);
        assert_eq!(report.max_sva, calc.current_max_sva());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["class"], serde_json::json!(report.class.as_u8()));
        assert_eq!(json["spectrum"].as_array().unwrap().len(), 32);
    }

    #[test]
    fn test_custom_config() {
        let mut config = LpgmConfig::with_sample_rate(50.0);
        config.spectrum.periods = Some(vec![2.0, 6.0]);
        config.window.duration_s = 5.0;
        let mut calc = LpgmCalculator::with_config(config).unwrap();
        assert_eq!(calc.periods(), &[2.0, 6.0]);
        assert_eq!(calc.rolling_window_snapshot().len(), 250);
        calc.update(&[0.0, 0.0, 0.0]).unwrap();
        calc.update(&[1.0, 1.0, 0.0]).unwrap();
        assert_eq!(calc.spectrum().len(), 2);
    }
}
