//! JMA long-period ground motion classification
//!
//! The class is read off the largest Sva seen over the trailing window
//! (30 s by default) using the Japan Meteorological Agency thresholds:
//!
//! | max Sva (cm/s) | class |
//! |---|---|
//! | < 5 | 0 |
//! | < 15 | 1 |
//! | < 50 | 2 |
//! | < 100 | 3 |
//! | ≥ 100 | 4 |

use crate::rolling_max::RollingMaxWindow;
use crate::types::{LpgmError, LpgmResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bounds (exclusive, cm/s) of classes 0 through 3.
pub const CLASS_THRESHOLDS: [f64; 4] = [5.0, 15.0, 50.0, 100.0];

/// Long-period ground motion class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum LpgmClass {
    #[default]
    Class0,
    Class1,
    Class2,
    Class3,
    Class4,
}

impl LpgmClass {
    /// All classes in ascending order.
    pub const ALL: [LpgmClass; 5] = [
        LpgmClass::Class0,
        LpgmClass::Class1,
        LpgmClass::Class2,
        LpgmClass::Class3,
        LpgmClass::Class4,
    ];

    /// Map a rolling maximum Sva (cm/s) to its class.
    ///
    /// Thresholds are checked in ascending order and the first strict
    /// `<` match wins. NaN never satisfies `<` and lands in class 4.
    pub fn from_max_sva(max_sva: f64) -> Self {
        CLASS_THRESHOLDS
            .iter()
            .position(|&limit| max_sva < limit)
            .map(|i| Self::ALL[i])
            .unwrap_or(LpgmClass::Class4)
    }

    /// Numeric class, 0 to 4.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Short JMA description of the expected indoor effect.
    pub fn description(self) -> &'static str {
        match self {
            LpgmClass::Class0 => "no long-period ground motion",
            LpgmClass::Class1 => "shaking felt by most people indoors; hanging objects sway",
            LpgmClass::Class2 => "difficult to walk; furniture on casters may move",
            LpgmClass::Class3 => "difficult to stand; unsecured furniture may move or topple",
            LpgmClass::Class4 => "impossible to stand; unsecured furniture moves and topples",
        }
    }
}

impl From<LpgmClass> for u8 {
    fn from(class: LpgmClass) -> u8 {
        class.as_u8()
    }
}

impl TryFrom<u8> for LpgmClass {
    type Error = LpgmError;

    fn try_from(value: u8) -> LpgmResult<Self> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| LpgmError::InvalidInput(format!("LPGM class must be 0-4, got {}", value)))
    }
}

impl fmt::Display for LpgmClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LPGM {}", self.as_u8())
    }
}

/// Rolling-window classifier over per-tick spectrum maxima.
#[derive(Debug, Clone)]
pub struct Classifier {
    window: RollingMaxWindow,
    class: LpgmClass,
}

impl Classifier {
    /// Create a classifier whose window holds `capacity` ticks of zeros.
    pub fn new(capacity: usize) -> LpgmResult<Self> {
        Ok(Self {
            window: RollingMaxWindow::new(capacity)?,
            class: LpgmClass::Class0,
        })
    }

    /// Feed one tick's spectrum and return the updated class.
    pub fn update(&mut self, spectrum: &[f64]) -> LpgmClass {
        let tick_max = spectrum.iter().copied().fold(0.0_f64, f64::max);
        self.push_max(tick_max)
    }

    /// Feed one tick's spectrum maximum directly.
    pub fn push_max(&mut self, tick_max: f64) -> LpgmClass {
        let rolling = self.window.push(tick_max);
        self.class = LpgmClass::from_max_sva(rolling);
        self.class
    }

    /// Last computed class.
    pub fn class(&self) -> LpgmClass {
        self.class
    }

    /// Maximum over the rolling window.
    pub fn rolling_max(&self) -> f64 {
        self.window.max()
    }

    /// Read-only access to the rolling window.
    pub fn window(&self) -> &RollingMaxWindow {
        &self.window
    }
}
