//! Rolling Max: fixed-capacity sliding window maximum
//!
//! Holds the last `capacity` values in a pre-allocated ring and tracks their
//! maximum with a monotonic deque, so each push is O(1) amortized and the
//! maximum query is O(1). The window starts full of zeros: before
//! `capacity` values have been pushed, the untouched slots still count.
//!
//! ## Example
//!
//! ```rust
//! use lpgm_core::rolling_max::RollingMaxWindow;
//!
//! let mut w = RollingMaxWindow::new(3).unwrap();
//! w.push(4.0);
//! w.push(1.0);
//! assert_eq!(w.max(), 4.0);
//! w.push(2.0);
//! w.push(3.0); // evicts 4.0
//! assert_eq!(w.max(), 3.0);
//! assert_eq!(w.snapshot(), vec![1.0, 2.0, 3.0]);
//! ```

use crate::types::{LpgmError, LpgmResult};
use std::collections::VecDeque;

/// Sliding window maximum over a zero-initialized ring buffer.
#[derive(Debug, Clone)]
pub struct RollingMaxWindow {
    /// Ring storage; `buffer[head]` is the oldest value.
    buffer: Vec<f64>,
    head: usize,
    /// Monotonic deque: (sequence, value) pairs in decreasing value order.
    deque: VecDeque<(u64, f64)>,
    /// Sequence number of the next value to be pushed.
    seq: u64,
}

impl RollingMaxWindow {
    /// Create a window of `capacity` zeros.
    pub fn new(capacity: usize) -> LpgmResult<Self> {
        if capacity == 0 {
            return Err(LpgmError::InvalidConfiguration(
                "rolling window capacity must be at least one sample".to_string(),
            ));
        }
        let mut deque = VecDeque::with_capacity(capacity);
        // All prefilled zeros are equal; the newest one dominates the rest.
        deque.push_back((capacity as u64 - 1, 0.0));
        Ok(Self {
            buffer: vec![0.0; capacity],
            head: 0,
            deque,
            seq: capacity as u64,
        })
    }

    /// Push a value, evicting the oldest. Returns the new window maximum.
    #[inline]
    pub fn push(&mut self, x: f64) -> f64 {
        let capacity = self.buffer.len() as u64;

        self.buffer[self.head] = x;
        self.head = (self.head + 1) % self.buffer.len();

        // Remove elements that just left the window
        while let Some(&(i, _)) = self.deque.front() {
            if i + capacity <= self.seq {
                self.deque.pop_front();
            } else {
                break;
            }
        }
        // Remove elements dominated by x from back
        while let Some(&(_, v)) = self.deque.back() {
            if v <= x {
                self.deque.pop_back();
            } else {
                break;
            }
        }
        self.deque.push_back((self.seq, x));
        self.seq += 1;
        self.max()
    }

    /// Current maximum over the whole window.
    pub fn max(&self) -> f64 {
        self.deque.front().map(|&(_, v)| v).unwrap_or(0.0)
    }

    /// Most recently pushed value (zero if nothing was pushed yet).
    pub fn latest(&self) -> f64 {
        let len = self.buffer.len();
        self.buffer[(self.head + len - 1) % len]
    }

    /// Window contents, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let (newer, older) = self.buffer.split_at(self.head);
        older.iter().chain(newer.iter()).copied()
    }

    /// Copy of the window contents, oldest first.
    pub fn snapshot(&self) -> Vec<f64> {
        self.iter().collect()
    }

    /// Number of values held (always equal to the capacity).
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of values pushed since construction.
    pub fn pushed(&self) -> u64 {
        self.seq - self.buffer.len() as u64
    }
}
