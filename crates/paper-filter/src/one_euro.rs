//! One-Euro adaptive filter
//!
//! Smooths heavily while the signal is slow and lets fast motion through:
//! the cutoff frequency grows with the (smoothed) speed of the signal.
//!
//! Per sample at rate `r`:
//! - `dx = (x - x_prev) * r`, 0 on the first sample
//! - `edx = lowpass(dx, alpha(r, 1.0))`
//! - `cutoff = min_cutoff + beta * |edx|`
//! - `out = lowpass(x, alpha(r, cutoff))`

use std::f64::consts::PI;

use crate::LowPassFilter;

/// Fixed cutoff of the derivative stage
pub const DERIVATIVE_CUTOFF: f64 = 1.0;

/// Snapshot of a filter's internal state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterState {
    pub first_sample: bool,
    pub previous_value: f64,
    pub previous_derivative: f64,
}

/// One-Euro filter
#[derive(Debug, Clone)]
pub struct OneEuroFilter {
    min_cutoff: f64,
    beta: f64,
    first_sample: bool,
    x_filter: LowPassFilter,
    dx_filter: LowPassFilter,
}

impl OneEuroFilter {
    pub fn new(min_cutoff: f64, beta: f64) -> Self {
        OneEuroFilter {
            min_cutoff,
            beta,
            first_sample: true,
            x_filter: LowPassFilter::new(),
            dx_filter: LowPassFilter::new(),
        }
    }

    pub fn min_cutoff(&self) -> f64 {
        self.min_cutoff
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Filter one sample taken at `rate` samples per unit time
    pub fn filter(&mut self, x: f64, rate: f64) -> f64 {
        let dx = if self.first_sample {
            self.first_sample = false;
            0.0
        } else {
            (x - self.x_filter.last()) * rate
        };

        let edx = self.dx_filter.filter(dx, alpha(rate, DERIVATIVE_CUTOFF));
        let cutoff = self.min_cutoff + self.beta * edx.abs();

        self.x_filter.filter(x, alpha(rate, cutoff))
    }

    pub fn state(&self) -> FilterState {
        FilterState {
            first_sample: self.first_sample,
            previous_value: self.x_filter.last(),
            previous_derivative: self.dx_filter.last(),
        }
    }
}

/// Smoothing factor for a low-pass stage with the given cutoff
#[inline]
pub fn alpha(rate: f64, cutoff: f64) -> f64 {
    let tau = 1.0 / (2.0 * PI * cutoff);
    let te = 1.0 / rate;
    1.0 / (1.0 + tau / te)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_sample_unchanged() {
        let mut f = OneEuroFilter::new(0.1, 15.0);
        assert_eq!(f.filter(0.9, 1.0), 0.9);

        let state = f.state();
        assert!(!state.first_sample);
        assert_eq!(state.previous_value, 0.9);
        assert_eq!(state.previous_derivative, 0.0);
    }

    #[test]
    fn test_constant_signal_converges() {
        let mut f = OneEuroFilter::new(0.1, 15.0);
        f.filter(0.0, 1.0);
        let mut out = 0.0;
        for _ in 0..200 {
            out = f.filter(0.5, 1.0);
        }
        assert!((out - 0.5).abs() < 1e-6, "got {}", out);
    }

    #[test]
    fn test_fast_motion_tracks_closer_with_beta() {
        let mut slow = OneEuroFilter::new(0.1, 0.0);
        let mut fast = OneEuroFilter::new(0.1, 15.0);
        slow.filter(0.0, 1.0);
        fast.filter(0.0, 1.0);

        let a = slow.filter(1.0, 1.0);
        let b = fast.filter(1.0, 1.0);
        assert!(b > a, "beta should raise the cutoff on a jump: {} vs {}", b, a);
    }

    #[test]
    fn test_alpha_bounds() {
        let a = alpha(1.0, 1.0);
        assert!(a > 0.0 && a < 1.0);
        // 1 / (1 + 1/(2π))
        assert!((a - 0.862_697).abs() < 1e-5);
        assert!(alpha(1.0, 1000.0) > 0.99);
    }

    proptest! {
        #[test]
        fn output_stays_within_input_range(samples in proptest::collection::vec(0.0f64..1.0, 1..64)) {
            let mut f = OneEuroFilter::new(0.1, 15.0);
            for x in samples {
                let out = f.filter(x, 1.0);
                prop_assert!((-1e-9..=1.0 + 1e-9).contains(&out));
            }
        }
    }
}
