//! Exponential smoothing primitive

/// Single-pole low-pass filter
///
/// The first sample initializes the estimate and is returned unchanged.
#[derive(Debug, Clone, Default)]
pub struct LowPassFilter {
    initialized: bool,
    previous: f64,
}

impl LowPassFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value produced, 0 before the first sample
    #[inline]
    pub fn last(&self) -> f64 {
        self.previous
    }

    /// Has this filter seen a sample yet?
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Blend `x` into the estimate with weight `alpha`
    pub fn filter(&mut self, x: f64, alpha: f64) -> f64 {
        let estimate = if self.initialized {
            alpha * x + (1.0 - alpha) * self.previous
        } else {
            self.initialized = true;
            x
        };

        self.previous = estimate;
        estimate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_passthrough() {
        let mut f = LowPassFilter::new();
        assert!(!f.is_initialized());
        assert_eq!(f.filter(0.42, 0.1), 0.42);
        assert_eq!(f.last(), 0.42);
        assert!(f.is_initialized());
    }

    #[test]
    fn test_blend() {
        let mut f = LowPassFilter::new();
        f.filter(0.0, 0.5);
        assert_eq!(f.filter(1.0, 0.5), 0.5);
        assert_eq!(f.filter(1.0, 0.5), 0.75);
    }

    #[test]
    fn test_alpha_extremes() {
        let mut f = LowPassFilter::new();
        f.filter(0.3, 1.0);
        assert_eq!(f.filter(0.9, 1.0), 0.9);
        assert_eq!(f.filter(0.1, 0.0), 0.9);
    }
}
