//! Easing helpers

/// Cubic Hermite easing between two edges.
///
/// Returns 0 at `edge0` and 1 at `edge1`, clamped outside the interval.
/// Reversed edges (`edge0 > edge1`) ease downwards, which the squint and
/// brow-lowering emulation rely on.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let span = edge1 - edge0;
    if span == 0.0 {
        // Degenerate band collapses to a step at the edge
        let past = if edge1 >= edge0 { x >= edge1 } else { x <= edge1 };
        return if past { 1.0 } else { 0.0 };
    }

    let t = ((x - edge0) / span).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothstep_edges() {
        assert_eq!(smoothstep(0.07, 0.5, 0.07), 0.0);
        assert_eq!(smoothstep(0.07, 0.5, 0.5), 1.0);
        assert_eq!(smoothstep(0.07, 0.5, -3.0), 0.0);
        assert_eq!(smoothstep(0.07, 0.5, 3.0), 1.0);
    }

    #[test]
    fn test_smoothstep_midpoint() {
        let mid = smoothstep(0.07, 0.5, 0.285);
        assert!((mid - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_smoothstep_reversed_edges() {
        // Squint easing runs from the upper bound down to the lower one
        assert_eq!(smoothstep(0.5, 0.07, 0.5), 0.0);
        assert_eq!(smoothstep(0.5, 0.07, 0.07), 1.0);
        assert_eq!(smoothstep(0.5, 0.07, 0.0), 1.0);
        assert!((smoothstep(0.5, 0.07, 0.285) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_smoothstep_degenerate_band() {
        assert_eq!(smoothstep(0.6, 0.6, 0.5), 0.0);
        assert_eq!(smoothstep(0.6, 0.6, 0.6), 1.0);
        assert!(!smoothstep(0.6, 0.6, 0.7).is_nan());
    }

    #[test]
    fn test_smoothstep_monotonic() {
        let mut last = 0.0;
        for i in 0..=100 {
            let x = 0.07 + (0.5 - 0.07) * i as f32 / 100.0;
            let y = smoothstep(0.07, 0.5, x);
            assert!(y >= last);
            last = y;
        }
    }
}
