// Floating point helpers for deterministic time comparisons

/// Smallest `f64` strictly greater than `value`.
///
/// Used to schedule a miss one representable step after a note's back end, since a note
/// exactly on its back end is still hittable.
pub fn bit_increment(value: f64) -> f64 {
    if value.is_nan() || value == f64::INFINITY {
        return value;
    }
    if value == 0.0 {
        // Covers -0.0 as well
        return f64::from_bits(1);
    }
    let bits = value.to_bits();
    if value > 0.0 {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

/// Position of `value` between `start` and `end` (0 at start, 1 at end).
///
/// A zero-width range yields 0.
pub fn inverse_lerp(start: f64, end: f64, value: f64) -> f64 {
    if end == start {
        return 0.0;
    }
    (value - start) / (end - start)
}

/// `time` strictly between `previous` and `next`.
pub fn is_time_between(time: f64, previous: f64, next: f64) -> bool {
    time > previous && time < next
}
