//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where 
    T: Float 
{
    target_range.0 
        + ((value - source_range.0) 
        * (target_range.1 - target_range.0) 
        / (source_range.1 - source_range.0))
}

/// Linearly interpolate between `from` and `to` by the factor `t`.
///
/// `t` is not clamped, so values outside [0, 1] extrapolate.
pub fn lerp<T>(from: T, to: T, t: T) -> T
where
    T: Float
{
    from + (to - from) * t
}

pub fn clamp<T>(value: &T, min: &T, max: &T) -> T 
where
    T: Float + std::ops::Mul + std::ops::Add + std::ops::AddAssign
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Return `true` if `value` lies within `threshold` of zero.
pub fn is_near_zero<T>(value: T, threshold: T) -> bool
where
    T: Float
{
    value.abs() <= threshold
}

/// Return `true` if `a` and `b` differ by more than `threshold`.
pub fn differs_by_more_than<T>(a: T, b: T, threshold: T) -> bool
where
    T: Float
{
    (a - b).abs() > threshold
}
