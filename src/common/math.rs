// Math utilities and helper functions

use glam::Vec3;

/// Clamp a value between min and max
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Clamp a fraction into [0, 1]. NaN collapses to 0.
pub fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        clamp(value, 0.0, 1.0)
    }
}

/// Euclidean range check, inclusive of the boundary
pub fn within_range(from: Vec3, to: Vec3, range: f32) -> bool {
    from.distance_squared(to) <= range * range
}

/// Whether an amount counts as a real quantity (NaN and non-positive do not)
pub fn is_positive(amount: f32) -> bool {
    amount > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp(-5.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp(15.0, 0.0, 10.0), 10.0);
    }

    #[test]
    fn test_clamp01() {
        assert_eq!(clamp01(0.5), 0.5);
        assert_eq!(clamp01(-1.0), 0.0);
        assert_eq!(clamp01(3.0), 1.0);
        assert_eq!(clamp01(f32::NAN), 0.0);
    }

    #[test]
    fn test_within_range() {
        let origin = Vec3::ZERO;
        assert!(within_range(origin, Vec3::new(2.0, 0.0, 0.0), 2.0));
        assert!(!within_range(origin, Vec3::new(2.0, 0.1, 0.0), 2.0));
        assert!(within_range(origin, Vec3::new(0.0, 0.0, -1.5), 2.0));
    }

    #[test]
    fn test_is_positive() {
        assert!(is_positive(0.1));
        assert!(!is_positive(0.0));
        assert!(!is_positive(-3.0));
        assert!(!is_positive(f32::NAN));
    }
}
