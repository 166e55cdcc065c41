//! Device reading validation
//!
//! The on-device sensor reports `0` until it has warmed up or when it is
//! disconnected. The hardware can report values above 400, but readings in
//! that range have only ever come from faults.

use std::ops::RangeInclusive;

/// Range of device AQI values accepted without fallback
pub const VALID_DEVICE_AQI: RangeInclusive<i32> = 1..=400;

/// Whether a raw device AQI can be used as-is
#[must_use]
pub fn is_valid(raw_aqi: i32) -> bool {
    VALID_DEVICE_AQI.contains(&raw_aqi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, false)]
    #[case(1, true)]
    #[case(42, true)]
    #[case(400, true)]
    #[case(401, false)]
    #[case(500, false)]
    #[case(-3, false)]
    fn test_device_aqi_range(#[case] raw: i32, #[case] expected: bool) {
        assert_eq!(is_valid(raw), expected);
    }

    #[test]
    fn test_valid_exactly_within_bounds() {
        for v in -10..=600 {
            assert_eq!(is_valid(v), (1..=400).contains(&v), "value {v}");
        }
    }
}
