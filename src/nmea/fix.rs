//! # Position Fix
//!
//! The latest known GPS state, as decoded from the most recent RMC sentence.

use super::protocol::{COORDINATE_DECIMALS, MOTION_DECIMALS};

/// Latest decoded GPS position/time/speed/course snapshot
///
/// Every attribute is independently optional: an empty field in the sentence
/// only clears that attribute. A fix without a timestamp is never used to
/// enrich detection events.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PositionFix {
    /// Signed decimal degrees, north positive
    pub latitude: Option<f64>,
    /// Signed decimal degrees, east positive
    pub longitude: Option<f64>,
    /// Speed over ground in knots
    pub speed_knots: Option<f64>,
    /// Course over ground in degrees
    pub course_degrees: Option<f64>,
    /// Epoch milliseconds of the GPS date and time, interpreted in local time
    pub timestamp_ms: Option<i64>,
}

impl PositionFix {
    /// Returns `true` if the fix carries a timestamp and may enrich events.
    #[must_use]
    pub fn is_enrichable(&self) -> bool {
        self.timestamp_ms.is_some()
    }

    /// Renders latitude, longitude, speed and course as CSV field values.
    ///
    /// Absent attributes render as empty strings so that column positions
    /// stay fixed.
    ///
    /// # Examples
    ///
    /// ```
    /// use roam_logger::nmea::fix::PositionFix;
    ///
    /// let fix = PositionFix {
    ///     latitude: Some(48.1173),
    ///     longitude: None,
    ///     speed_knots: Some(22.4),
    ///     course_degrees: Some(84.4),
    ///     timestamp_ms: Some(0),
    /// };
    /// assert_eq!(fix.csv_fields(), ["48.11730", "", "22.4", "84.4"]);
    /// ```
    #[must_use]
    pub fn csv_fields(&self) -> [String; 4] {
        [
            render(self.latitude, COORDINATE_DECIMALS),
            render(self.longitude, COORDINATE_DECIMALS),
            render(self.speed_knots, MOTION_DECIMALS),
            render(self.course_degrees, MOTION_DECIMALS),
        ]
    }
}

fn render(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_default()
}

/// Rounds `value` to the given number of decimal places.
pub(crate) fn round_to(value: f64, decimals: usize) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fix_is_not_enrichable() {
        let fix = PositionFix::default();
        assert!(!fix.is_enrichable());
        assert_eq!(fix.csv_fields(), ["", "", "", ""]);
    }

    #[test]
    fn test_fix_with_timestamp_only_is_enrichable() {
        let fix = PositionFix {
            timestamp_ms: Some(764_426_119_000),
            ..Default::default()
        };
        assert!(fix.is_enrichable());
    }

    #[test]
    fn test_negative_coordinates_render() {
        let fix = PositionFix {
            latitude: Some(-33.86785),
            longitude: Some(-151.2),
            ..Default::default()
        };
        let fields = fix.csv_fields();
        assert_eq!(fields[0], "-33.86785");
        assert_eq!(fields[1], "-151.20000");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(11.516666666, 5), 11.51667);
        assert_eq!(round_to(22.44, 1), 22.4);
        assert_eq!(round_to(22.46, 1), 22.5);
    }
}
