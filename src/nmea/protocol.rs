//! # NMEA 0183 Constants
//!
//! Sentence sentinels and RMC field layout.
//!
//! ```text
//! $GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A
//!        |      | |        | |         | |     |     |
//!        1      2 3        4 5         6 7     8     9
//! ```

/// RMC sentinel emitted by GPS-only receivers
pub const RMC_SENTINEL_GPS: &str = "$GPRMC";

/// RMC sentinel emitted by multi-constellation (GNSS) receivers
pub const RMC_SENTINEL_GNSS: &str = "$GNRMC";

/// All recognized RMC sentinels
pub const RMC_SENTINELS: &[&str] = &[RMC_SENTINEL_GPS, RMC_SENTINEL_GNSS];

/// Field delimiter inside a sentence
pub const FIELD_DELIMITER: char = ',';

/// Start of the `*hh` checksum suffix
pub const CHECKSUM_DELIMITER: char = '*';

/// Sentence terminator
pub const SENTENCE_TERMINATOR: char = '\n';

// RMC field indices
pub const RMC_TIME: usize = 1;
pub const RMC_LATITUDE: usize = 3;
pub const RMC_LATITUDE_HEMISPHERE: usize = 4;
pub const RMC_LONGITUDE: usize = 5;
pub const RMC_LONGITUDE_HEMISPHERE: usize = 6;
pub const RMC_SPEED_KNOTS: usize = 7;
pub const RMC_COURSE_DEGREES: usize = 8;
pub const RMC_DATE: usize = 9;

/// Two-digit years at or above this value belong to the 1900s
pub const YEAR_PIVOT: u32 = 80;

/// Decimal places kept for latitude and longitude
pub const COORDINATE_DECIMALS: usize = 5;

/// Decimal places kept for speed and course
pub const MOTION_DECIMALS: usize = 1;
