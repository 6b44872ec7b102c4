//! # NMEA Fix Decoder
//!
//! Extracts the latest position fix from raw ASCII chunks of an NMEA 0183
//! stream. Only RMC sentences are decoded; everything else is ignored.
//!
//! A chunk is scanned for RMC sentinels. Each sentence that is terminated
//! within the chunk replaces the current fix. A trailing sentence without a
//! terminator is discarded: nothing is carried over to the next chunk, so a
//! fix split across two reads is lost.

use chrono::{Local, TimeZone};
use tracing::{debug, trace};

use super::fix::{round_to, PositionFix};
use super::protocol::*;

/// Counters describing what the decoder has seen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Complete RMC sentences decoded into a fix
    pub sentences_decoded: u64,
    /// RMC sentences dropped because the chunk ended before the terminator
    pub partial_discarded: u64,
}

/// Incremental RMC decoder owning the latest known fix
///
/// The decoder is the only writer of its [`PositionFix`]; readers borrow it
/// through [`NmeaFixDecoder::latest`].
#[derive(Debug, Default)]
pub struct NmeaFixDecoder {
    fix: PositionFix,
    stats: DecoderStats,
}

impl NmeaFixDecoder {
    /// Creates a decoder with no fix yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one chunk of the GPS character stream.
    ///
    /// # Examples
    ///
    /// ```
    /// use roam_logger::nmea::decoder::NmeaFixDecoder;
    ///
    /// let mut decoder = NmeaFixDecoder::new();
    /// decoder.feed("$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,,\r\n");
    /// assert_eq!(decoder.latest().latitude, Some(48.1173));
    /// ```
    pub fn feed(&mut self, chunk: &str) {
        let mut rest = chunk;

        while let Some(start) = find_sentinel(rest) {
            let from_sentinel = &rest[start..];

            match from_sentinel.find(SENTENCE_TERMINATOR) {
                Some(end) => {
                    let sentence = &from_sentinel[..end];
                    self.fix = decode_rmc(sentence);
                    self.stats.sentences_decoded += 1;
                    trace!(sentence = %sentence.trim_end(), fix = ?self.fix, "rmc_decoded");
                    rest = &from_sentinel[end + 1..];
                }
                None => {
                    self.stats.partial_discarded += 1;
                    debug!(
                        partial = %from_sentinel,
                        discarded = self.stats.partial_discarded,
                        "rmc_partial_sentence_discarded"
                    );
                    break;
                }
            }
        }
    }

    /// The latest decoded fix.
    #[must_use]
    pub fn latest(&self) -> &PositionFix {
        &self.fix
    }

    /// Decoder counters.
    #[must_use]
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }
}

/// Byte offset of the earliest RMC sentinel in `chunk`.
fn find_sentinel(chunk: &str) -> Option<usize> {
    RMC_SENTINELS
        .iter()
        .filter_map(|sentinel| chunk.find(sentinel))
        .min()
}

/// Decodes one RMC sentence (without its terminator) into a fix.
///
/// Never fails: every field that is missing, empty or unparsable becomes an
/// absent attribute.
///
/// # Examples
///
/// ```
/// use roam_logger::nmea::decoder::decode_rmc;
///
/// let fix = decode_rmc("$GPRMC,123519,A,,,01131.000,E,,,,,");
/// assert_eq!(fix.latitude, None);
/// assert_eq!(fix.longitude, Some(11.51667));
/// assert_eq!(fix.timestamp_ms, None);
/// ```
#[must_use]
pub fn decode_rmc(sentence: &str) -> PositionFix {
    let body = sentence
        .split(CHECKSUM_DELIMITER)
        .next()
        .unwrap_or_default()
        .trim_end_matches(['\r', '\n']);
    let fields: Vec<&str> = body.split(FIELD_DELIMITER).collect();
    let field = |index: usize| fields.get(index).copied().unwrap_or("").trim();

    PositionFix {
        latitude: parse_coordinate(field(RMC_LATITUDE), field(RMC_LATITUDE_HEMISPHERE), "S"),
        longitude: parse_coordinate(field(RMC_LONGITUDE), field(RMC_LONGITUDE_HEMISPHERE), "W"),
        speed_knots: parse_decimal(field(RMC_SPEED_KNOTS)),
        course_degrees: parse_decimal(field(RMC_COURSE_DEGREES)),
        timestamp_ms: parse_timestamp(field(RMC_TIME), field(RMC_DATE)),
    }
}

/// Converts packed `DDMM.MMMM` / `DDDMM.MMMM` into signed decimal degrees.
fn parse_coordinate(raw: &str, hemisphere: &str, negative_hemisphere: &str) -> Option<f64> {
    let raw = parse_finite(raw)?;
    let degrees = (raw / 100.0).floor();
    let minutes = raw - degrees * 100.0;
    let value = round_to(degrees + minutes / 60.0, COORDINATE_DECIMALS);

    if hemisphere == negative_hemisphere && value != 0.0 {
        Some(-value)
    } else {
        Some(value)
    }
}

fn parse_decimal(raw: &str) -> Option<f64> {
    parse_finite(raw).map(|v| round_to(v, MOTION_DECIMALS))
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Combines `HHMMSS[.sss]` and `DDMMYY` into local epoch milliseconds.
///
/// Both fields must be present. The two-digit month is a calendar month
/// (01 = January) and the two-digit year is expanded by [`full_year`]. Fractional seconds are ignored. Components that do not
/// form a valid local date-time yield `None`.
fn parse_timestamp(time: &str, date: &str) -> Option<i64> {
    if time.is_empty() || date.is_empty() {
        return None;
    }

    let day = parse_pair(date, 0)?;
    let month = parse_pair(date, 2)?;
    let year = full_year(parse_pair(date, 4)?);
    let hour = parse_pair(time, 0)?;
    let minute = parse_pair(time, 2)?;
    let second = parse_pair(time, 4)?;

    let timestamp = Local
        .with_ymd_and_hms(year, month, day, hour, minute, second)
        .earliest()
        .map(|dt| dt.timestamp_millis());

    if timestamp.is_none() {
        debug!(time, date, "rmc_invalid_date_time");
    }
    timestamp
}

/// Expands a two-digit year: `80..=99` is 1980-1999, `00..=79` is 2000-2079.
fn full_year(yy: u32) -> i32 {
    let century = if yy >= YEAR_PIVOT { 1900 } else { 2000 };
    century + yy as i32
}

/// Parses the two digits starting at `offset`.
fn parse_pair(field: &str, offset: usize) -> Option<u32> {
    field.get(offset..offset + 2)?.parse().ok()
}
