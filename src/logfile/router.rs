//! # Event Router
//!
//! Enriches accepted detection events with the latest GPS fix and appends
//! them as CSV records to the logfile of their receiver type.
//!
//! ## Record Layout
//!
//! No header row. Fields, in order:
//!
//! ```text
//! fixTimestampMs,writeTimestampMs,transmitterId,transmitterIdType,rssi,latitude,longitude,speedKnots,courseDegrees\r\n
//! ```
//!
//! GPS attributes missing from the fix are written as empty fields. The
//! delimiter, CR and LF are stripped from the transmitter id so an id can
//! never shift columns or start a new record.

use chrono::Utc;
use tracing::{debug, trace};

use super::rotator::LogfileRotator;
use super::storage::LogStorage;
use crate::error::{LoggerError, Result};
use crate::nmea::PositionFix;
use crate::raddec::{DetectionEvent, ReceiverType};

/// Record terminator
pub const RECORD_TERMINATOR: &str = "\r\n";

/// Wall-clock source for the write timestamp
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send {
    /// Current wall-clock time in epoch milliseconds
    fn now_ms(&self) -> i64;
}

/// System wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// What happened to a routed event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Record appended to the logfile of this receiver type
    Written(ReceiverType),
    /// Dropped: the latest fix has no timestamp
    NoFixTimestamp,
    /// Dropped: the receiver type has no logfile
    Unroutable,
}

/// Counters for routed events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    pub written: u64,
    pub dropped_no_fix: u64,
    pub dropped_unroutable: u64,
}

/// Routes enriched events to the BLE or WIFI logfile
pub struct EventRouter<S: LogStorage, C: Clock> {
    rotator: LogfileRotator<S>,
    clock: C,
    delimiter: char,
    stats: RouterStats,
}

impl<S: LogStorage, C: Clock> EventRouter<S, C> {
    pub fn new(rotator: LogfileRotator<S>, clock: C, delimiter: char) -> Self {
        Self {
            rotator,
            clock,
            delimiter,
            stats: RouterStats::default(),
        }
    }

    /// Log one accepted event against the latest fix
    ///
    /// # Arguments
    ///
    /// * `event` - Event that already passed the acceptance filter
    /// * `fix` - Latest known GPS fix
    ///
    /// # Returns
    ///
    /// * `Result<RouteOutcome>` - Whether the event was written or dropped
    ///
    /// # Errors
    ///
    /// Returns `LoggerError::Logfile` if rotation or the append fails.
    /// Dropped events are never errors.
    pub fn handle(&mut self, event: &DetectionEvent, fix: &PositionFix) -> Result<RouteOutcome> {
        let Some(fix_timestamp_ms) = fix.timestamp_ms else {
            self.stats.dropped_no_fix += 1;
            trace!(transmitter = %event.transmitter_id, "event_dropped_no_fix");
            return Ok(RouteOutcome::NoFixTimestamp);
        };

        let kind = event.receiver_id_type;
        if kind == ReceiverType::Unrecognized {
            self.stats.dropped_unroutable += 1;
            trace!(receiver = %event.receiver_id, "event_dropped_unroutable");
            return Ok(RouteOutcome::Unroutable);
        }

        let record = format_record(
            event,
            fix,
            fix_timestamp_ms,
            self.clock.now_ms(),
            self.delimiter,
        );

        let set = self.rotator.ensure_current(fix_timestamp_ms)?;
        if let Err(e) = set.append(kind, &record) {
            let file_name = set.file_name(kind).unwrap_or_default().to_string();
            return Err(LoggerError::logfile(
                self.rotator.storage().location(&file_name),
                e,
            ));
        }

        self.stats.written += 1;
        debug!(kind = %kind, record = %record.trim_end(), "event_logged");
        Ok(RouteOutcome::Written(kind))
    }

    /// Router counters
    pub fn stats(&self) -> RouterStats {
        self.stats
    }

    /// The rotator owning the open logfiles
    pub fn rotator(&self) -> &LogfileRotator<S> {
        &self.rotator
    }

    /// Flush and close the open logfiles
    pub fn close(&mut self) -> Result<()> {
        self.rotator.close()
    }
}

/// Build one CRLF-terminated CSV record
pub fn format_record(
    event: &DetectionEvent,
    fix: &PositionFix,
    fix_timestamp_ms: i64,
    write_timestamp_ms: i64,
    delimiter: char,
) -> String {
    let [latitude, longitude, speed, course] = fix.csv_fields();
    let fields = [
        fix_timestamp_ms.to_string(),
        write_timestamp_ms.to_string(),
        clean_field(&event.transmitter_id, delimiter),
        event.transmitter_id_type.to_string(),
        event.rssi.to_string(),
        latitude,
        longitude,
        speed,
        course,
    ];

    let mut record = fields.join(delimiter.encode_utf8(&mut [0u8; 4]));
    record.push_str(RECORD_TERMINATOR);
    record
}

fn clean_field(value: &str, delimiter: char) -> String {
    value
        .chars()
        .filter(|&c| c != delimiter && c != '\r' && c != '\n')
        .collect()
}
