//! # Logfile Rotator
//!
//! Owns the pair of open CSV logfiles (one per receiver type) and replaces
//! them once the fix-time has moved past the rotation period.
//!
//! ## Lifecycle
//!
//! ```text
//! NoSet --ensure_current--> SetOpen --ensure_current (window expired)--> SetOpen'
//! ```
//!
//! A window opened at fix-time `start` expires for a call at fix-time `t`
//! when `start < t - period`. Within a window every call returns the same set.
//!
//! ## Failed rotation
//!
//! Both new streams are opened before the current set is touched. If either
//! open fails, the stream that did open is closed again, the current set (if
//! any) stays in place unchanged, and the error is returned. The next call
//! retries the rotation.

use chrono::{Local, TimeZone};
use std::io::{self, Write};
use tracing::{error, info, warn};

use super::storage::LogStorage;
use crate::config::LogfileConfig;
use crate::error::{LoggerError, Result};
use crate::raddec::ReceiverType;

/// `strftime` format of the window timestamp embedded in file names
pub const WINDOW_STAMP_FORMAT: &str = "%y%m%d-%H%M%S";

/// The logfiles of one rotation window
pub struct LogfileSet<W> {
    ble: W,
    wifi: W,
    ble_name: String,
    wifi_name: String,
    window_start_ms: i64,
}

impl<W> std::fmt::Debug for LogfileSet<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogfileSet")
            .field("ble_name", &self.ble_name)
            .field("wifi_name", &self.wifi_name)
            .field("window_start_ms", &self.window_start_ms)
            .finish_non_exhaustive()
    }
}

impl<W: Write> LogfileSet<W> {
    /// Fix-time (epoch ms) that opened this window
    pub fn window_start_ms(&self) -> i64 {
        self.window_start_ms
    }

    /// File name of the stream for `kind`, if that kind has one
    pub fn file_name(&self, kind: ReceiverType) -> Option<&str> {
        match kind {
            ReceiverType::Ble => Some(&self.ble_name),
            ReceiverType::Wifi => Some(&self.wifi_name),
            ReceiverType::Unrecognized => None,
        }
    }

    /// Append `record` to the stream for `kind`
    ///
    /// Returns `Ok(false)` without writing when `kind` has no stream.
    pub fn append(&mut self, kind: ReceiverType, record: &str) -> io::Result<bool> {
        let stream = match kind {
            ReceiverType::Ble => &mut self.ble,
            ReceiverType::Wifi => &mut self.wifi,
            ReceiverType::Unrecognized => return Ok(false),
        };
        stream.write_all(record.as_bytes())?;
        Ok(true)
    }
}

/// Time-driven rotation of the BLE/WIFI logfile pair
pub struct LogfileRotator<S: LogStorage> {
    storage: S,
    prefix: String,
    extension: String,
    rotation_period_ms: i64,
    current: Option<LogfileSet<S::Stream>>,
    rotations: u64,
}

impl<S: LogStorage> LogfileRotator<S> {
    /// Create a rotator with no open set
    ///
    /// # Arguments
    ///
    /// * `storage` - Where logfiles are opened
    /// * `config` - File naming and rotation period
    pub fn new(storage: S, config: &LogfileConfig) -> Self {
        Self {
            storage,
            prefix: config.prefix.clone(),
            extension: config.extension.clone(),
            rotation_period_ms: config.rotation_period_ms(),
            current: None,
            rotations: 0,
        }
    }

    /// Return the set for the window containing `fix_timestamp_ms`,
    /// rotating first if no set is open or the current window has expired
    ///
    /// # Errors
    ///
    /// Returns `LoggerError::Logfile` if a new stream cannot be opened. The
    /// previously open set, if any, is kept.
    pub fn ensure_current(&mut self, fix_timestamp_ms: i64) -> Result<&mut LogfileSet<S::Stream>> {
        let period = self.rotation_period_ms;
        let expired = self
            .current
            .as_ref()
            .map_or(true, |set| window_expired(set.window_start_ms, fix_timestamp_ms, period));

        if expired {
            return self.rotate(fix_timestamp_ms);
        }

        self.current
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no open logfile set").into())
    }

    /// The open set, if any
    pub fn current(&self) -> Option<&LogfileSet<S::Stream>> {
        self.current.as_ref()
    }

    /// Number of sets opened so far
    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    /// Underlying storage
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Flush and close the open set, e.g. on shutdown
    ///
    /// # Errors
    ///
    /// Returns the first close failure; both streams are closed regardless.
    pub fn close(&mut self) -> Result<()> {
        match self.current.take() {
            Some(set) => self.close_set(set),
            None => Ok(()),
        }
    }

    fn rotate(&mut self, fix_timestamp_ms: i64) -> Result<&mut LogfileSet<S::Stream>> {
        let stamp = window_stamp(fix_timestamp_ms)?;
        let ble_name = self.file_name(ReceiverType::Ble, &stamp);
        let wifi_name = self.file_name(ReceiverType::Wifi, &stamp);

        let ble = self.open(&ble_name)?;
        let wifi = match self.open(&wifi_name) {
            Ok(stream) => stream,
            Err(e) => {
                if let Err(close_err) = self.storage.close(ble) {
                    warn!(file = %ble_name, error = %close_err, "logfile_rollback_close_failed");
                }
                warn!(
                    kept_window = ?self.current.as_ref().map(|s| s.window_start_ms),
                    "logfile_rotation_failed"
                );
                return Err(e);
            }
        };

        if let Some(previous) = self.current.take() {
            if let Err(e) = self.close_set(previous) {
                error!(error = %e, "logfile_close_failed");
            }
        }

        self.rotations += 1;
        info!(
            ble = %ble_name,
            wifi = %wifi_name,
            window_start_ms = fix_timestamp_ms,
            rotations = self.rotations,
            "logfile_set_opened"
        );

        Ok(self.current.insert(LogfileSet {
            ble,
            wifi,
            ble_name,
            wifi_name,
            window_start_ms: fix_timestamp_ms,
        }))
    }

    fn open(&mut self, file_name: &str) -> Result<S::Stream> {
        self.storage
            .open_append(file_name)
            .map_err(|e| LoggerError::logfile(self.storage.location(file_name), e))
    }

    fn close_set(&mut self, set: LogfileSet<S::Stream>) -> Result<()> {
        let LogfileSet {
            ble,
            wifi,
            ble_name,
            wifi_name,
            ..
        } = set;

        let ble_result = self
            .storage
            .close(ble)
            .map_err(|e| LoggerError::logfile(self.storage.location(&ble_name), e));
        let wifi_result = self
            .storage
            .close(wifi)
            .map_err(|e| LoggerError::logfile(self.storage.location(&wifi_name), e));

        info!(ble = %ble_name, wifi = %wifi_name, "logfile_set_closed");
        ble_result.and(wifi_result)
    }

    fn file_name(&self, kind: ReceiverType, stamp: &str) -> String {
        format!("{}-{}-{}.{}", self.prefix, kind.as_str(), stamp, self.extension)
    }
}

fn window_expired(window_start_ms: i64, fix_timestamp_ms: i64, period_ms: i64) -> bool {
    window_start_ms < fix_timestamp_ms.saturating_sub(period_ms)
}

/// Formats `fix_timestamp_ms` as `YYMMDD-HHMMSS` in local time
pub fn window_stamp(fix_timestamp_ms: i64) -> Result<String> {
    Local
        .timestamp_millis_opt(fix_timestamp_ms)
        .earliest()
        .map(|dt| dt.format(WINDOW_STAMP_FORMAT).to_string())
        .ok_or_else(|| {
            LoggerError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("fix timestamp {} is out of range", fix_timestamp_ms),
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logfile::storage::mocks::MemoryStorage;

    const MINUTE_MS: i64 = 60_000;

    fn config(period_minutes: u64) -> LogfileConfig {
        LogfileConfig {
            storage_path: "/mnt/sda1".to_string(),
            prefix: "roam".to_string(),
            extension: "csv".to_string(),
            delimiter: ",".to_string(),
            rotation_period_minutes: period_minutes,
        }
    }

    fn local_ms(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> i64 {
        Local
            .with_ymd_and_hms(y, mo, d, h, mi, s)
            .earliest()
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn test_first_call_opens_named_set() {
        let storage = MemoryStorage::new();
        let mut rotator = LogfileRotator::new(storage.clone(), &config(60));
        let t0 = local_ms(1994, 3, 23, 12, 35, 19);

        let set = rotator.ensure_current(t0).unwrap();
        assert_eq!(set.window_start_ms(), t0);
        assert_eq!(set.file_name(ReceiverType::Ble), Some("roam-ble-940323-123519.csv"));
        assert_eq!(set.file_name(ReceiverType::Wifi), Some("roam-wifi-940323-123519.csv"));
        assert_eq!(set.file_name(ReceiverType::Unrecognized), None);

        assert_eq!(
            storage.get_opened(),
            vec!["roam-ble-940323-123519.csv", "roam-wifi-940323-123519.csv"]
        );
        assert_eq!(rotator.rotations(), 1);
    }

    #[test]
    fn test_idempotent_within_window() {
        let storage = MemoryStorage::new();
        let mut rotator = LogfileRotator::new(storage.clone(), &config(60));
        let t0 = local_ms(2024, 6, 1, 8, 0, 0);

        rotator.ensure_current(t0).unwrap();
        rotator.ensure_current(t0 + 10 * MINUTE_MS).unwrap();
        // Exactly at the threshold is still inside the window
        let set = rotator.ensure_current(t0 + 60 * MINUTE_MS).unwrap();

        assert_eq!(set.window_start_ms(), t0);
        assert_eq!(rotator.rotations(), 1);
        assert_eq!(storage.get_opened().len(), 2);
        assert!(storage.get_closed().is_empty());
    }

    #[test]
    fn test_current_set_is_writable_on_both_paths() {
        let storage = MemoryStorage::new();
        let mut rotator = LogfileRotator::new(storage.clone(), &config(60));
        let t0 = local_ms(2024, 6, 1, 8, 0, 0);

        // Opened by rotation
        rotator.ensure_current(t0).unwrap().append(ReceiverType::Ble, "a\r\n").unwrap();
        // Reused without rotation
        rotator
            .ensure_current(t0 + MINUTE_MS)
            .unwrap()
            .append(ReceiverType::Ble, "b\r\n")
            .unwrap();
        rotator.close().unwrap();

        assert_eq!(storage.contents("roam-ble-240601-080000.csv"), "a\r\nb\r\n");
    }

    #[test]
    fn test_rotates_once_per_threshold_crossing() {
        let storage = MemoryStorage::new();
        let mut rotator = LogfileRotator::new(storage.clone(), &config(60));
        let t0 = local_ms(2024, 6, 1, 8, 0, 0);

        rotator.ensure_current(t0).unwrap();
        let t1 = t0 + 60 * MINUTE_MS + 1;
        let set = rotator.ensure_current(t1).unwrap();
        assert_eq!(set.window_start_ms(), t1);
        assert_eq!(rotator.rotations(), 2);

        // Later calls inside the new window do not rotate again
        rotator.ensure_current(t1 + 30 * MINUTE_MS).unwrap();
        rotator.ensure_current(t1 + 60 * MINUTE_MS).unwrap();
        assert_eq!(rotator.rotations(), 2);

        assert_eq!(
            storage.get_closed(),
            vec!["roam-ble-240601-080000.csv", "roam-wifi-240601-080000.csv"]
        );
        assert_eq!(storage.get_opened().len(), 4);
    }

    #[test]
    fn test_append_routes_by_kind() {
        let storage = MemoryStorage::new();
        let mut rotator = LogfileRotator::new(storage.clone(), &config(60));
        let t0 = local_ms(2024, 6, 1, 8, 0, 0);

        let set = rotator.ensure_current(t0).unwrap();
        assert!(set.append(ReceiverType::Ble, "ble-line\r\n").unwrap());
        assert!(set.append(ReceiverType::Wifi, "wifi-line\r\n").unwrap());
        assert!(!set.append(ReceiverType::Unrecognized, "lost\r\n").unwrap());

        assert_eq!(storage.contents("roam-ble-240601-080000.csv"), "ble-line\r\n");
        assert_eq!(storage.contents("roam-wifi-240601-080000.csv"), "wifi-line\r\n");
    }

    #[test]
    fn test_open_failure_without_previous_set() {
        let storage = MemoryStorage::new();
        storage.set_open_error("-ble-", io::ErrorKind::PermissionDenied);
        let mut rotator = LogfileRotator::new(storage.clone(), &config(60));

        let result = rotator.ensure_current(local_ms(2024, 6, 1, 8, 0, 0));
        assert!(matches!(result, Err(LoggerError::Logfile { .. })));
        assert!(rotator.current().is_none());
        assert_eq!(rotator.rotations(), 0);
    }

    #[test]
    fn test_partial_open_failure_keeps_previous_set() {
        let storage = MemoryStorage::new();
        let mut rotator = LogfileRotator::new(storage.clone(), &config(60));
        let t0 = local_ms(2024, 6, 1, 8, 0, 0);
        rotator.ensure_current(t0).unwrap();

        // The BLE stream of the next window opens, the WIFI stream does not
        storage.set_open_error("-wifi-", io::ErrorKind::Other);
        let t1 = t0 + 61 * MINUTE_MS;
        match rotator.ensure_current(t1) {
            Err(LoggerError::Logfile { path, .. }) => {
                assert_eq!(path, "roam-wifi-240601-090100.csv")
            }
            other => panic!("Expected Logfile error, got: {:?}", other),
        }

        // Half-opened BLE stream was closed again, old set untouched
        assert_eq!(storage.get_closed(), vec!["roam-ble-240601-090100.csv"]);
        let current = rotator.current().unwrap();
        assert_eq!(current.window_start_ms(), t0);
        assert_eq!(rotator.rotations(), 1);

        // Storage recovers: the next call completes the rotation
        storage.clear_open_error();
        let set = rotator.ensure_current(t1 + 1000).unwrap();
        assert_eq!(set.window_start_ms(), t1 + 1000);
        assert_eq!(rotator.rotations(), 2);
        assert!(storage
            .get_closed()
            .contains(&"roam-wifi-240601-080000.csv".to_string()));
    }

    #[test]
    fn test_close_failure_during_rotation_still_rotates() {
        let storage = MemoryStorage::new();
        let mut rotator = LogfileRotator::new(storage.clone(), &config(1));
        let t0 = local_ms(2024, 6, 1, 8, 0, 0);
        rotator.ensure_current(t0).unwrap();

        storage.set_close_error(io::ErrorKind::Other);
        let t1 = t0 + 2 * MINUTE_MS;
        let set = rotator.ensure_current(t1).unwrap();
        assert_eq!(set.window_start_ms(), t1);
    }

    #[test]
    fn test_close_flushes_current_set() {
        let storage = MemoryStorage::new();
        let mut rotator = LogfileRotator::new(storage.clone(), &config(60));
        rotator.ensure_current(local_ms(2024, 6, 1, 8, 0, 0)).unwrap();

        rotator.close().unwrap();
        assert!(rotator.current().is_none());
        assert_eq!(storage.get_closed().len(), 2);

        // Closing again is a no-op
        rotator.close().unwrap();
        assert_eq!(storage.get_closed().len(), 2);
    }

    #[test]
    fn test_close_reports_failure() {
        let storage = MemoryStorage::new();
        let mut rotator = LogfileRotator::new(storage.clone(), &config(60));
        rotator.ensure_current(local_ms(2024, 6, 1, 8, 0, 0)).unwrap();

        storage.set_close_error(io::ErrorKind::Other);
        assert!(rotator.close().is_err());
        assert_eq!(storage.get_closed().len(), 2);
    }

    #[test]
    fn test_window_expired() {
        assert!(!window_expired(0, 60 * MINUTE_MS, 60 * MINUTE_MS));
        assert!(window_expired(0, 60 * MINUTE_MS + 1, 60 * MINUTE_MS));
        assert!(!window_expired(i64::MIN + 1, i64::MIN, 60 * MINUTE_MS));
    }

    #[test]
    fn test_window_stamp_format() {
        let stamp = window_stamp(local_ms(2009, 12, 31, 23, 59, 58)).unwrap();
        assert_eq!(stamp, "091231-235958");
    }
}
