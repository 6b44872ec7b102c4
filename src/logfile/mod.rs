//! # Logfile Module
//!
//! Writes enriched detection events to rotating CSV logfiles.
//!
//! This module handles:
//! - Building fixed-position CSV records from an event and the latest fix
//! - Routing records to the BLE or WIFI logfile
//! - Rotating both logfiles on a fixed fix-time budget
//! - Flushing and closing logfiles on rotation and shutdown

pub mod storage;
pub mod rotator;
pub mod router;

pub use rotator::{LogfileRotator, LogfileSet};
pub use router::{Clock, EventRouter, RouteOutcome, SystemClock};
pub use storage::{FsStorage, LogStorage};
