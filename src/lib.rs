//! # Roam Logger Library
//!
//! Tags radio detection events with the latest GPS fix and logs them to
//! rotating, receiver-type-specific CSV files.
//!
//! This library provides the core of a passive field logger: decoding NMEA
//! fixes from a serial GPS, enriching BLE/WIFI detection events with them,
//! and rotating the output files on a fixed fix-time budget.

pub mod config;
pub mod error;
pub mod logfile;
pub mod nmea;
pub mod pipeline;
pub mod raddec;
pub mod serial;
