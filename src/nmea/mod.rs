//! # NMEA Module
//!
//! GPS fix extraction from an NMEA 0183 character stream.
//!
//! This module handles:
//! - Locating RMC sentences in arbitrary serial read chunks
//! - Converting packed degrees-minutes coordinates to signed decimal degrees
//! - Combining GPS date and time into a local epoch timestamp
//! - Holding the latest known fix

pub mod protocol;
pub mod fix;
pub mod decoder;

pub use decoder::NmeaFixDecoder;
pub use fix::PositionFix;
