//! # Serial Communication Module
//!
//! Handles the serial connection to the USB GPS receiver.
//!
//! This module handles:
//! - Opening the GPS serial port (4800 baud by default, 8N1)
//! - Reading raw NMEA chunks without framing

pub mod reader;

pub use reader::{ChunkReader, NmeaSource};

use crate::config::GpsConfig;
use crate::error::{LoggerError, Result};
use tokio_serial::SerialPortBuilderExt;
use tracing::info;

/// NMEA 0183 standard baud rate
pub const NMEA_BAUD_RATE: u32 = 4800;

/// Open the GPS serial port described by `config`
///
/// # Returns
///
/// * `Result<ChunkReader<SerialStream>>` - Chunk reader over the open port
///
/// # Errors
///
/// Returns `LoggerError::Serial` if the port cannot be opened
///
/// # Examples
///
/// ```no_run
/// use roam_logger::config::Config;
/// use roam_logger::serial::open_gps;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = Config::load("config/default.toml")?;
///     let gps = open_gps(&config.gps)?;
///     Ok(())
/// }
/// ```
pub fn open_gps(config: &GpsConfig) -> Result<ChunkReader<tokio_serial::SerialStream>> {
    let port = open_port(&config.port, config.baud_rate)?;
    info!("Opened GPS serial port {} at {} baud", config.port, config.baud_rate);
    Ok(ChunkReader::new(port, config.read_buffer_size))
}

/// Open a specific serial port with 8N1 settings
///
/// # Arguments
///
/// * `path` - Device path (e.g., "/dev/ttyUSB0")
/// * `baud_rate` - Line speed
fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
    let port = tokio_serial::new(path, baud_rate)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .open_native_async()
        .map_err(|e| LoggerError::Serial(format!("Failed to open {}: {}", path, e)))?;

    Ok(port)
}
