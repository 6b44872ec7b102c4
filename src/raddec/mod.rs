//! # Raddec Module
//!
//! Detection events arriving from the upstream radio decoder.
//!
//! This module handles:
//! - The flattened event model (transmitter, receiver, RSSI)
//! - Reading events as JSON lines from stdin or a FIFO
//! - The acceptance filter applied before logging

pub mod event;
pub mod filter;
pub mod source;

pub use event::{DetectionEvent, IdentifierType, ReceiverType};
pub use filter::{AcceptanceFilter, MinRssiFilter};
pub use source::{EventSource, JsonLinesEventSource};
