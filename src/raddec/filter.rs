//! # Acceptance Filter
//!
//! Boolean predicate deciding which detection events reach the logfiles.

use super::event::DetectionEvent;

/// Predicate over detection events
pub trait AcceptanceFilter: Send {
    /// Returns `true` if the event should be logged.
    fn is_passing(&self, event: &DetectionEvent) -> bool;
}

/// Rejects events weaker than a minimum RSSI
#[derive(Debug, Clone, Copy)]
pub struct MinRssiFilter {
    min_rssi: i32,
}

impl MinRssiFilter {
    /// Creates a filter passing events with `rssi >= min_rssi`.
    #[must_use]
    pub fn new(min_rssi: i32) -> Self {
        Self { min_rssi }
    }

    /// Returns the configured threshold.
    #[must_use]
    pub fn min_rssi(&self) -> i32 {
        self.min_rssi
    }
}

impl AcceptanceFilter for MinRssiFilter {
    fn is_passing(&self, event: &DetectionEvent) -> bool {
        event.rssi >= self.min_rssi
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raddec::event::{IdentifierType, ReceiverType};

    fn event_with_rssi(rssi: i32) -> DetectionEvent {
        DetectionEvent {
            transmitter_id: "fee150bada55".to_string(),
            transmitter_id_type: IdentifierType::RndAdv48,
            receiver_id: "001bc50940810000".to_string(),
            receiver_id_type: ReceiverType::Ble,
            rssi,
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let filter = MinRssiFilter::new(-80);
        assert!(filter.is_passing(&event_with_rssi(-80)));
        assert!(filter.is_passing(&event_with_rssi(-40)));
        assert!(!filter.is_passing(&event_with_rssi(-81)));
    }

    #[test]
    fn test_min_rssi_accessor() {
        assert_eq!(MinRssiFilter::new(-99).min_rssi(), -99);
    }
}
