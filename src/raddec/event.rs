//! # Detection Events
//!
//! Flattened radio detection events (raddecs) as delivered by the upstream
//! decoder: one transmitter, one receiver, one signal strength.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier type code of a transmitter
///
/// Serialized as its numeric code. Codes outside the known table are kept
/// as [`IdentifierType::Other`] rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum IdentifierType {
    Unknown,
    Eui64,
    Eui48,
    RndAdv48,
    Tid96,
    Epc96,
    Uuid32,
    Uuid16,
    Uri,
    Other(u8),
}

impl IdentifierType {
    /// Numeric code written to the CSV record
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            IdentifierType::Unknown => 0,
            IdentifierType::Eui64 => 1,
            IdentifierType::Eui48 => 2,
            IdentifierType::RndAdv48 => 3,
            IdentifierType::Tid96 => 4,
            IdentifierType::Epc96 => 5,
            IdentifierType::Uuid32 => 6,
            IdentifierType::Uuid16 => 7,
            IdentifierType::Uri => 8,
            IdentifierType::Other(code) => code,
        }
    }
}

impl From<u8> for IdentifierType {
    fn from(code: u8) -> Self {
        match code {
            0 => IdentifierType::Unknown,
            1 => IdentifierType::Eui64,
            2 => IdentifierType::Eui48,
            3 => IdentifierType::RndAdv48,
            4 => IdentifierType::Tid96,
            5 => IdentifierType::Epc96,
            6 => IdentifierType::Uuid32,
            7 => IdentifierType::Uuid16,
            8 => IdentifierType::Uri,
            other => IdentifierType::Other(other),
        }
    }
}

impl From<IdentifierType> for u8 {
    fn from(id_type: IdentifierType) -> Self {
        id_type.code()
    }
}

impl fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Radio technology of the receiver that observed the transmitter
///
/// Each recognized kind has its own logfile. Anything else deserializes to
/// [`ReceiverType::Unrecognized`] and is never written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiverType {
    Ble,
    Wifi,
    #[serde(other)]
    Unrecognized,
}

impl ReceiverType {
    /// Short name used inside logfile names
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReceiverType::Ble => "ble",
            ReceiverType::Wifi => "wifi",
            ReceiverType::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for ReceiverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One flattened detection event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionEvent {
    pub transmitter_id: String,
    pub transmitter_id_type: IdentifierType,
    pub receiver_id: String,
    pub receiver_id_type: ReceiverType,
    /// Received signal strength in dBm
    pub rssi: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_type_codes() {
        for code in 0..=8u8 {
            assert_eq!(IdentifierType::from(code).code(), code);
        }
        assert_eq!(IdentifierType::from(3), IdentifierType::RndAdv48);
        assert_eq!(IdentifierType::from(42), IdentifierType::Other(42));
        assert_eq!(IdentifierType::Eui48.to_string(), "2");
    }

    #[test]
    fn test_deserialize_flattened_event() {
        let json = r#"{
            "transmitterId": "fee150bada55",
            "transmitterIdType": 3,
            "receiverId": "001bc50940810000",
            "receiverIdType": "ble",
            "rssi": -72
        }"#;

        let event: DetectionEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.transmitter_id, "fee150bada55");
        assert_eq!(event.transmitter_id_type, IdentifierType::RndAdv48);
        assert_eq!(event.receiver_id_type, ReceiverType::Ble);
        assert_eq!(event.rssi, -72);
    }

    #[test]
    fn test_unknown_receiver_type_is_unrecognized() {
        let json = r#"{"transmitterId":"a","transmitterIdType":2,"receiverId":"b","receiverIdType":"lora","rssi":-60}"#;
        let event: DetectionEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.receiver_id_type, ReceiverType::Unrecognized);
    }

    #[test]
    fn test_missing_field_is_error() {
        let json = r#"{"transmitterId":"a","receiverId":"b","receiverIdType":"ble","rssi":-60}"#;
        assert!(serde_json::from_str::<DetectionEvent>(json).is_err());
    }

    #[test]
    fn test_serialize_uses_numeric_identifier_type() {
        let event = DetectionEvent {
            transmitter_id: "aa".to_string(),
            transmitter_id_type: IdentifierType::Eui48,
            receiver_id: "bb".to_string(),
            receiver_id_type: ReceiverType::Wifi,
            rssi: -50,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""transmitterIdType":2"#));
        assert!(json.contains(r#""receiverIdType":"wifi""#));
    }
}
