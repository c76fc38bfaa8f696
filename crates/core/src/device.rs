//! Device identity and the pairing flow that creates it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trust level assigned to a paired device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    Admin,
    Standard,
    Guest,
    Pending,
}

/// Connectivity state of a device as last observed by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Online,
    Offline,
    Syncing,
}

/// A paired device. Created by completing a pairing code; mutated only by
/// auth events; destroyed by explicit removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub display_name: String,
    pub device_type: String,
    pub trust_level: TrustLevel,
    pub status: DeviceStatus,
    pub paired_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub last_sync_version: u64,
    #[serde(with = "serde_bytes_as_base64")]
    pub public_key: Vec<u8>,
}

impl Device {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, device_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            display_name: display_name.into(),
            device_type: device_type.into(),
            trust_level: TrustLevel::Pending,
            status: DeviceStatus::Online,
            paired_at: now,
            last_seen_at: now,
            last_sync_version: 0,
            public_key: Vec::new(),
        }
    }

    pub fn touch(&mut self) {
        self.last_seen_at = Utc::now();
    }
}

mod serde_bytes_as_base64 {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        base64::engine::general_purpose::STANDARD
            .decode(s.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// The JSON payload encoded into a pairing QR code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrPayload {
    pub request_id: String,
    pub code: String,
    pub wizard_address: String,
    pub expires_at: DateTime<Utc>,
}

/// A pairing request: an 8-character code that a device exchanges for a
/// bearer token. Created on demand; consumed atomically on successful pair;
/// expires silently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingRequest {
    pub request_id: String,
    pub code: String,
    pub qr_payload: QrPayload,
    pub expires_at: DateTime<Utc>,
}

impl PairingRequest {
    pub fn new(request_id: impl Into<String>, code: impl Into<String>, wizard_address: impl Into<String>, ttl: chrono::Duration) -> Self {
        let request_id = request_id.into();
        let code = code.into();
        let wizard_address = wizard_address.into();
        let expires_at = Utc::now() + ttl;
        Self {
            qr_payload: QrPayload {
                request_id: request_id.clone(),
                code: code.clone(),
                wizard_address,
                expires_at,
            },
            request_id,
            code,
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_device_starts_pending_and_online() {
        let d = Device::new("dev-1", "Kitchen Tablet", "tablet");
        assert_eq!(d.trust_level, TrustLevel::Pending);
        assert_eq!(d.status, DeviceStatus::Online);
        assert_eq!(d.last_sync_version, 0);
    }

    #[test]
    fn pairing_request_not_expired_immediately() {
        let req = PairingRequest::new("req-1", "ABCD1234", "wizard.local:9443", chrono::Duration::minutes(5));
        assert!(!req.is_expired());
        assert_eq!(req.qr_payload.code, "ABCD1234");
    }

    #[test]
    fn pairing_request_expires_in_the_past() {
        let req = PairingRequest::new("req-2", "ZZZZ9999", "wizard.local:9443", chrono::Duration::seconds(-1));
        assert!(req.is_expired());
    }
}
