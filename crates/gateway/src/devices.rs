//! Device pairing and the device registry (§3 Device, Pairing Request).
//!
//! A full pairing flow backed by `wizard_core::device`'s
//! `Device`/`PairingRequest`/`TrustLevel` shapes:
//! a QR-code-bearing pairing request that expires, exchanged for a bearer
//! token tied to a `Device` record instead of a bare token string.

use chrono::Duration;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Mutex;
use wizard_core::device::{Device, PairingRequest, TrustLevel};

pub struct DeviceRegistry {
    devices: Mutex<HashMap<String, Device>>,
    pending: Mutex<HashMap<String, PairingRequest>>,
    pairing_ttl: Duration,
    preauthorized_device_ids: Vec<String>,
}

impl DeviceRegistry {
    pub fn new(pairing_ttl_seconds: i64, preauthorized_device_ids: Vec<String>) -> Self {
        Self {
            devices: Mutex::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
            pairing_ttl: Duration::seconds(pairing_ttl_seconds),
            preauthorized_device_ids,
        }
    }

    /// Begin pairing: mint an 8-character code and the QR payload that
    /// wraps it, good for `pairing_ttl`.
    pub fn start_pairing(&self, wizard_address: &str) -> PairingRequest {
        let request_id = uuid::Uuid::new_v4().to_string();
        let code = generate_code();
        let request = PairingRequest::new(request_id, code.clone(), wizard_address, self.pairing_ttl);
        self.pending.lock().expect("pairing mutex poisoned").insert(code, request.clone());
        request
    }

    /// Exchange a pairing code for a bearer token and a new `Device`.
    /// Returns `None` if the code is unknown or has expired.
    pub fn complete_pairing(&self, code: &str, display_name: &str, device_type: &str) -> Option<(String, Device)> {
        let request = {
            let mut pending = self.pending.lock().expect("pairing mutex poisoned");
            pending.remove(code)?
        };

        if request.is_expired() {
            return None;
        }

        let device_id = uuid::Uuid::new_v4().to_string();
        let mut device = Device::new(device_id.clone(), display_name, device_type);
        if self.preauthorized_device_ids.iter().any(|id| id == &device_id) {
            device.trust_level = TrustLevel::Admin;
        }

        let token = uuid::Uuid::new_v4().to_string();
        self.devices.lock().expect("device mutex poisoned").insert(token.clone(), device.clone());
        Some((token, device))
    }

    /// Resolve a bearer token to its device, touching `last_seen_at`.
    pub fn authenticate(&self, bearer_token: &str) -> Option<Device> {
        let mut devices = self.devices.lock().expect("device mutex poisoned");
        let device = devices.get_mut(bearer_token)?;
        device.touch();
        Some(device.clone())
    }

    pub fn list(&self) -> Vec<Device> {
        self.devices.lock().expect("device mutex poisoned").values().cloned().collect()
    }

    /// Remove a device by its device id (not its bearer token).
    pub fn remove(&self, device_id: &str) -> bool {
        let mut devices = self.devices.lock().expect("device mutex poisoned");
        let before = devices.len();
        devices.retain(|_, d| d.id != device_id);
        devices.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.devices.lock().expect("device mutex poisoned").is_empty()
    }
}

/// An 8-character alphanumeric pairing code, drawn from `rand`'s CSPRNG.
fn generate_code() -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    let mut rng = rand::rng();
    (0..8).map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairing_round_trip_produces_a_device() {
        let registry = DeviceRegistry::new(300, vec![]);
        let request = registry.start_pairing("wizard.local:42617");
        let (token, device) = registry.complete_pairing(&request.code, "Kitchen Tablet", "tablet").unwrap();
        assert_eq!(device.display_name, "Kitchen Tablet");
        assert!(registry.authenticate(&token).is_some());
    }

    #[test]
    fn unknown_code_fails_to_complete() {
        let registry = DeviceRegistry::new(300, vec![]);
        assert!(registry.complete_pairing("ZZZZZZZZ", "x", "phone").is_none());
    }

    #[test]
    fn expired_code_fails_to_complete() {
        let registry = DeviceRegistry::new(-1, vec![]);
        let request = registry.start_pairing("wizard.local:42617");
        assert!(registry.complete_pairing(&request.code, "x", "phone").is_none());
    }

    #[test]
    fn code_is_consumed_on_successful_pairing() {
        let registry = DeviceRegistry::new(300, vec![]);
        let request = registry.start_pairing("wizard.local:42617");
        registry.complete_pairing(&request.code, "a", "phone").unwrap();
        assert!(registry.complete_pairing(&request.code, "b", "phone").is_none());
    }

    #[test]
    fn removing_a_device_drops_its_token() {
        let registry = DeviceRegistry::new(300, vec![]);
        let request = registry.start_pairing("wizard.local:42617");
        let (token, device) = registry.complete_pairing(&request.code, "a", "phone").unwrap();
        assert!(registry.remove(&device.id));
        assert!(registry.authenticate(&token).is_none());
    }
}
