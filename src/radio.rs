//! Radio Manager collaborator boundary.
//!
//! The coordinator never talks to a transport directly; it drives a
//! [`RadioManager`] and receives [`Occurrence`]s back. The trait is
//! transport-agnostic - Bluetooth LE is the motivating case, but nothing
//! here assumes it.

use crate::engine::EffectError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Identifier of a remote peripheral.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DeviceId(Uuid);

impl DeviceId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of the service/profile being sought on peripherals.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct ServiceId(Uuid);

impl ServiceId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A peripheral as reported by the radio.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Peripheral {
    pub id: DeviceId,
    pub name: Option<String>,
}

/// Power condition of the radio transport.
///
/// Everything except `On` maps to an offline status.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RadioPower {
    On,
    Off,
    Resetting,
    Unauthorized,
    Unsupported,
}

/// A hardware-driven occurrence delivered by the radio manager.
///
/// Occurrences arrive on arbitrary threads; the coordinator marshals them
/// onto its serialized command queue before mapping them to machine events.
#[derive(Clone, Debug)]
pub enum Occurrence {
    /// The radio transport changed power condition.
    PowerChanged(RadioPower),
    /// A peripheral matching the scanned service was discovered.
    Discovered(Peripheral),
    /// A connect request completed.
    Connected(DeviceId),
    /// A connect request failed.
    ConnectAttemptFailed { device: DeviceId, error: RadioError },
    /// A peripheral disconnected; `error` is `None` for an intentional
    /// disconnect.
    Disconnected {
        device: DeviceId,
        error: Option<RadioError>,
    },
}

/// Errors reported by a radio manager.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum RadioError {
    #[error("radio transport is unavailable")]
    Unavailable,

    #[error("peripheral {0} is not known to the radio")]
    UnknownPeripheral(DeviceId),

    #[error("radio request failed: {0}")]
    Request(String),
}

impl From<RadioError> for EffectError {
    fn from(error: RadioError) -> Self {
        EffectError::Failed(error.to_string())
    }
}

/// External collaborator performing the actual wireless operations.
///
/// All three calls are fire-and-forget from the machine's perspective:
/// they kick off asynchronous hardware work and return immediately;
/// results come back later as [`Occurrence`]s.
pub trait RadioManager: Send + Sync {
    /// Start a scan filtered to peripherals advertising `service`.
    fn scan(&self, service: ServiceId) -> Result<(), RadioError>;

    /// Stop an in-progress scan.
    fn stop_scan(&self) -> Result<(), RadioError>;

    /// Request a connection to `device`.
    fn connect(&self, device: DeviceId) -> Result<(), RadioError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_serde() {
        let device = DeviceId::random();
        let json = serde_json::to_string(&device).unwrap();
        let back: DeviceId = serde_json::from_str(&json).unwrap();
        assert_eq!(device, back);
    }

    #[test]
    fn radio_error_converts_to_effect_error() {
        let error: EffectError = RadioError::Unavailable.into();
        assert!(error.to_string().contains("unavailable"));
    }
}
