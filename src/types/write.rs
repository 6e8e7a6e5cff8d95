//! Outcome of control commands

use serde::{Deserialize, Serialize};

/// Response to a setpoint or mode change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteResponse {
    /// Outcome reported by the gateway, e.g. `success`
    pub status: String,
    /// Temperature that was requested, °F
    #[serde(default)]
    pub requested_temperature: Option<f64>,
    /// Temperature the heater reports after the change, °F
    #[serde(default)]
    pub actual_temperature: Option<i64>,
    /// Raw reply relayed from the device
    #[serde(default)]
    pub device_response: Option<serde_json::Value>,
}

impl WriteResponse {
    /// Whether the gateway reported success
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }
}
