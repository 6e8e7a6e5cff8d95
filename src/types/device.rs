//! Water heater status snapshots

use serde::{Deserialize, Serialize};

use super::identifiers::{MacAddress, RequestId};

/// Operating mode as reported by the API: a label ("Hybrid", "Heat Pump") or
/// a numeric code, depending on the endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceMode {
    /// Numeric mode code
    Code(i64),
    /// Human-readable mode label
    Text(String),
}

impl From<i64> for DeviceMode {
    fn from(code: i64) -> Self {
        Self::Code(code)
    }
}

impl From<&str> for DeviceMode {
    fn from(label: &str) -> Self {
        label
            .parse::<i64>()
            .map_or_else(|_| Self::Text(label.to_string()), Self::Code)
    }
}

impl std::fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{code}"),
            Self::Text(label) => f.write_str(label),
        }
    }
}

/// A device as returned by the appliance list and status endpoints
///
/// Only the identity fields are guaranteed; the list endpoint omits most of
/// the live status fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    /// MAC address of the Wi-Fi module
    pub mac_address: MacAddress,
    /// Name given in the app
    pub friendly_name: String,
    /// Heater serial number
    pub serial_number: String,
    /// Current setpoint in °F
    #[serde(default)]
    pub setpoint_fahrenheit: Option<i64>,
    /// Operating mode
    #[serde(default)]
    pub mode: Option<DeviceMode>,
    /// Numeric heat mode
    #[serde(default)]
    pub heat_mode_value: Option<i64>,
    /// Gateway request id for this snapshot
    #[serde(default)]
    pub request_id: Option<RequestId>,
    /// Appliance family, e.g. `HEAT_PUMP`
    #[serde(default)]
    pub appliance_type: Option<String>,
    /// Account access level for this appliance
    #[serde(default)]
    pub access_level: Option<i64>,
}
