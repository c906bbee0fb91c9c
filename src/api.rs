//! Data Transfer Objects for the vendor REST API.
//!
//! Field names and the `PGM_xx` weekday mapping are fixed by the BlueLink
//! service; all types derive Serialize/Deserialize for JSON transport.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Credentials posted to the login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginDetails {
    pub username: String,
    pub password: String,
}

/// Token returned by the login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticationKey {
    pub key: String,
}

/// A thermostat registered to the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// The device identifier.
    pub uuid: String,
    pub state_data: StateData,
}

/// The scheduling portion of a device's state: one fixed-width program
/// string per weekday. `PGM_01` is Monday through `PGM_07` Sunday.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateData {
    #[serde(rename = "PGM_01")]
    pub monday: String,
    #[serde(rename = "PGM_02")]
    pub tuesday: String,
    #[serde(rename = "PGM_03")]
    pub wednesday: String,
    #[serde(rename = "PGM_04")]
    pub thursday: String,
    #[serde(rename = "PGM_05")]
    pub friday: String,
    #[serde(rename = "PGM_06")]
    pub saturday: String,
    #[serde(rename = "PGM_07")]
    pub sunday: String,
}

impl StateData {
    /// The program string for `weekday`.
    pub fn program(&self, weekday: Weekday) -> &str {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_data_field_names() {
        let data = StateData {
            monday: "a".to_string(),
            sunday: "g".to_string(),
            ..StateData::default()
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["PGM_01"], "a");
        assert_eq!(json["PGM_07"], "g");
    }

    #[test]
    fn test_device_roundtrip() {
        let json = r#"{
            "uuid": "abc-123",
            "state_data": {
                "PGM_01": "1", "PGM_02": "2", "PGM_03": "3", "PGM_04": "4",
                "PGM_05": "5", "PGM_06": "6", "PGM_07": "7"
            }
        }"#;
        let device: Device = serde_json::from_str(json).unwrap();
        assert_eq!(device.uuid, "abc-123");
        assert_eq!(device.state_data.program(Weekday::Wed), "3");
        assert_eq!(device.state_data.program(Weekday::Sun), "7");
    }
}
