use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Server-assigned id of a monitored host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostId(String);

/// Server-assigned id of a maintenance window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaintenanceId(String);

macro_rules! opaque_id {
    ($name:ident) => {
        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                $name(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Ids come back as JSON strings, but some servers send numbers.
            pub(crate) fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::String(s) if !s.is_empty() => Some($name(s.clone())),
                    Value::Number(n) => Some($name(n.to_string())),
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

opaque_id!(HostId);
opaque_id!(MaintenanceId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePeriod {
    #[serde(deserialize_with = "flexible_i64")]
    pub period: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceTag {
    pub tag: String,
    #[serde(default)]
    pub value: String,
}

/// Payload of `maintenance.create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMaintenance {
    pub name: String,
    pub description: String,
    pub active_since: i64,
    pub active_till: i64,
    pub hostids: Vec<HostId>,
    pub groupids: Vec<String>,
    pub timeperiods: Vec<TimePeriod>,
    pub tags: Vec<MaintenanceTag>,
}

/// A window as returned by `maintenance.get`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Maintenance {
    #[serde(rename = "maintenanceid")]
    pub id: MaintenanceId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub active_since: i64,
    #[serde(deserialize_with = "flexible_i64")]
    pub active_till: i64,
    #[serde(default)]
    pub timeperiods: Vec<TimePeriod>,
    #[serde(default)]
    pub tags: Vec<MaintenanceTag>,
}

// Timestamps and periods arrive as strings ("1700000000") from real servers.
fn flexible_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(n) => Ok(n),
        Raw::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
