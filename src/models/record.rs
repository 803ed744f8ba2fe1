use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Identity payload of a record: unique string keys, values of any shape.
pub type IdentityData = Map<String, Value>;

/// Device lifecycle status as tracked by the record store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    /// Device was admitted and may authenticate
    Accepted,
    /// Device asked to be admitted and awaits a decision
    Pending,
    /// Device was refused
    Rejected,
    /// Device was admitted ahead of its first request
    Preauthorized,
}

impl DeviceStatus {
    /// Every status, in the order status propagation sweeps them.
    pub const ALL: [DeviceStatus; 4] = [
        Self::Accepted,
        Self::Pending,
        Self::Rejected,
        Self::Preauthorized,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Pending => "pending",
            Self::Rejected => "rejected",
            Self::Preauthorized => "preauthorized",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeviceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accepted" => Ok(Self::Accepted),
            "pending" => Ok(Self::Pending),
            "rejected" => Ok(Self::Rejected),
            "preauthorized" => Ok(Self::Preauthorized),
            _ => Err(format!("Invalid device status: {s}")),
        }
    }
}

/// An identity-bearing device record. Read-only to the propagation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub status: DeviceStatus,
    #[serde(default)]
    pub id_data: IdentityData,
}

impl Record {
    pub fn new(id: impl Into<String>, status: DeviceStatus) -> Self {
        Self {
            id: id.into(),
            status,
            id_data: IdentityData::new(),
        }
    }

    /// Add one identity payload entry
    pub fn with_identity(mut self, key: impl Into<String>, value: Value) -> Self {
        self.id_data.insert(key.into(), value);
        self
    }
}
