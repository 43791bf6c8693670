use serde::{Deserialize, Serialize};

pub const DATA_PREFIX: &str = "location_";
pub const ERROR_PREFIX: &str = "error_";

/// Per-device storage partition names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partitions {
    pub device_id: String,
    pub data: String,
    pub errors: String,
}

impl Partitions {
    /// The identifier is used verbatim as the suffix.
    pub fn for_device(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            data: format!("{DATA_PREFIX}{device_id}"),
            errors: format!("{ERROR_PREFIX}{device_id}"),
        }
    }
}
