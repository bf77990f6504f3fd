use serde::{Deserialize, Serialize};

/// Default page size requested from source providers.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Tunables for a sync run.
///
/// Every field has a default, so a config file only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Page size requested from source providers.
    pub page_size: usize,
    /// Building statuses accepted from the tenant directory.
    pub building_statuses: Vec<String>,
    /// Device statuses that exclude a device from import.
    pub excluded_device_statuses: Vec<String>,
    /// Name of the synthesized management interface.
    pub management_interface: String,
    /// Interface name that stands in for an internal aggregation point
    /// when deriving cables.
    pub aggregation_interface: String,
    /// Description given to interfaces created without one.
    pub default_interface_description: String,
    /// Status names used on the target.
    pub statuses: StatusNames,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            building_statuses: vec!["Live Building".to_string()],
            excluded_device_statuses: vec!["decommissioned".to_string(), "unmanaged".to_string()],
            management_interface: "mgmt0".to_string(),
            aggregation_interface: "internal".to_string(),
            default_interface_description: "Interface created by network sync, please validate \
                and update the interface status and remove this notice once complete."
                .to_string(),
            statuses: StatusNames::default(),
        }
    }
}

/// Status names written to the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusNames {
    pub planned: String,
    pub active: String,
    pub retired: String,
    pub connected: String,
}

impl Default for StatusNames {
    fn default() -> Self {
        Self {
            planned: "Planned".to_string(),
            active: "Active".to_string(),
            retired: "Retired".to_string(),
            connected: "Connected".to_string(),
        }
    }
}

impl SyncConfig {
    /// Parses a JSON config; absent keys keep their defaults.
    pub fn from_json(json: &str) -> crate::SyncResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings no run could work with.
    pub fn validate(&self) -> crate::SyncResult<()> {
        if self.page_size == 0 {
            return Err(crate::SyncError::Config("page_size must be at least 1".into()));
        }
        if self.management_interface.is_empty() {
            return Err(crate::SyncError::Config(
                "management_interface must not be empty".into(),
            ));
        }
        if self.management_interface == self.aggregation_interface {
            return Err(crate::SyncError::Config(
                "management and aggregation interface names must differ".into(),
            ));
        }
        Ok(())
    }
}
