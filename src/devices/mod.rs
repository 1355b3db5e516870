use serde::Deserialize;

use crate::errors::ConfigError;

const DEVICES_YAML: &str = include_str!("../../data/devices.yaml");

/// Manufacturer whose model is typed in rather than picked.
pub const OTHER_MANUFACTURER: &str = "Other";

#[derive(Debug, Clone, Deserialize)]
pub struct Manufacturer {
    pub name: String,
    #[serde(default)]
    pub models: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceCatalog {
    manufacturers: Vec<Manufacturer>,
}

impl DeviceCatalog {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_yaml(DEVICES_YAML)
    }

    pub fn from_yaml(src: &str) -> Result<Self, ConfigError> {
        let catalog: DeviceCatalog =
            serde_yaml::from_str(src).map_err(|e| ConfigError::Devices(e.to_string()))?;
        if catalog.manufacturers.is_empty() {
            return Err(ConfigError::Devices("no manufacturers listed".into()));
        }
        if let Some(m) = catalog
            .manufacturers
            .iter()
            .find(|m| m.name != OTHER_MANUFACTURER && m.models.is_empty())
        {
            return Err(ConfigError::Devices(format!("{} has no models", m.name)));
        }
        Ok(catalog)
    }

    pub fn manufacturers(&self) -> impl Iterator<Item = &str> {
        self.manufacturers.iter().map(|m| m.name.as_str())
    }

    /// Known models, or `None` when the model must be typed in.
    pub fn models(&self, manufacturer: &str) -> Option<&[String]> {
        self.manufacturers
            .iter()
            .find(|m| m.name == manufacturer)
            .map(|m| m.models.as_slice())
            .filter(|models| !models.is_empty())
    }
}
