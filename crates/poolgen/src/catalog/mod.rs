//! availability catalogs
//!
//! Static data describing which instance sizes each cloud offers where, and the network
//! identifiers launch configurations need. The built-in catalog is embedded in the binary;
//! [Catalog::load_file] replaces it with a file of the same shape.
//!
//! Lookups are plain set membership: a size missing from a location's list is not offered there.
use crate::error::LoadError;
use indexmap::IndexMap;
use std::path::Path;

const BUILTIN: &str = include_str!("builtin.yml");

#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    #[serde(default)]
    pub aws: AwsCatalog,
    #[serde(default)]
    pub gcp: GcpCatalog,
    #[serde(default)]
    pub azure: AzureCatalog,
}

impl Catalog {
    /// The catalog embedded at build time
    pub fn builtin() -> Result<Self, LoadError> {
        Self::from_yaml_str(BUILTIN)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, LoadError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load_file(file_path: &Path) -> Result<Self, LoadError> {
        tracing::info!(path=%file_path.display(), "loading catalog");
        let file_contents = std::fs::read_to_string(file_path)?;
        Self::from_yaml_str(&file_contents)
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct AwsCatalog {
    pub regions: IndexMap<String, AwsRegion>,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AwsRegion {
    /// security group name to id
    #[serde(default)]
    pub security_groups: IndexMap<String, String>,
    /// availability zone to zone details
    pub zones: IndexMap<String, AwsZone>,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AwsZone {
    pub subnet: String,
    #[serde(default)]
    pub instance_types: Vec<String>,
}

impl AwsCatalog {
    pub fn region(&self, region: &str) -> Option<&AwsRegion> {
        self.regions.get(region)
    }
}

impl AwsRegion {
    pub fn security_group(&self, name: &str) -> Option<&str> {
        self.security_groups.get(name).map(String::as_str)
    }
}

impl AwsZone {
    pub fn offers(&self, instance_type: &str) -> bool {
        self.instance_types.iter().any(|offered| offered == instance_type)
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct GcpCatalog {
    /// region to zone to machine families offered in that zone
    pub regions: IndexMap<String, IndexMap<String, Vec<String>>>,
}

impl GcpCatalog {
    pub fn zones(&self, region: &str) -> Option<impl Iterator<Item = &str>> {
        self.regions
            .get(region)
            .map(|zones| zones.keys().map(String::as_str))
    }

    /// Whether `machine_type` (e.g. `n2-standard-4`) is offered in `zone`
    ///
    /// Availability is tracked per machine family, the part before the first `-`.
    pub fn offers(&self, zone: &str, machine_type: &str) -> bool {
        let family = machine_type.split('-').next().unwrap_or(machine_type);
        self.regions
            .values()
            .filter_map(|zones| zones.get(zone))
            .any(|families| families.iter().any(|offered| offered == family))
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct AzureCatalog {
    pub locations: IndexMap<String, AzureLocation>,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AzureLocation {
    pub subnet_id: String,
    #[serde(default)]
    pub vm_sizes: Vec<String>,
}

impl AzureCatalog {
    pub fn location(&self, location: &str) -> Option<&AzureLocation> {
        self.locations.get(location)
    }
}

impl AzureLocation {
    pub fn offers(&self, vm_size: &str) -> bool {
        self.vm_sizes.iter().any(|offered| offered == vm_size)
    }
}
