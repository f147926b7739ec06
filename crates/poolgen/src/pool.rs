//! worker pool declarations
//!
//! What a caller asks for: which cloud and image set, how much capacity, and optionally where,
//! on which sizes and with which worker configuration. Cloud specific fields are ignored by the
//! other clouds; unknown fields are rejected.
use crate::error::Error;
use crate::value::Object;
use indexmap::{IndexMap, IndexSet};

pub const DEFAULT_OWNER: &str = "nobody@mozilla.com";

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PoolSpec {
    pub imageset: String,
    pub cloud: String,
    #[serde(default)]
    pub min_capacity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_capacity: Option<u32>,

    #[serde(default)]
    pub description: String,
    #[serde(default = "default_owner")]
    pub owner: String,
    #[serde(default)]
    pub email_on_error: bool,

    /// Highest precedence worker configuration layer
    #[serde(default)]
    pub worker_config: Object,

    /// aws and gcp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<String>>,

    /// aws: instance type to capacity per instance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_types: Option<IndexMap<String, u32>>,
    /// aws: name of the security group in the catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_group: Option<String>,

    /// gcp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_type: Option<String>,
    /// gcp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_size_gb: Option<u32>,

    /// azure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<String>>,
    /// azure: vm size to capacity per instance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_sizes: Option<IndexMap<String, u32>>,
}

fn default_owner() -> String {
    DEFAULT_OWNER.to_string()
}

impl PoolSpec {
    /// A spec with every optional field at its default
    pub fn new(cloud: impl Into<String>, imageset: impl Into<String>) -> Self {
        Self {
            imageset: imageset.into(),
            cloud: cloud.into(),
            min_capacity: 0,
            max_capacity: None,
            description: String::new(),
            owner: default_owner(),
            email_on_error: false,
            worker_config: Object::new(),
            regions: None,
            instance_types: None,
            security_group: None,
            machine_type: None,
            disk_size_gb: None,
            locations: None,
            vm_sizes: None,
        }
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, Error> {
        serde_json::from_value(value).map_err(|err| Error::configuration("pool", err.to_string()))
    }

    /// `maxCapacity`, checked against `minCapacity`
    pub fn required_max_capacity(&self) -> Result<u32, Error> {
        let max_capacity = match self.max_capacity {
            None => return Err(Error::configuration("maxCapacity", "must give a maxCapacity")),
            Some(0) => {
                return Err(Error::configuration(
                    "maxCapacity",
                    "must be greater than zero",
                ))
            }
            Some(max_capacity) => max_capacity,
        };

        if self.min_capacity > max_capacity {
            return Err(Error::configuration(
                "minCapacity",
                format!(
                    "minCapacity ({}) exceeds maxCapacity ({max_capacity})",
                    self.min_capacity
                ),
            ));
        }

        Ok(max_capacity)
    }
}

/// Sizes to capacity per instance, falling back to `default` when the caller gave none
///
/// An explicitly empty map and zero capacities are rejected.
pub(crate) fn sizing(
    field: &str,
    given: Option<&IndexMap<String, u32>>,
    default: (&str, u32),
) -> Result<IndexMap<String, u32>, Error> {
    let Some(given) = given else {
        return Ok(IndexMap::from([(default.0.to_string(), default.1)]));
    };

    if given.is_empty() {
        return Err(Error::configuration(field, format!("must give {field}")));
    }

    if let Some((size, _)) = given.iter().find(|(_, capacity)| **capacity == 0) {
        return Err(Error::configuration(
            field,
            format!("capacityPerInstance for {size} must be at least 1"),
        ));
    }

    Ok(given.clone())
}

/// Locations the caller asked for without repeats, or `default` when none were given
pub(crate) fn locations(
    field: &str,
    given: Option<&Vec<String>>,
    default: impl FnOnce() -> Vec<String>,
) -> Result<Vec<String>, Error> {
    match given {
        Some(given) if given.is_empty() => {
            Err(Error::configuration(field, format!("must give {field}")))
        }
        Some(given) => Ok(given
            .iter()
            .cloned()
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()),
        None => Ok(default()),
    }
}
