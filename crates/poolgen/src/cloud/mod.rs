//! cloud plugins
//!
//! One plugin per provider turns a [PoolSpec] and the image set's images into provider-native
//! launch configurations. Every (location, size) pair the catalog does not offer is dropped; if
//! nothing survives the plugin fails with [Error::ResolutionExhausted].
//!
//! Plugins are selected by the pool's `cloud` key through [Cloud].
mod aws;
mod azure;
mod gcp;
mod static_;

use crate::catalog::Catalog;
use crate::error::Error;
use crate::imageset::ImageSet;
use crate::pool::PoolSpec;
use crate::settings::{WorkerPoolSettings, LAUNCH_CONFIGS};
use crate::value::{Object, Value};

pub use aws::Aws;
pub use azure::Azure;
pub use gcp::Gcp;
pub use static_::Static;

pub trait CloudPlugin: Sync {
    fn build(
        &self,
        spec: &PoolSpec,
        image_set: &ImageSet,
        catalog: &Catalog,
    ) -> Result<WorkerPoolSettings, Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cloud {
    Aws,
    Gcp,
    Azure,
    Static,
}

impl Cloud {
    pub const ALL: [Cloud; 4] = [Cloud::Aws, Cloud::Gcp, Cloud::Azure, Cloud::Static];

    pub fn key(self) -> &'static str {
        match self {
            Cloud::Aws => "aws",
            Cloud::Gcp => "gcp",
            Cloud::Azure => "azure",
            Cloud::Static => "static",
        }
    }

    pub fn plugin(self) -> &'static dyn CloudPlugin {
        match self {
            Cloud::Aws => &Aws,
            Cloud::Gcp => &Gcp,
            Cloud::Azure => &Azure,
            Cloud::Static => &Static,
        }
    }
}

impl std::str::FromStr for Cloud {
    type Err = Error;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        Cloud::ALL
            .into_iter()
            .find(|cloud| cloud.key() == key)
            .ok_or_else(|| Error::UnknownPlugin {
                kind: "cloud",
                key: key.to_string(),
                registered: Cloud::ALL.map(Cloud::key).to_vec(),
            })
    }
}

impl std::fmt::Display for Cloud {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Capacity bounds plus the launch configurations that survived filtering
fn dynamic_config(
    cloud: Cloud,
    (min_capacity, max_capacity): (u32, u32),
    launch_configs: Vec<Value>,
    locations: &[String],
    sizes: impl IntoIterator<Item = impl Into<String>>,
) -> Result<Object, Error> {
    if launch_configs.is_empty() {
        return Err(Error::ResolutionExhausted {
            cloud: cloud.to_string(),
            locations: locations.to_vec(),
            sizes: sizes.into_iter().map(Into::into).collect(),
        });
    }

    tracing::debug!(%cloud, count = launch_configs.len(), "launch configurations built");

    let mut config = Object::new();
    config.insert("minCapacity".into(), min_capacity.into());
    config.insert("maxCapacity".into(), max_capacity.into());
    config.insert(LAUNCH_CONFIGS.into(), Value::Array(launch_configs));
    Ok(config)
}
