//! Google Compute Engine instances
//!
//! The image is global, so pools deploy to every catalog region unless `regions` narrows it. A
//! location is a zone; the machine type is addressed relative to it.
use super::{dynamic_config, Cloud, CloudPlugin};
use crate::catalog::Catalog;
use crate::error::Error;
use crate::imageset::ImageSet;
use crate::pool::{self, PoolSpec};
use crate::settings::WorkerPoolSettings;
use serde_json::json;

pub const PROVIDER_ID: &str = "community-tc-workers-google";

const DEFAULT_MACHINE_TYPE: &str = "n1-standard-4";
const DEFAULT_DISK_SIZE_GB: u32 = 50;

#[derive(Debug, Clone, Copy)]
pub struct Gcp;

impl CloudPlugin for Gcp {
    fn build(
        &self,
        spec: &PoolSpec,
        image_set: &ImageSet,
        catalog: &Catalog,
    ) -> Result<WorkerPoolSettings, Error> {
        let max_capacity = spec.required_max_capacity()?;

        let machine_type = spec.machine_type.as_deref().unwrap_or(DEFAULT_MACHINE_TYPE);
        if machine_type.is_empty() {
            return Err(Error::configuration("machineType", "must not be empty"));
        }
        let disk_size_gb = spec.disk_size_gb.unwrap_or(DEFAULT_DISK_SIZE_GB);

        let image = image_set.gcp.image.as_deref().ok_or_else(|| {
            Error::configuration(
                "gcp.image",
                format!("image set `{}` has no gcp image", image_set.name),
            )
        })?;

        let regions = pool::locations("regions", spec.regions.as_ref(), || {
            catalog.gcp.regions.keys().cloned().collect()
        })?;

        let mut zones = Vec::new();
        let mut launch_configs = Vec::new();

        for region in &regions {
            let region_zones = catalog.gcp.zones(region).ok_or_else(|| {
                Error::configuration("regions", format!("unknown gcp region {region}"))
            })?;

            for zone in region_zones {
                zones.push(zone.to_string());

                if !catalog.gcp.offers(zone, machine_type) {
                    tracing::debug!(%zone, %machine_type, "not offered, skipping");
                    continue;
                }

                launch_configs.push(json!({
                    "capacityPerInstance": 1,
                    "machineType": format!("zones/{zone}/machineTypes/{machine_type}"),
                    "region": region,
                    "zone": zone,
                    "scheduling": {"onHostMaintenance": "terminate"},
                    "disks": [{
                        "type": "PERSISTENT",
                        "boot": true,
                        "autoDelete": true,
                        "initializeParams": {
                            "sourceImage": image,
                            "diskSizeGb": disk_size_gb,
                        },
                    }],
                    "networkInterfaces": [{
                        "accessConfigs": [{"type": "ONE_TO_ONE_NAT"}],
                    }],
                    "workerConfig": {},
                }));
            }
        }

        let config = dynamic_config(
            Cloud::Gcp,
            (spec.min_capacity, max_capacity),
            launch_configs,
            &zones,
            [machine_type],
        )?;

        Ok(WorkerPoolSettings::new(PROVIDER_ID, config))
    }
}
