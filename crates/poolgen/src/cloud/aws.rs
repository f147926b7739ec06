//! EC2 spot instances
//!
//! A location is an availability zone of a region; each zone has its own subnet. Pools deploy to
//! every region the image set has an AMI for unless `regions` says otherwise.
use super::{dynamic_config, Cloud, CloudPlugin};
use crate::catalog::Catalog;
use crate::error::Error;
use crate::imageset::ImageSet;
use crate::pool::{self, PoolSpec};
use crate::settings::WorkerPoolSettings;
use serde_json::json;

pub const PROVIDER_ID: &str = "community-tc-workers-aws";

const DEFAULT_INSTANCE_TYPE: (&str, u32) = ("m5.large", 1);
const DEFAULT_SECURITY_GROUP: &str = "no-inbound";

/// (availability zone, instance type) pairs that fail to launch whatever the catalog says
const INCOMPATIBLE: &[(&str, &str)] = &[("us-east-1a", "m3.2xlarge")];

#[derive(Debug, Clone, Copy)]
pub struct Aws;

impl CloudPlugin for Aws {
    fn build(
        &self,
        spec: &PoolSpec,
        image_set: &ImageSet,
        catalog: &Catalog,
    ) -> Result<WorkerPoolSettings, Error> {
        let max_capacity = spec.required_max_capacity()?;
        let instance_types = pool::sizing(
            "instanceTypes",
            spec.instance_types.as_ref(),
            DEFAULT_INSTANCE_TYPE,
        )?;

        let amis = &image_set.aws.amis;
        if amis.is_empty() {
            return Err(Error::configuration(
                "aws.amis",
                format!("image set `{}` has no AMIs", image_set.name),
            ));
        }

        let regions = pool::locations("regions", spec.regions.as_ref(), || {
            amis.keys().cloned().collect()
        })?;
        let security_group = spec
            .security_group
            .as_deref()
            .unwrap_or(DEFAULT_SECURITY_GROUP);

        let mut zones = Vec::new();
        let mut launch_configs = Vec::new();

        for region in &regions {
            let image_id = amis.get(region).ok_or_else(|| {
                Error::configuration(
                    "aws.amis",
                    format!("image set `{}` has no AMI for {region}", image_set.name),
                )
            })?;
            let details = catalog.aws.region(region).ok_or_else(|| {
                Error::configuration("regions", format!("unknown aws region {region}"))
            })?;
            let group_id = details.security_group(security_group).ok_or_else(|| {
                Error::configuration(
                    "securityGroup",
                    format!("no security group `{security_group}` in {region}"),
                )
            })?;

            for (availability_zone, zone) in &details.zones {
                zones.push(availability_zone.clone());

                for (instance_type, capacity_per_instance) in &instance_types {
                    if !zone.offers(instance_type) {
                        tracing::debug!(%availability_zone, %instance_type, "not offered, skipping");
                        continue;
                    }

                    if INCOMPATIBLE.contains(&(availability_zone.as_str(), instance_type.as_str())) {
                        tracing::debug!(%availability_zone, %instance_type, "known incompatible, skipping");
                        continue;
                    }

                    launch_configs.push(json!({
                        "capacityPerInstance": capacity_per_instance,
                        "region": region,
                        "launchConfig": {
                            "ImageId": image_id,
                            "Placement": {"AvailabilityZone": availability_zone},
                            "SubnetId": zone.subnet,
                            "SecurityGroupIds": [group_id],
                            "InstanceType": instance_type,
                            "InstanceMarketOptions": {"MarketType": "spot"},
                        },
                        "workerConfig": {},
                    }));
                }
            }
        }

        let config = dynamic_config(
            Cloud::Aws,
            (spec.min_capacity, max_capacity),
            launch_configs,
            &zones,
            instance_types.keys().cloned(),
        )?;

        Ok(WorkerPoolSettings::new(PROVIDER_ID, config))
    }
}
