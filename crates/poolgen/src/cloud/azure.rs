//! Azure spot virtual machines
//!
//! A location is an Azure location. Image sets may give one image for every location, one per
//! location, or both; by default pools deploy wherever an image is available.
use super::{dynamic_config, Cloud, CloudPlugin};
use crate::catalog::Catalog;
use crate::error::Error;
use crate::imageset::ImageSet;
use crate::pool::{self, PoolSpec};
use crate::settings::WorkerPoolSettings;
use serde_json::json;

pub const PROVIDER_ID: &str = "community-tc-workers-azure";

const DEFAULT_VM_SIZE: (&str, u32) = ("Standard_D2s_v3", 1);

#[derive(Debug, Clone, Copy)]
pub struct Azure;

impl CloudPlugin for Azure {
    fn build(
        &self,
        spec: &PoolSpec,
        image_set: &ImageSet,
        catalog: &Catalog,
    ) -> Result<WorkerPoolSettings, Error> {
        let max_capacity = spec.required_max_capacity()?;
        let vm_sizes = pool::sizing("vmSizes", spec.vm_sizes.as_ref(), DEFAULT_VM_SIZE)?;

        let images = &image_set.azure;
        if images.image.is_none() && images.images.is_empty() {
            return Err(Error::configuration(
                "azure.image",
                format!("image set `{}` has no azure image", image_set.name),
            ));
        }

        let locations = pool::locations("locations", spec.locations.as_ref(), || {
            match images.image {
                Some(_) => catalog.azure.locations.keys().cloned().collect(),
                None => images.images.keys().cloned().collect(),
            }
        })?;

        let mut launch_configs = Vec::new();

        for location in &locations {
            let image = images.for_location(location).ok_or_else(|| {
                Error::configuration(
                    "azure.images",
                    format!("image set `{}` has no image for {location}", image_set.name),
                )
            })?;
            let details = catalog.azure.location(location).ok_or_else(|| {
                Error::configuration("locations", format!("unknown azure location {location}"))
            })?;

            for (vm_size, capacity_per_instance) in &vm_sizes {
                if !details.offers(vm_size) {
                    tracing::debug!(%location, %vm_size, "not offered, skipping");
                    continue;
                }

                launch_configs.push(json!({
                    "capacityPerInstance": capacity_per_instance,
                    "location": location,
                    "subnetId": details.subnet_id,
                    "hardwareProfile": {"vmSize": vm_size},
                    "storageProfile": {
                        "imageReference": {"id": image},
                        "osDisk": {
                            "caching": "ReadOnly",
                            "createOption": "FromImage",
                            "managedDisk": {"storageAccountType": "Premium_LRS"},
                        },
                    },
                    "priority": "spot",
                    "evictionPolicy": "Delete",
                    "billingProfile": {"maxPrice": -1},
                    "workerConfig": {},
                }));
            }
        }

        let config = dynamic_config(
            Cloud::Azure,
            (spec.min_capacity, max_capacity),
            launch_configs,
            &locations,
            vm_sizes.keys().cloned(),
        )?;

        Ok(WorkerPoolSettings::new(PROVIDER_ID, config))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::imageset::ImageSets;
    use crate::settings::LAUNCH_CONFIGS;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn image_set(yaml: &str) -> ImageSet {
        ImageSets::from_yaml_str(yaml)
            .unwrap()
            .get("win")
            .unwrap()
            .clone()
    }

    fn spec(vm_sizes: &[(&str, u32)]) -> PoolSpec {
        let mut spec = PoolSpec::new("azure", "win");
        spec.max_capacity = Some(3);
        spec.vm_sizes = Some(
            vm_sizes
                .iter()
                .map(|(size, capacity)| (size.to_string(), *capacity))
                .collect::<IndexMap<_, _>>(),
        );
        spec
    }

    fn pairs(settings: &WorkerPoolSettings) -> Vec<String> {
        settings.config[LAUNCH_CONFIGS]
            .as_array()
            .unwrap()
            .iter()
            .map(|lc| {
                format!(
                    "{}/{}",
                    lc["location"].as_str().unwrap(),
                    lc["hardwareProfile"]["vmSize"].as_str().unwrap()
                )
            })
            .collect()
    }

    #[test]
    fn per_location_images_choose_locations() {
        let image_set = image_set(
            "win:\n  workerImplementation: generic-worker\n  azure:\n    images:\n      eastus: /img/east\n      westus2: /img/west\n",
        );
        let catalog = Catalog::builtin().unwrap();

        let settings = Azure
            .build(
                &spec(&[("Standard_D8s_v3", 1), ("Standard_F8s_v2", 2)]),
                &image_set,
                &catalog,
            )
            .unwrap();

        assert_eq!(settings.provider_id, PROVIDER_ID);
        assert_eq!(
            pairs(&settings),
            [
                "eastus/Standard_D8s_v3",
                "eastus/Standard_F8s_v2",
                "westus2/Standard_F8s_v2",
            ]
        );

        let west = &settings.config[LAUNCH_CONFIGS][2];
        assert_eq!(west["storageProfile"]["imageReference"]["id"], "/img/west");
        assert_eq!(west["capacityPerInstance"], 2);
        assert!(west["subnetId"].as_str().unwrap().ends_with("sn-west-us-2"));
    }

    #[test]
    fn single_image_covers_every_catalog_location() {
        let image_set = image_set(
            "win:\n  workerImplementation: generic-worker\n  azure:\n    image: /img/all\n",
        );
        let catalog = Catalog::builtin().unwrap();

        let settings = Azure.build(&spec(&[("Standard_D2s_v3", 1)]), &image_set, &catalog).unwrap();
        assert_eq!(
            pairs(&settings),
            [
                "centralus/Standard_D2s_v3",
                "eastus/Standard_D2s_v3",
                "westus2/Standard_D2s_v3",
            ]
        );
    }

    #[test]
    fn gpu_size_only_in_one_location() {
        let image_set = image_set(
            "win:\n  workerImplementation: generic-worker\n  azure:\n    image: /img/all\n",
        );
        let catalog = Catalog::builtin().unwrap();

        let mut spec = spec(&[("Standard_NC4as_T4_v3", 1)]);
        let settings = Azure.build(&spec, &image_set, &catalog).unwrap();
        assert_eq!(pairs(&settings), ["eastus/Standard_NC4as_T4_v3"]);

        spec.locations = Some(vec!["westus2".into(), "centralus".into()]);
        let err = Azure.build(&spec, &image_set, &catalog).unwrap_err();
        assert!(matches!(
            err,
            Error::ResolutionExhausted { ref locations, .. } if locations == &["westus2", "centralus"]
        ));
    }
}
