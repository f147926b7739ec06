//! Hardware managed outside this tool
//!
//! Static workers register themselves with a shared secret, so there are no images to pick, no
//! launch configurations and no capacity to check.
use super::CloudPlugin;
use crate::catalog::Catalog;
use crate::error::Error;
use crate::imageset::ImageSet;
use crate::pool::PoolSpec;
use crate::settings::WorkerPoolSettings;
use crate::value::Object;
use serde_json::json;

pub const PROVIDER_ID: &str = "static";

/// Seconds a static worker may run before it has to register again
const REREGISTRATION_TIMEOUT: u64 = 86400;

#[derive(Debug, Clone, Copy)]
pub struct Static;

impl CloudPlugin for Static {
    fn build(
        &self,
        _spec: &PoolSpec,
        _image_set: &ImageSet,
        _catalog: &Catalog,
    ) -> Result<WorkerPoolSettings, Error> {
        let mut config = Object::new();
        config.insert(
            "lifecycle".into(),
            json!({"reregistrationTimeout": REREGISTRATION_TIMEOUT}),
        );

        Ok(WorkerPoolSettings::without_worker_config(PROVIDER_ID, config))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn lifecycle_only() {
        let catalog = Catalog::builtin().unwrap();
        let image_set = crate::imageset::ImageSets::from_yaml_str(
            "hw:\n  workerImplementation: generic-worker\n",
        )
        .unwrap()
        .get("hw")
        .unwrap()
        .clone();

        // no maxCapacity needed
        let spec = PoolSpec::new("static", "hw");
        let settings = Static.build(&spec, &image_set, &catalog).unwrap();

        assert_eq!(settings.provider_id, "static");
        assert_eq!(
            Value::Object(settings.config.clone()),
            json!({"lifecycle": {"reregistrationTimeout": 86400}})
        );
        assert!(!settings.supports_worker_config());
    }
}
