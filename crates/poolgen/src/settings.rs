//! the value passed from a cloud plugin to a worker implementation plugin
use crate::error::Error;
use crate::merge;
use crate::value::{Object, Value};

pub const LAUNCH_CONFIGS: &str = "launchConfigs";
pub const WORKER_CONFIG: &str = "workerConfig";

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerPoolSettings {
    pub provider_id: String,
    /// Provider configuration; holds `launchConfigs` when worker configuration is supported
    pub config: Object,
    /// Empty means the pool has no secret
    pub secret_template: Object,
    /// Empty means the pool needs no role
    pub scopes: Vec<String>,
    supports_worker_config: bool,
}

impl WorkerPoolSettings {
    /// Settings for a provider that launches instances from `launchConfigs`
    pub fn new(provider_id: impl Into<String>, config: Object) -> Self {
        Self {
            provider_id: provider_id.into(),
            config,
            secret_template: Object::new(),
            scopes: Vec::new(),
            supports_worker_config: true,
        }
    }

    /// Settings for a provider whose machines are managed elsewhere and take no worker
    /// configuration from here
    pub fn without_worker_config(provider_id: impl Into<String>, config: Object) -> Self {
        Self {
            supports_worker_config: false,
            ..Self::new(provider_id, config)
        }
    }

    pub fn supports_worker_config(&self) -> bool {
        self.supports_worker_config
    }

    fn ensure_worker_config(&self) -> Result<(), Error> {
        if self.supports_worker_config {
            Ok(())
        } else {
            Err(Error::WorkerConfigUnsupported {
                provider_id: self.provider_id.clone(),
            })
        }
    }

    pub fn launch_configs(&self) -> Result<&[Value], Error> {
        self.ensure_worker_config()?;
        match self.config.get(LAUNCH_CONFIGS) {
            Some(Value::Array(launch_configs)) => Ok(launch_configs),
            _ => Err(Error::configuration(
                LAUNCH_CONFIGS,
                format!("provider `{}` produced no launch configurations", self.provider_id),
            )),
        }
    }

    fn launch_configs_mut(&mut self) -> Result<&mut Vec<Value>, Error> {
        self.ensure_worker_config()?;
        match self.config.get_mut(LAUNCH_CONFIGS) {
            Some(Value::Array(launch_configs)) => Ok(launch_configs),
            _ => Err(Error::configuration(
                LAUNCH_CONFIGS,
                format!("provider `{}` produced no launch configurations", self.provider_id),
            )),
        }
    }

    /// Replace every launch configuration's worker configuration with `f(existing)`
    fn update_worker_config(&mut self, f: impl Fn(&Object) -> Object) -> Result<(), Error> {
        for launch_config in self.launch_configs_mut()? {
            let Value::Object(launch_config) = launch_config else {
                return Err(Error::configuration(
                    LAUNCH_CONFIGS,
                    "launch configurations must be objects",
                ));
            };

            let merged = match launch_config.get(WORKER_CONFIG) {
                None => f(&Object::new()),
                Some(Value::Object(existing)) => f(existing),
                Some(_) => {
                    return Err(Error::configuration(
                        WORKER_CONFIG,
                        "worker configuration must be an object",
                    ))
                }
            };
            launch_config.insert(WORKER_CONFIG.to_string(), Value::Object(merged));
        }

        Ok(())
    }

    /// Merge `pool_override` and `image_set_default` over each launch configuration's existing
    /// worker configuration, in that order of precedence
    pub fn overlay_worker_config(
        &mut self,
        pool_override: &Object,
        image_set_default: &Object,
    ) -> Result<(), Error> {
        self.update_worker_config(|existing| {
            merge::layered(pool_override, image_set_default, existing)
        })
    }

    /// Fill in `defaults` underneath each launch configuration's existing worker configuration
    pub fn default_worker_config(&mut self, defaults: &Object) -> Result<(), Error> {
        self.update_worker_config(|existing| merge::merge(&[existing, defaults]))
    }
}
