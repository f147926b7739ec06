//! worker pool resolution
//!
//! [Resolver::resolve] runs one pool through the whole pipeline:
//!
//! 1. look up the image set
//! 2. build provider settings with the cloud plugin
//! 3. layer the pool's and the image set's worker configuration over what the cloud produced
//! 4. let the worker implementation add its defaults, scopes and secret template
//! 5. turn the settings into a worker pool, an optional secret and an optional role
//!
//! Any failure is wrapped in [Error::WorkerPool] and nothing partial is returned.
use crate::catalog::Catalog;
use crate::cloud::Cloud;
use crate::error::Error;
use crate::imageset::ImageSets;
use crate::implementation::Implementation;
use crate::pool::PoolSpec;
use crate::resources::{Resource, Role, Secret, WorkerPool};
use crate::secret::{self, SecretSource};
use crate::settings::WorkerPoolSettings;

/// The resources one pool resolves to
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPool {
    pub worker_pool: WorkerPool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl ResolvedPool {
    /// Turn the final settings into resources
    ///
    /// A secret exists only when the template is non-empty, and its content only when `secrets`
    /// is given. A role exists only when there are scopes.
    pub fn from_settings(
        worker_pool_id: &str,
        spec: &PoolSpec,
        settings: WorkerPoolSettings,
        secrets: Option<&dyn SecretSource>,
    ) -> Result<Self, Error> {
        let name = worker_pool_secret_name(worker_pool_id);

        let secret = if settings.secret_template.is_empty() {
            None
        } else {
            let content = match secrets {
                Some(source) => Some(secret::render(&settings.secret_template, Some(source))?),
                None => {
                    tracing::debug!("no secret values, secret declared without content");
                    None
                }
            };
            Some(Secret {
                name: name.clone(),
                secret: content,
            })
        };

        let role = (!settings.scopes.is_empty()).then(|| Role {
            role_id: name,
            description: format!(
                "Scopes for image set `{}` and cloud `{}`.",
                spec.imageset, spec.cloud
            ),
            scopes: settings.scopes,
        });

        let worker_pool = WorkerPool {
            worker_pool_id: worker_pool_id.to_string(),
            description: spec.description.clone(),
            owner: spec.owner.clone(),
            email_on_error: spec.email_on_error,
            provider_id: settings.provider_id,
            config: settings.config,
        };

        Ok(ResolvedPool {
            worker_pool,
            secret,
            role,
        })
    }

    pub fn into_resources(self) -> impl Iterator<Item = Resource> {
        std::iter::once(self.worker_pool.into())
            .chain(self.secret.map(Resource::from))
            .chain(self.role.map(Resource::from))
    }
}

/// Name of the secret and of the role belonging to a worker pool
pub fn worker_pool_secret_name(worker_pool_id: &str) -> String {
    format!("worker-pool:{worker_pool_id}")
}

/// Resolves pool specs against loaded image sets and an availability catalog
///
/// Holds only shared references, so one resolver can serve many threads.
#[derive(Debug, Clone, Copy, derive_new::new)]
pub struct Resolver<'a> {
    image_sets: &'a ImageSets,
    catalog: &'a Catalog,
}

impl Resolver<'_> {
    #[tracing::instrument(skip_all, fields(worker_pool_id = %worker_pool_id))]
    pub fn resolve(
        &self,
        worker_pool_id: &str,
        spec: &PoolSpec,
        secrets: Option<&dyn SecretSource>,
    ) -> Result<ResolvedPool, Error> {
        self.try_resolve(worker_pool_id, spec, secrets)
            .map_err(|err| err.for_worker_pool(worker_pool_id))
    }

    fn try_resolve(
        &self,
        worker_pool_id: &str,
        spec: &PoolSpec,
        secrets: Option<&dyn SecretSource>,
    ) -> Result<ResolvedPool, Error> {
        let image_set = self.image_sets.get(&spec.imageset)?;
        let cloud: Cloud = spec.cloud.parse()?;
        let implementation: Implementation = image_set.worker_implementation.parse()?;
        if cloud != Cloud::Static {
            spec.required_max_capacity()?;
        }
        tracing::debug!(%cloud, %implementation, imageset = %image_set.name, "dispatching");

        let mut settings = cloud.plugin().build(spec, image_set, self.catalog)?;

        if settings.supports_worker_config() {
            settings.overlay_worker_config(&spec.worker_config, &image_set.worker_config)?;
        }

        implementation
            .plugin()
            .apply(&mut settings, spec, secrets)?;

        ResolvedPool::from_settings(worker_pool_id, spec, settings, secrets)
    }
}
