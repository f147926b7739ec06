use super::WorkerImplementation;
use crate::error::Error;
use crate::pool::PoolSpec;
use crate::secret::SecretSource;
use crate::settings::WorkerPoolSettings;
use crate::value::Object;
use serde_json::json;

const SENTRY_SCOPE: &str = "auth:sentry:docker-worker";

#[derive(Debug, Clone, Copy)]
pub struct DockerWorker;

impl WorkerImplementation for DockerWorker {
    fn apply(
        &self,
        settings: &mut WorkerPoolSettings,
        _spec: &PoolSpec,
        _secrets: Option<&dyn SecretSource>,
    ) -> Result<(), Error> {
        if settings.supports_worker_config() {
            let defaults = Object::from_iter([(
                "shutdown".to_string(),
                json!({"enabled": true, "afterIdleSeconds": 900}),
            )]);
            settings.default_worker_config(&defaults)?;
        }

        // rendered by the engine only when secret values are available
        settings.secret_template.insert(
            "config".into(),
            json!({
                "statelessHostname": {
                    "domain": "taskcluster-worker.net",
                    "secret": "$docker-worker-stateless-hostname-secret",
                },
            }),
        );

        settings.scopes.push(SENTRY_SCOPE.to_string());
        Ok(())
    }
}
