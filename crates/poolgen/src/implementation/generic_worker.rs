use super::WorkerImplementation;
use crate::error::Error;
use crate::pool::PoolSpec;
use crate::secret::SecretSource;
use crate::settings::{WorkerPoolSettings, LAUNCH_CONFIGS, WORKER_CONFIG};
use crate::value::{get_path, Canonical, Object, Value};
use serde_json::json;
use sha2::{Digest, Sha256};

const DEFAULT_SENTRY_PROJECT: &str = "generic-worker";

/// hex characters of the digest kept as the deployment id
const DEPLOYMENT_ID_LEN: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct GenericWorker;

fn defaults() -> Object {
    Object::from_iter([(
        "genericWorker".to_string(),
        json!({
            "config": {
                "sentryProject": DEFAULT_SENTRY_PROJECT,
                "wstAudience": "communitytc",
                "wstServerURL": "https://community-websocktunnel.services.mozilla.com",
            },
        }),
    )])
}

/// Identifies the launch configurations as a whole; workers restart when it changes
pub fn deployment_id(launch_configs: &[Value]) -> Result<String, Error> {
    let canonical = Canonical(&Value::Array(launch_configs.to_vec()))
        .to_json()
        .map_err(|err| Error::configuration(LAUNCH_CONFIGS, err.to_string()))?;
    let digest = Sha256::digest(canonical.as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(DEPLOYMENT_ID_LEN);
    Ok(id)
}

impl WorkerImplementation for GenericWorker {
    fn apply(
        &self,
        settings: &mut WorkerPoolSettings,
        _spec: &PoolSpec,
        _secrets: Option<&dyn SecretSource>,
    ) -> Result<(), Error> {
        let mut sentry_project = DEFAULT_SENTRY_PROJECT.to_string();

        if settings.supports_worker_config() {
            settings.default_worker_config(&defaults())?;

            let launch_configs = settings.launch_configs()?;
            let deployment_id = deployment_id(launch_configs)?;
            tracing::debug!(%deployment_id, "deployment id");

            if let Some(Value::String(project)) = launch_configs.first().and_then(|lc| {
                get_path(lc, &[WORKER_CONFIG, "genericWorker", "config", "sentryProject"])
            }) {
                sentry_project = project.clone();
            }

            let stamp = Object::from_iter([(
                "genericWorker".to_string(),
                json!({"config": {"deploymentId": deployment_id}}),
            )]);
            settings.overlay_worker_config(&stamp, &Object::new())?;
        }

        settings.scopes.push(format!("auth:sentry:{sentry_project}"));
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn settings(worker_configs: &[Value]) -> WorkerPoolSettings {
        let launch_configs: Vec<_> = worker_configs
            .iter()
            .enumerate()
            .map(|(i, wc)| json!({"zone": format!("z{i}"), "workerConfig": wc}))
            .collect();
        let Value::Object(config) = json!({"maxCapacity": 1, "launchConfigs": launch_configs})
        else {
            unreachable!()
        };
        WorkerPoolSettings::new("provider", config)
    }

    fn apply(settings: &mut WorkerPoolSettings) {
        GenericWorker
            .apply(settings, &PoolSpec::new("gcp", "x"), None)
            .unwrap();
    }

    #[test]
    fn defaults_underneath_and_same_id_everywhere() {
        let mut settings = settings(&[
            json!({"genericWorker": {"config": {"wstAudience": "custom"}}}),
            json!({}),
        ]);
        apply(&mut settings);

        let launch_configs = settings.launch_configs().unwrap();
        let first = &launch_configs[0]["workerConfig"]["genericWorker"]["config"];
        let second = &launch_configs[1]["workerConfig"]["genericWorker"]["config"];

        assert_eq!(first["wstAudience"], "custom");
        assert_eq!(second["wstAudience"], "communitytc");
        assert_eq!(first["sentryProject"], "generic-worker");

        let id = first["deploymentId"].as_str().unwrap();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(second["deploymentId"], first["deploymentId"]);

        assert_eq!(settings.scopes, ["auth:sentry:generic-worker"]);
        assert!(settings.secret_template.is_empty());
    }

    #[test]
    fn id_follows_content() {
        let mut a = settings(&[json!({"x": 1})]);
        let mut b = settings(&[json!({"x": 1})]);
        let mut c = settings(&[json!({"x": 2})]);
        apply(&mut a);
        apply(&mut b);
        apply(&mut c);

        let id = |s: &WorkerPoolSettings| {
            s.launch_configs().unwrap()[0]["workerConfig"]["genericWorker"]["config"]
                ["deploymentId"]
                .clone()
        };
        assert_eq!(id(&a), id(&b));
        assert_ne!(id(&a), id(&c));
    }

    #[test]
    fn id_ignores_key_order() {
        assert_eq!(
            deployment_id(&[json!({"a": 1, "b": {"c": 2, "d": 3}})]).unwrap(),
            deployment_id(&[json!({"b": {"d": 3, "c": 2}, "a": 1})]).unwrap()
        );
    }

    #[test]
    fn sentry_project_from_config() {
        let mut settings =
            settings(&[json!({"genericWorker": {"config": {"sentryProject": "win-workers"}}})]);
        apply(&mut settings);
        assert_eq!(settings.scopes, ["auth:sentry:win-workers"]);
    }

    #[test]
    fn static_settings_only_get_the_scope() {
        let mut settings = WorkerPoolSettings::without_worker_config("static", Object::new());
        apply(&mut settings);

        assert!(settings.config.is_empty());
        assert_eq!(settings.scopes, ["auth:sentry:generic-worker"]);
    }
}
