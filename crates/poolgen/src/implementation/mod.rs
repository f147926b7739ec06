//! worker implementation plugins
//!
//! The second stage of resolution: the software running on the machines adds its own worker
//! configuration defaults, scopes and secret template to what the cloud plugin produced.
mod docker_worker;
mod generic_worker;

use crate::error::Error;
use crate::pool::PoolSpec;
use crate::secret::SecretSource;
use crate::settings::WorkerPoolSettings;

pub use docker_worker::DockerWorker;
pub use generic_worker::GenericWorker;

pub trait WorkerImplementation: Sync {
    /// Finish `settings` for this implementation
    ///
    /// Settings without worker configuration support only receive scopes and secret templates.
    fn apply(
        &self,
        settings: &mut WorkerPoolSettings,
        spec: &PoolSpec,
        secrets: Option<&dyn SecretSource>,
    ) -> Result<(), Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Implementation {
    GenericWorker,
    DockerWorker,
}

impl Implementation {
    pub const ALL: [Implementation; 2] = [Implementation::GenericWorker, Implementation::DockerWorker];

    pub fn key(self) -> &'static str {
        match self {
            Implementation::GenericWorker => "generic-worker",
            Implementation::DockerWorker => "docker-worker",
        }
    }

    pub fn plugin(self) -> &'static dyn WorkerImplementation {
        match self {
            Implementation::GenericWorker => &GenericWorker,
            Implementation::DockerWorker => &DockerWorker,
        }
    }
}

impl std::str::FromStr for Implementation {
    type Err = Error;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        Implementation::ALL
            .into_iter()
            .find(|implementation| implementation.key() == key)
            .ok_or_else(|| Error::UnknownPlugin {
                kind: "worker implementation",
                key: key.to_string(),
                registered: Implementation::ALL.map(Implementation::key).to_vec(),
            })
    }
}

impl std::fmt::Display for Implementation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unknown_implementation() {
        let err = "taskcluster-worker".parse::<Implementation>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown worker implementation `taskcluster-worker` (registered: generic-worker, docker-worker)"
        );
        assert_eq!(
            "docker-worker".parse::<Implementation>().unwrap(),
            Implementation::DockerWorker
        );
    }
}
