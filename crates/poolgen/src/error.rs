//! error taxonomy
//!
//! Everything the resolution pipeline can fail with is a variant of [Error]. Plugins return the
//! specific variant; the engine wraps it in [Error::WorkerPool] so the caller learns which pool
//! failed while the original cause stays reachable through [std::error::Error::source].
//!
//! File loading is kept apart in [LoadError] because it happens before any pool is resolved.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A required field is missing or holds an invalid value
    #[error("invalid configuration for `{field}`: {message}")]
    Configuration { field: String, message: String },

    /// Availability filtering removed every candidate launch configuration
    #[error(
        "no available launch configurations for cloud `{cloud}`: none of [{}] is offered in any of [{}]",
        .sizes.join(", "),
        .locations.join(", ")
    )]
    ResolutionExhausted {
        cloud: String,
        locations: Vec<String>,
        sizes: Vec<String>,
    },

    #[error("unknown {kind} `{key}` (registered: {})", .registered.join(", "))]
    UnknownPlugin {
        kind: &'static str,
        key: String,
        registered: Vec<&'static str>,
    },

    #[error("unknown image set `{0}`")]
    UnknownImageSet(String),

    /// A secret template referenced a name the secret source does not define
    #[error("secret `{name}` is not defined")]
    SecretRender { name: String },

    #[error("secret template rendered without a secret source")]
    SecretSourceMissing,

    #[error("{0}")]
    KeyedBy(String),

    /// The cloud plugin declared that its launch configurations take no worker configuration
    #[error("provider `{provider_id}` does not support worker configuration")]
    WorkerConfigUnsupported { provider_id: String },

    #[error("resource `{0}` is not managed")]
    Unmanaged(String),

    #[error("resource `{0}` was added twice with different content")]
    ResourceConflict(String),

    #[error("invalid resource pattern `{pattern}`")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("error generating worker pool configuration for {worker_pool_id}")]
    WorkerPool {
        worker_pool_id: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Attach the id of the pool being resolved
    pub fn for_worker_pool(self, worker_pool_id: &str) -> Self {
        Error::WorkerPool {
            worker_pool_id: worker_pool_id.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping [Error::WorkerPool] wrappers
    pub fn root(&self) -> &Error {
        match self {
            Error::WorkerPool { source, .. } => source.root(),
            other => other,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("No files found in directory")]
    NoFilesFound,
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse yaml file")]
    YamlParseFailed(#[from] serde_yaml::Error),
    #[error("{path}: is not a YAML mapping")]
    NotAMapping { path: std::path::PathBuf },
    #[error("{path}: another file already defined key `{key}`")]
    DuplicateKey {
        path: std::path::PathBuf,
        key: String,
    },
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wrapped_error_keeps_cause() {
        let err = Error::configuration("maxCapacity", "must be given")
            .for_worker_pool("proj-x/pool1");

        assert_eq!(
            err.to_string(),
            "error generating worker pool configuration for proj-x/pool1"
        );

        let source = std::error::Error::source(&err).expect("cause must be kept");
        assert_eq!(
            source.to_string(),
            "invalid configuration for `maxCapacity`: must be given"
        );
        assert!(matches!(err.root(), Error::Configuration { field, .. } if field == "maxCapacity"));
    }

    #[test]
    fn exhausted_names_locations_and_sizes() {
        let err = Error::ResolutionExhausted {
            cloud: "aws".into(),
            locations: vec!["us-east-1a".into(), "us-east-1b".into()],
            sizes: vec!["x1.huge".into()],
        };

        let message = err.to_string();
        assert!(message.contains("us-east-1a, us-east-1b"));
        assert!(message.contains("x1.huge"));
    }
}
