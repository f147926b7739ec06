//! # poolgen - worker pool configuration generator
//!
//! Turns short worker pool declarations into complete, provider-ready worker pool definitions
//! plus the secret and role each pool needs.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `poolgen` works internally.
//!
//! ### Inputs
//!
//! - **image sets** ([imageset::ImageSets]): named bundles of machine images per cloud, the worker
//!   implementation running on them and a baseline worker configuration
//! - **availability catalog** ([catalog::Catalog]): which instance types, machine families and VM
//!   sizes each region, zone or location offers, with the subnets and security groups to use
//! - **pool specs** ([pool::PoolSpec]): what the caller wants, usually produced from project files
//!   ([project::Projects]) after evaluating keyed-by values ([keyed_by])
//! - **secret values** ([secret::SecretValues]): optional; without them secrets are declared but
//!   left empty
//!
//! ### Resolution
//!
//! see [engine::Resolver::resolve]
//!
//! Resolution runs in two plugin stages that exchange a [settings::WorkerPoolSettings]:
//!
//! 1. a cloud plugin ([cloud::Cloud]) crosses the requested locations with the requested sizes,
//!    drops every pair the catalog does not offer and emits one launch configuration per survivor
//! 2. the pool's and the image set's worker configuration are merged over each launch
//!    configuration ([merge::layered])
//! 3. a worker implementation plugin ([implementation::Implementation]) fills in its defaults,
//!    adds scopes and a secret template, and for generic-worker stamps a deployment id hashed
//!    from the merged launch configurations
//!
//! Precedence is always pool override, then image set, then whatever was already there.
//!
//! **Example**
//!
//! | layer | `workerConfig` |
//! |-------|----------------|
//! | pool | `{shutdown: {afterIdleSeconds: 60}}` |
//! | image set | `{shutdown: {enabled: true}}` |
//! | docker-worker default | `{shutdown: {enabled: true, afterIdleSeconds: 900}}` |
//! | **result** | `{shutdown: {enabled: true, afterIdleSeconds: 60}}` |
//!
//! ### Output
//!
//! A [engine::ResolvedPool] holds the worker pool, the secret named `worker-pool:<workerPoolId>`
//! when the implementation declared a template, and a role of the same name when there are
//! scopes. [project::update_resources] collects them in a [resources::Resources] set.
//!
//! ### Loading
//!
//! Files are read once per [store::Store]; see [cache::LoadOnce].
pub mod cache;
pub mod catalog;
pub mod cloud;
pub mod engine;
pub mod error;
pub mod imageset;
pub mod implementation;
pub mod keyed_by;
pub mod merge;
pub mod pool;
pub mod project;
pub mod resources;
pub mod secret;
pub mod settings;
pub mod store;
pub mod value;

pub use error::{Error, LoadError};
