//! projects and the worker pools they declare
//!
//! Every `*.yml` file in the projects directory maps project names to projects:
//!
//! ```yaml
//! fuzzing:
//!   workerPools:
//!     ci:
//!       imageset: docker-worker
//!       cloud: gcp
//!       maxCapacity:
//!         by-pool:
//!           ci: 50
//!           default: 5
//! ```
//!
//! Pool `ci` of project `fuzzing` becomes worker pool `proj-fuzzing/ci`. Each top-level field of a
//! pool declaration may be keyed by `project` or `pool`.
use crate::engine::Resolver;
use crate::error::{Error, LoadError};
use crate::keyed_by;
use crate::pool::PoolSpec;
use crate::resources::Resources;
use crate::secret::SecretSource;
use crate::value::{type_name, Object, Value};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Project {
    #[serde(skip)]
    pub name: String,
    /// pool name to raw pool declaration
    #[serde(default)]
    pub worker_pools: IndexMap<String, Value>,
    /// Resources of this project are claimed one by one instead of by prefix
    #[serde(default)]
    pub externally_managed: bool,
}

impl Project {
    pub fn worker_pool_id(&self, pool: &str) -> String {
        format!("proj-{}/{pool}", self.name)
    }

    /// Evaluate keyed-by fields and decode every pool declaration
    pub fn pool_specs(&self) -> Result<Vec<(String, PoolSpec)>, Error> {
        self.worker_pools
            .iter()
            .map(|(pool, declaration)| {
                let worker_pool_id = self.worker_pool_id(pool);
                self.pool_spec(pool, &worker_pool_id, declaration)
                    .map(|spec| (worker_pool_id.clone(), spec))
                    .map_err(|err| err.for_worker_pool(&worker_pool_id))
            })
            .collect()
    }

    fn pool_spec(
        &self,
        pool: &str,
        worker_pool_id: &str,
        declaration: &Value,
    ) -> Result<PoolSpec, Error> {
        let Value::Object(declaration) = declaration else {
            return Err(Error::configuration(
                "workerPools",
                format!("expected an object, found {}", type_name(declaration)),
            ));
        };

        let attributes = HashMap::from([
            ("project".to_string(), self.name.clone()),
            ("pool".to_string(), pool.to_string()),
        ]);

        let mut evaluated = Object::new();
        for (field, value) in declaration {
            let item_name = format!("{field} in {worker_pool_id}");
            evaluated.insert(
                field.clone(),
                keyed_by::evaluate(value, &item_name, &attributes)?,
            );
        }

        let mut spec = PoolSpec::from_value(Value::Object(evaluated))?;
        if spec.description.is_empty() {
            spec.description = format!("Workers for {}", self.name);
        }
        Ok(spec)
    }

    /// Patterns claiming every worker pool resource of this project
    fn patterns(&self) -> [String; 3] {
        let name = regex::escape(&self.name);
        [
            format!("WorkerPool=proj-{name}/.*"),
            format!("Secret=worker-pool:proj-{name}/.*"),
            format!("Role=worker-pool:proj-{name}/.*"),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct Projects {
    projects: IndexMap<String, Project>,
}

impl Projects {
    pub fn get(&self, name: &str) -> Option<&Project> {
        self.projects.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Add the projects of one document; `path` is only used in errors
    pub fn insert_yaml_str(&mut self, yaml: &str, path: &Path) -> Result<(), LoadError> {
        let document: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        let projects: IndexMap<String, Project> = match document {
            serde_yaml::Value::Null => IndexMap::new(),
            serde_yaml::Value::Mapping(_) => serde_yaml::from_value(document)?,
            _ => {
                return Err(LoadError::NotAMapping {
                    path: path.to_path_buf(),
                })
            }
        };

        for (name, mut project) in projects {
            if self.projects.contains_key(&name) {
                return Err(LoadError::DuplicateKey {
                    path: path.to_path_buf(),
                    key: name,
                });
            }
            project.name = name.clone();
            self.projects.insert(name, project);
        }

        Ok(())
    }

    pub fn load_file(&mut self, file_path: &Path) -> Result<(), LoadError> {
        tracing::info!(path=%file_path.display(), "loading file");
        let file_contents = std::fs::read_to_string(file_path)?;
        self.insert_yaml_str(&file_contents, file_path)
    }

    /// Load every `*.yml` file of `dir_path`, in file name order
    pub fn load_directory(dir_path: &Path) -> Result<Self, LoadError> {
        let mut file_paths = Vec::new();

        let read_dir = std::fs::read_dir(dir_path)?;
        for dir_entry in read_dir {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }

            let is_yaml_file = dir_entry.file_name().to_string_lossy().ends_with(".yml");
            if !is_yaml_file {
                continue;
            }

            file_paths.push(dir_entry.path());
        }

        if file_paths.is_empty() {
            return Err(LoadError::NoFilesFound);
        }

        file_paths.sort();

        let mut projects = Self::default();
        for file_path in &file_paths {
            projects.load_file(file_path)?;
        }
        tracing::debug!(count = projects.len(), "projects loaded");
        Ok(projects)
    }
}

/// Resolve every worker pool of every project into `resources`
pub fn update_resources(
    projects: &Projects,
    resolver: &Resolver<'_>,
    secrets: Option<&dyn SecretSource>,
    resources: &mut dyn Resources,
) -> Result<(), Error> {
    for project in projects.iter() {
        if !project.externally_managed {
            for pattern in project.patterns() {
                resources.manage(&pattern)?;
            }
        }

        if project.worker_pools.is_empty() {
            continue;
        }

        for (worker_pool_id, spec) in project.pool_specs()? {
            let resolved = resolver.resolve(&worker_pool_id, &spec, secrets)?;

            for resource in resolved.into_resources() {
                let id = resource.id();
                if project.externally_managed && !resources.is_managed(&id) {
                    resources.manage(&regex::escape(&id))?;
                }
                resources.add(resource)?;
            }
        }

        tracing::info!(project = %project.name, pools = project.worker_pools.len(), "project resolved");
    }

    Ok(())
}

/// Patterns of resources that belong to externally managed projects
pub fn externally_managed_patterns(projects: &Projects) -> Vec<String> {
    projects
        .iter()
        .filter(|project| project.externally_managed)
        .flat_map(|project| project.patterns())
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::catalog::Catalog;
    use crate::imageset::ImageSets;
    use crate::resources::ResourceSet;
    use pretty_assertions::assert_eq;

    const PROJECTS: &str = r#"
fuzzing:
  workerPools:
    ci:
      imageset: docker-worker
      cloud: gcp
      maxCapacity:
        by-pool:
          ci: 50
          nightly-.*: 10
          default: 5
    nightly-linux:
      imageset:
        by-project:
          fuzzing: docker-worker
      cloud: static
      description: nightly fuzzing
hosted:
  externallyManaged: true
"#;

    fn projects() -> Projects {
        let mut projects = Projects::default();
        projects
            .insert_yaml_str(PROJECTS, Path::new("projects.yml"))
            .unwrap();
        projects
    }

    #[test]
    fn pool_specs_evaluate_keyed_by() {
        let projects = projects();
        let specs = projects.get("fuzzing").unwrap().pool_specs().unwrap();

        let ids: Vec<_> = specs.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["proj-fuzzing/ci", "proj-fuzzing/nightly-linux"]);

        let (_, ci) = &specs[0];
        assert_eq!(ci.max_capacity, Some(50));
        assert_eq!(ci.description, "Workers for fuzzing");

        let (_, nightly) = &specs[1];
        assert_eq!(nightly.max_capacity, None);
        assert_eq!(nightly.imageset, "docker-worker");
        assert_eq!(nightly.description, "nightly fuzzing");
    }

    #[test]
    fn unknown_pool_field_names_the_pool() {
        let mut projects = Projects::default();
        projects
            .insert_yaml_str(
                "p:\n  workerPools:\n    a:\n      imageset: x\n      cloud: gcp\n      colud: aws\n",
                Path::new("p.yml"),
            )
            .unwrap();

        let err = projects.get("p").unwrap().pool_specs().unwrap_err();
        assert!(err.to_string().ends_with("proj-p/a"));
        assert!(matches!(err.root(), Error::Configuration { field, .. } if field == "pool"));
    }

    #[test]
    fn duplicate_projects_are_rejected() {
        let mut projects = projects();
        let err = projects
            .insert_yaml_str("hosted: {}\n", Path::new("other.yml"))
            .unwrap_err();
        assert!(matches!(err, LoadError::DuplicateKey { key, .. } if key == "hosted"));
    }

    #[test]
    fn documents_must_be_mappings() {
        let mut projects = Projects::default();
        let err = projects
            .insert_yaml_str("- a\n- b\n", Path::new("list.yml"))
            .unwrap_err();
        assert!(matches!(err, LoadError::NotAMapping { .. }));

        projects.insert_yaml_str("", Path::new("empty.yml")).unwrap();
        assert!(projects.is_empty());
    }

    #[test]
    fn externally_managed() {
        let projects = projects();
        assert_eq!(
            externally_managed_patterns(&projects),
            [
                "WorkerPool=proj-hosted/.*",
                "Secret=worker-pool:proj-hosted/.*",
                "Role=worker-pool:proj-hosted/.*",
            ]
        );
        assert!(projects.get("hosted").unwrap().pool_specs().unwrap().is_empty());
    }

    #[test]
    fn projects_without_pools_still_claim_their_resources() {
        let mut projects = Projects::default();
        projects
            .insert_yaml_str(
                "retired:\n  workerPools: {}\nhosted:\n  externallyManaged: true\n",
                Path::new("retired.yml"),
            )
            .unwrap();

        let image_sets = ImageSets::default();
        let catalog = Catalog::builtin().unwrap();
        let mut resources = ResourceSet::new();
        update_resources(
            &projects,
            &Resolver::new(&image_sets, &catalog),
            None,
            &mut resources,
        )
        .unwrap();

        assert!(resources.is_empty());
        assert!(resources.is_managed("WorkerPool=proj-retired/old"));
        assert!(resources.is_managed("Secret=worker-pool:proj-retired/old"));
        assert!(resources.is_managed("Role=worker-pool:proj-retired/old"));
        assert!(!resources.is_managed("WorkerPool=proj-hosted/old"));
    }
}
