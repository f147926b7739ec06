//! resources produced by resolution and the set they are collected in
//!
//! Resources are identified by `Kind=name`. A [Resources] implementation only accepts resources
//! whose id matches a pattern registered with [Resources::manage]; anything managed but never
//! added is expected to be deleted by whoever applies the set.
use crate::error::Error;
use crate::value::{Object, Value};
use indexmap::IndexMap;
use regex::Regex;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerPool {
    pub worker_pool_id: String,
    pub description: String,
    pub owner: String,
    pub email_on_error: bool,
    pub provider_id: String,
    pub config: Object,
}

/// A secret; without content it only reserves the name
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Secret {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub role_id: String,
    pub description: String,
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "kind")]
pub enum Resource {
    WorkerPool(WorkerPool),
    Secret(Secret),
    Role(Role),
}

impl Resource {
    pub fn id(&self) -> String {
        match self {
            Resource::WorkerPool(pool) => format!("WorkerPool={}", pool.worker_pool_id),
            Resource::Secret(secret) => format!("Secret={}", secret.name),
            Resource::Role(role) => format!("Role={}", role.role_id),
        }
    }
}

impl From<WorkerPool> for Resource {
    fn from(value: WorkerPool) -> Self {
        Resource::WorkerPool(value)
    }
}

impl From<Secret> for Resource {
    fn from(value: Secret) -> Self {
        Resource::Secret(value)
    }
}

impl From<Role> for Resource {
    fn from(value: Role) -> Self {
        Resource::Role(value)
    }
}

/// The resource ownership collaborator
pub trait Resources {
    /// Claim every resource whose id matches `pattern`
    fn manage(&mut self, pattern: &str) -> Result<(), Error>;

    /// Declare a desired resource; its id must already be managed
    fn add(&mut self, resource: Resource) -> Result<(), Error>;

    fn is_managed(&self, id: &str) -> bool;
}

/// In-memory [Resources]
#[derive(Debug, Default)]
pub struct ResourceSet {
    /// (pattern as given, anchored regex)
    patterns: Vec<(String, Regex)>,
    resources: IndexMap<String, Resource>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Registered patterns, as given
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|(pattern, _)| pattern.as_str())
    }
}

impl Resources for ResourceSet {
    fn manage(&mut self, pattern: &str) -> Result<(), Error> {
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
            Error::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        tracing::debug!(%pattern, "managing");
        self.patterns.push((pattern.to_string(), regex));
        Ok(())
    }

    fn add(&mut self, resource: Resource) -> Result<(), Error> {
        let id = resource.id();
        if !self.is_managed(&id) {
            return Err(Error::Unmanaged(id));
        }

        match self.resources.get(&id) {
            Some(existing) if existing == &resource => Ok(()),
            Some(_) => Err(Error::ResourceConflict(id)),
            None => {
                self.resources.insert(id, resource);
                Ok(())
            }
        }
    }

    fn is_managed(&self, id: &str) -> bool {
        self.patterns.iter().any(|(_, regex)| regex.is_match(id))
    }
}

impl serde::Serialize for ResourceSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("ResourceSet", 2)?;
        state.serialize_field("managed", &self.patterns().collect::<Vec<_>>())?;
        state.serialize_field("resources", &self.resources.values().collect::<Vec<_>>())?;
        state.end()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn role(role_id: &str, scopes: &[&str]) -> Resource {
        Role {
            role_id: role_id.to_string(),
            description: String::new(),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
        }
        .into()
    }

    #[test]
    fn ids() {
        let secret: Resource = Secret {
            name: "worker-pool:proj-x/a".into(),
            secret: None,
        }
        .into();
        assert_eq!(secret.id(), "Secret=worker-pool:proj-x/a");
        assert_eq!(role("worker-pool:proj-x/a", &[]).id(), "Role=worker-pool:proj-x/a");
    }

    #[test]
    fn patterns_are_anchored() {
        let mut set = ResourceSet::new();
        set.manage("Role=worker-pool:proj-x/.*").unwrap();

        assert!(set.is_managed("Role=worker-pool:proj-x/a"));
        assert!(!set.is_managed("Role=worker-pool:proj-xy/a"));
        assert!(!set.is_managed("XRole=worker-pool:proj-x/a"));
        assert_eq!(set.patterns().collect::<Vec<_>>(), ["Role=worker-pool:proj-x/.*"]);
    }

    #[test]
    fn add_requires_management() {
        let mut set = ResourceSet::new();
        let err = set.add(role("r", &[])).unwrap_err();
        assert!(matches!(err, Error::Unmanaged(id) if id == "Role=r"));
    }

    #[test]
    fn readding_identical_is_fine_but_conflicts_fail() {
        let mut set = ResourceSet::new();
        set.manage("Role=.*").unwrap();

        set.add(role("r", &["a"])).unwrap();
        set.add(role("r", &["a"])).unwrap();
        assert_eq!(set.len(), 1);

        let err = set.add(role("r", &["b"])).unwrap_err();
        assert!(matches!(err, Error::ResourceConflict(id) if id == "Role=r"));
    }

    #[test]
    fn invalid_pattern() {
        let err = ResourceSet::new().manage("Role=(").unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { pattern, .. } if pattern == "Role=("));
    }

    #[test]
    fn serializes_with_kind() {
        let mut set = ResourceSet::new();
        set.manage("Secret=.*").unwrap();
        set.add(
            Secret {
                name: "s".into(),
                secret: None,
            }
            .into(),
        )
        .unwrap();

        assert_eq!(
            serde_json::to_value(&set).unwrap(),
            json!({
                "managed": ["Secret=.*"],
                "resources": [{"kind": "Secret", "name": "s"}],
            })
        );
    }
}
