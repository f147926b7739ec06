//! image sets
//!
//! An image set bundles the machine images for each cloud with the worker implementation they
//! run and the baseline worker configuration every pool using them starts from.
//!
//! ```yaml
//! docker-worker:
//!   workerImplementation: docker-worker
//!   gcp:
//!     image: projects/taskcluster-imaging/global/images/docker-worker-gcp
//!   aws:
//!     amis:
//!       us-east-1: ami-04ff4e4c220abce54
//!   workerConfig:
//!     shutdown:
//!       enabled: true
//! ```
use crate::error::{Error, LoadError};
use crate::value::Object;
use indexmap::IndexMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ImageSet {
    /// Filled in from the key the image set is stored under
    #[serde(skip)]
    pub name: String,
    pub worker_implementation: String,
    #[serde(default)]
    pub aws: AwsImages,
    #[serde(default)]
    pub gcp: GcpImages,
    #[serde(default)]
    pub azure: AzureImages,
    #[serde(default)]
    pub worker_config: Object,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct AwsImages {
    /// region to AMI id
    #[serde(default)]
    pub amis: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct GcpImages {
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct AzureImages {
    /// used for every location without an entry in `images`
    pub image: Option<String>,
    /// location to image id
    #[serde(default)]
    pub images: IndexMap<String, String>,
}

impl AzureImages {
    pub fn for_location(&self, location: &str) -> Option<&str> {
        self.images
            .get(location)
            .or(self.image.as_ref())
            .map(String::as_str)
    }
}

/// All known image sets, by name
#[derive(Debug, Clone, Default)]
pub struct ImageSets {
    image_sets: IndexMap<String, ImageSet>,
}

impl ImageSets {
    pub fn insert(&mut self, mut image_set: ImageSet, name: impl Into<String>) {
        image_set.name = name.into();
        self.image_sets.insert(image_set.name.clone(), image_set);
    }

    pub fn get(&self, name: &str) -> Result<&ImageSet, Error> {
        self.image_sets
            .get(name)
            .ok_or_else(|| Error::UnknownImageSet(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageSet> {
        self.image_sets.values()
    }

    pub fn len(&self) -> usize {
        self.image_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image_sets.is_empty()
    }
}

impl ImageSets {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, LoadError> {
        let items: IndexMap<String, ImageSet> = serde_yaml::from_str(yaml)?;

        let mut image_sets = Self::default();
        for (name, image_set) in items {
            image_sets.insert(image_set, name);
        }
        Ok(image_sets)
    }

    pub fn load_file(file_path: &Path) -> Result<Self, LoadError> {
        tracing::info!(path=%file_path.display(), "loading image sets");
        let file_contents = std::fs::read_to_string(file_path)?;
        let image_sets = Self::from_yaml_str(&file_contents)?;
        tracing::debug!(count = image_sets.len(), "image sets loaded");
        Ok(image_sets)
    }
}
