//! shared read caches for image sets and the availability catalog
//!
//! A [Store] is created once by the caller and handed to whatever resolves pools. Each table is
//! loaded on first use and kept for the lifetime of the store.
use crate::cache::LoadOnce;
use crate::catalog::Catalog;
use crate::error::LoadError;
use crate::imageset::ImageSets;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug)]
pub struct Store {
    image_sets_path: PathBuf,
    /// `None` uses the built-in catalog
    catalog_path: Option<PathBuf>,
    image_sets: LoadOnce<ImageSets>,
    catalog: LoadOnce<Catalog>,
}

impl Store {
    pub fn new(image_sets_path: impl Into<PathBuf>, catalog_path: Option<PathBuf>) -> Self {
        Self {
            image_sets_path: image_sets_path.into(),
            catalog_path,
            image_sets: LoadOnce::new(),
            catalog: LoadOnce::new(),
        }
    }

    pub fn image_sets(&self) -> Result<Arc<ImageSets>, LoadError> {
        self.image_sets
            .get_or_try_load(|| ImageSets::load_file(&self.image_sets_path))
    }

    pub fn catalog(&self) -> Result<Arc<Catalog>, LoadError> {
        self.catalog.get_or_try_load(|| match &self.catalog_path {
            Some(path) => Catalog::load_file(path),
            None => Catalog::builtin(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn loads_once_and_retries_failures() {
        let dir = std::env::temp_dir().join(format!("poolgen-store-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("imagesets.yml");
        let _ = std::fs::remove_file(&path);

        let store = Store::new(&path, None);
        assert!(store.image_sets().is_err());

        std::fs::write(&path, "x:\n  workerImplementation: docker-worker\n").unwrap();
        let first = store.image_sets().unwrap();

        // later edits are not picked up
        std::fs::write(&path, "y:\n  workerImplementation: docker-worker\n").unwrap();
        let second = store.image_sets().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.get("x").is_ok());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn builtin_catalog_by_default() {
        let store = Store::new("unused.yml", None);
        let catalog = store.catalog().unwrap();
        assert!(catalog.aws.region("us-east-1").is_some());
    }
}
