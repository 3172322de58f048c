//! PMB reference tables: file-backed, loaded once per process, immutable
//! thereafter. `ReferenceStore` memoizes the loaded snapshot and hands out
//! shared references; `reload()` is the only refresh path.

pub mod loader;

pub use loader::*;

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::models::{Condition, IcdCode, Medicine, Treatment};

/// The three in-memory reference tables, union of both category files each.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub conditions: Vec<Condition>,
    pub treatments: Vec<Treatment>,
    pub medicines: Vec<Medicine>,
}

impl ReferenceData {
    /// Selection-time ICD projection, derived 1:1 from conditions.
    pub fn icd_codes(&self) -> Vec<IcdCode> {
        self.conditions.iter().map(IcdCode::from).collect()
    }
}

/// Memoizing owner of the reference snapshot.
pub struct ReferenceStore {
    dir: PathBuf,
    cached: RwLock<Option<Arc<ReferenceData>>>,
}

impl ReferenceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cached: RwLock::new(None),
        }
    }

    /// The store rooted at the configured reference-data directory.
    pub fn at_default_location() -> Self {
        Self::new(crate::config::reference_data_dir())
    }

    /// Return the cached snapshot, loading it on first use.
    pub fn get_or_load(&self) -> Arc<ReferenceData> {
        if let Some(data) = self
            .cached
            .read()
            .expect("reference cache lock poisoned")
            .as_ref()
        {
            return Arc::clone(data);
        }
        self.reload()
    }

    /// Force a fresh load from disk and replace the cached snapshot.
    pub fn reload(&self) -> Arc<ReferenceData> {
        let data = Arc::new(loader::load_reference_data(&self.dir));
        tracing::info!(
            conditions = data.conditions.len(),
            treatments = data.treatments.len(),
            medicines = data.medicines.len(),
            "Loaded reference tables"
        );
        *self.cached.write().expect("reference cache lock poisoned") = Some(Arc::clone(&data));
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn store_memoizes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(loader::CARDIOVASCULAR_CONDITIONS_FILE),
            "Condition,ICD Code,Description\nHypertension,I10,Essential hypertension\n",
        )
        .unwrap();

        let store = ReferenceStore::new(dir.path());
        let first = store.get_or_load();
        assert_eq!(first.conditions.len(), 1);

        // New rows on disk are invisible until reload().
        fs::write(
            dir.path().join(loader::CARDIOVASCULAR_CONDITIONS_FILE),
            "Condition,ICD Code,Description\n\
             Hypertension,I10,Essential hypertension\n\
             Cardiomyopathy,I42.9,Cardiomyopathy unspecified\n",
        )
        .unwrap();
        let cached = store.get_or_load();
        assert_eq!(cached.conditions.len(), 1);
        assert!(Arc::ptr_eq(&first, &cached));

        let reloaded = store.reload();
        assert_eq!(reloaded.conditions.len(), 2);
        assert_eq!(store.get_or_load().conditions.len(), 2);
    }

    #[test]
    fn missing_directory_yields_empty_tables() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReferenceStore::new(dir.path().join("nowhere"));
        let data = store.get_or_load();
        assert!(data.conditions.is_empty());
        assert!(data.treatments.is_empty());
        assert!(data.medicines.is_empty());
    }

    #[test]
    fn icd_codes_project_conditions() {
        let data = ReferenceData {
            conditions: vec![crate::models::Condition {
                name: "Hypertension".into(),
                icd_code: "I10".into(),
                description: "Essential hypertension".into(),
                category: crate::models::ConditionCategory::Cardiovascular,
            }],
            ..Default::default()
        };
        let codes = data.icd_codes();
        assert_eq!(codes.len(), 1);
        assert_eq!(codes[0].code, "I10");
        assert_eq!(codes[0].condition, "Hypertension");
        assert_eq!(codes[0].description, "Essential hypertension");
    }
}
