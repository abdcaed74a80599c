//! Ground-truth datasets under the data directory

use crate::csv_table::read_table;
use crate::StoreError;
use parsewright_domain::{Column, ProfileId, TabularResult, TargetProfile};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File holding per-profile overrides
const OVERRIDES_FILE: &str = "profile.toml";

/// Sample document extensions tried in order when no override is given
const SAMPLE_EXTENSIONS: [&str; 2] = ["pdf", "txt"];

/// Optional `profile.toml` contents
///
/// ```toml
/// sample = "statement.pdf"
/// ground_truth = "expected.csv"
///
/// [[columns]]
/// name = "Date"
/// type = "text"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileOverrides {
    /// Sample document file name, relative to the profile directory
    pub sample: Option<String>,

    /// Ground-truth CSV file name, relative to the profile directory
    pub ground_truth: Option<String>,

    /// Declared column schema
    pub columns: Option<Vec<Column>>,
}

/// Read-only access to profiles and their ground truth
#[derive(Debug, Clone)]
pub struct GroundTruthStore {
    data_dir: PathBuf,
}

impl GroundTruthStore {
    /// Create a store rooted at `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The data directory
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Resolve a profile's sample document and ground truth
    pub fn profile(&self, id: &ProfileId) -> Result<TargetProfile, StoreError> {
        let dir = self.data_dir.join(id.as_str());
        if !dir.is_dir() {
            return Err(StoreError::NotFound(format!(
                "profile '{}' (no directory {})",
                id,
                dir.display()
            )));
        }

        let overrides = read_overrides(&dir)?;

        let sample = match &overrides.sample {
            Some(name) => dir.join(name),
            None => SAMPLE_EXTENSIONS
                .iter()
                .map(|ext| dir.join(format!("{}_sample.{}", id, ext)))
                .find(|p| p.is_file())
                .unwrap_or_else(|| dir.join(format!("{}_sample.pdf", id))),
        };
        if !sample.is_file() {
            return Err(StoreError::NotFound(format!("sample document {}", sample.display())));
        }

        let ground_truth = dir.join(
            overrides
                .ground_truth
                .clone()
                .unwrap_or_else(|| format!("{}_sample.csv", id)),
        );
        if !ground_truth.is_file() {
            return Err(StoreError::NotFound(format!("ground truth {}", ground_truth.display())));
        }

        debug!(profile = %id, sample = %sample.display(), "resolved profile");
        let profile = TargetProfile::new(id.clone(), sample, ground_truth);
        Ok(match overrides.columns {
            Some(columns) => profile.with_schema(columns),
            None => profile,
        })
    }

    /// Load a profile's ground truth
    pub fn load(&self, profile: &TargetProfile) -> Result<TabularResult, StoreError> {
        let table = read_table(profile.ground_truth(), profile.schema())?;
        debug!(
            profile = %profile.id(),
            rows = table.row_count(),
            columns = table.columns().len(),
            "loaded ground truth"
        );
        Ok(table)
    }

    /// Profiles present under the data directory, sorted by id
    pub fn list(&self) -> Result<Vec<ProfileId>, StoreError> {
        let entries = std::fs::read_dir(&self.data_dir).map_err(|e| StoreError::io(&self.data_dir, e))?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.data_dir, e))?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(id) = entry.file_name().to_str().and_then(|n| ProfileId::parse(n).ok()) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}

fn read_overrides(dir: &Path) -> Result<ProfileOverrides, StoreError> {
    let path = dir.join(OVERRIDES_FILE);
    if !path.is_file() {
        return Ok(ProfileOverrides::default());
    }
    let text = std::fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
    toml::from_str(&text).map_err(|e| StoreError::Profile {
        path,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parsewright_domain::{Cell, ColumnType};
    use tempfile::TempDir;

    fn profile_dir(root: &TempDir, id: &str) -> PathBuf {
        let dir = root.path().join(id);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_resolves_default_layout() {
        let root = TempDir::new().unwrap();
        let dir = profile_dir(&root, "icici");
        std::fs::write(dir.join("icici_sample.pdf"), b"%PDF").unwrap();
        std::fs::write(dir.join("icici_sample.csv"), "Date\n01-08-2024\n").unwrap();

        let store = GroundTruthStore::new(root.path());
        let profile = store.profile(&ProfileId::parse("icici").unwrap()).unwrap();
        assert_eq!(profile.sample_document(), dir.join("icici_sample.pdf"));
        assert!(profile.schema().is_none());
    }

    #[test]
    fn test_text_sample_is_found() {
        let root = TempDir::new().unwrap();
        let dir = profile_dir(&root, "sbi");
        std::fs::write(dir.join("sbi_sample.txt"), "statement").unwrap();
        std::fs::write(dir.join("sbi_sample.csv"), "Date\n01-08-2024\n").unwrap();

        let store = GroundTruthStore::new(root.path());
        let profile = store.profile(&ProfileId::parse("sbi").unwrap()).unwrap();
        assert_eq!(profile.sample_document(), dir.join("sbi_sample.txt"));
    }

    #[test]
    fn test_missing_profile() {
        let root = TempDir::new().unwrap();
        let store = GroundTruthStore::new(root.path());
        assert!(matches!(
            store.profile(&ProfileId::parse("hdfc").unwrap()),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_missing_ground_truth() {
        let root = TempDir::new().unwrap();
        let dir = profile_dir(&root, "icici");
        std::fs::write(dir.join("icici_sample.pdf"), b"%PDF").unwrap();

        let store = GroundTruthStore::new(root.path());
        match store.profile(&ProfileId::parse("icici").unwrap()) {
            Err(StoreError::NotFound(msg)) => assert!(msg.contains("ground truth")),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_overrides_and_schema() {
        let root = TempDir::new().unwrap();
        let dir = profile_dir(&root, "axis");
        std::fs::write(dir.join("statement.txt"), "statement").unwrap();
        std::fs::write(dir.join("expected.csv"), "Ref,Amount\n0042,10\n").unwrap();
        std::fs::write(
            dir.join("profile.toml"),
            r#"
sample = "statement.txt"
ground_truth = "expected.csv"

[[columns]]
name = "Ref"
type = "text"

[[columns]]
name = "Amount"
type = "number"
"#,
        )
        .unwrap();

        let store = GroundTruthStore::new(root.path());
        let profile = store.profile(&ProfileId::parse("axis").unwrap()).unwrap();
        assert_eq!(profile.schema().map(|s| s.len()), Some(2));

        let truth = store.load(&profile).unwrap();
        assert_eq!(truth.columns()[0].column_type, ColumnType::Text);
        assert_eq!(truth.rows()[0], vec![Cell::text("0042"), Cell::Number(10.0)]);
    }

    #[test]
    fn test_invalid_overrides() {
        let root = TempDir::new().unwrap();
        let dir = profile_dir(&root, "icici");
        std::fs::write(dir.join("profile.toml"), "sampel = \"x.pdf\"\n").unwrap();

        let store = GroundTruthStore::new(root.path());
        assert!(matches!(
            store.profile(&ProfileId::parse("icici").unwrap()),
            Err(StoreError::Profile { .. })
        ));
    }

    #[test]
    fn test_list_profiles() {
        let root = TempDir::new().unwrap();
        profile_dir(&root, "sbi");
        profile_dir(&root, "icici");
        profile_dir(&root, "Not A Slug");
        std::fs::write(root.path().join("README.md"), "data").unwrap();

        let store = GroundTruthStore::new(root.path());
        let ids: Vec<String> = store.list().unwrap().iter().map(|id| id.to_string()).collect();
        assert_eq!(ids, vec!["icici", "sbi"]);
    }
}
