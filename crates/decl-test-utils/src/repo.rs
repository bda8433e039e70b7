//! [`TestRepository`] builder for filesystem store scenarios.

use decl_core::FsResourceStore;
use decl_fs::{DocumentFormat, NormalizedPath};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary resource repository laid out the way [`FsResourceStore`]
/// expects: `<root>/<logical path>/resource.<ext>`.
///
/// # Example
///
/// ```rust,no_run
/// use decl_test_utils::TestRepository;
/// use serde_json::json;
///
/// let repo = TestRepository::new();
/// repo.write_resource("/admin/realms/acme", &json!({"realm": "acme"}));
/// let store = repo.store();
/// ```
pub struct TestRepository {
    temp_dir: TempDir,
    format: DocumentFormat,
}

impl Default for TestRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRepository {
    /// Empty JSON repository.
    pub fn new() -> Self {
        Self::with_format(DocumentFormat::Json)
    }

    pub fn with_format(format: DocumentFormat) -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
            format,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Directory backing a logical path.
    pub fn dir_for(&self, logical_path: &str) -> PathBuf {
        self.root().join(logical_path.trim_start_matches('/'))
    }

    /// Write a resource file, creating its directories.
    pub fn write_resource(&self, logical_path: &str, value: &Value) -> PathBuf {
        let dir = self.dir_for(logical_path);
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join(format!("resource.{}", self.format.extension()));
        let content = self.format.encode(&NormalizedPath::new(&file), value).unwrap();
        fs::write(&file, content).unwrap();
        file
    }

    /// Create a bare collection directory.
    pub fn create_collection(&self, logical_path: &str) -> PathBuf {
        let dir = self.dir_for(logical_path);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub fn store(&self) -> FsResourceStore {
        FsResourceStore::new(self.root(), self.format)
    }
}
