//! YAML document read-modify-write cycle
//!
//! Documents are kept as a generic ordered [`serde_yaml::Value`] so that keys
//! the tool never touches survive a rewrite in their original order. The raw
//! text is retained for backups, which are byte-for-byte copies of what was
//! read.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{OnboardError, OnboardResult};

/// Timestamp used in backup file names, second granularity
pub fn backup_timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// A YAML file loaded for in-place modification
#[derive(Debug)]
pub struct YamlDocument {
    path: PathBuf,
    raw: String,
    root: Value,
}

impl YamlDocument {
    /// Read and parse the document at `path`
    pub fn load(path: impl AsRef<Path>) -> OnboardResult<Self> {
        let path = path.as_ref().to_path_buf();
        debug!(path = %path.display(), "Loading YAML document");

        let raw = fs::read_to_string(&path).map_err(|source| OnboardError::Io {
            path: path.clone(),
            source,
        })?;
        let root: Value = serde_yaml::from_str(&raw).map_err(|source| OnboardError::Yaml {
            path: path.clone(),
            source,
        })?;

        Ok(Self { path, raw, root })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Write the document as originally read into `dir/file_name`.
    ///
    /// `dir` is created if it does not exist.
    pub fn backup(&self, dir: impl AsRef<Path>, file_name: &str) -> OnboardResult<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| OnboardError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let backup_path = dir.join(file_name);
        fs::write(&backup_path, &self.raw).map_err(|source| OnboardError::Io {
            path: backup_path.clone(),
            source,
        })?;

        debug!(backup = %backup_path.display(), "Backup written");
        Ok(backup_path)
    }

    /// Overwrite the original file with the current contents
    pub fn save(&self) -> OnboardResult<()> {
        let rendered = serde_yaml::to_string(&self.root).map_err(|source| OnboardError::Yaml {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, rendered).map_err(|source| OnboardError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Mapping at a dotted key path, created empty when absent or null
    pub fn mapping_mut(&mut self, keys: &[&str]) -> OnboardResult<&mut Mapping> {
        let path = self.path.clone();
        let node = descend(&mut self.root, &path, keys)?;
        if node.is_null() {
            *node = Value::Mapping(Mapping::new());
        }
        node.as_mapping_mut()
            .ok_or_else(|| shape_error(&path, keys, "mapping"))
    }

    /// Sequence at a dotted key path, created empty when absent or null
    pub fn sequence_mut(&mut self, keys: &[&str]) -> OnboardResult<&mut Vec<Value>> {
        let path = self.path.clone();
        let node = descend(&mut self.root, &path, keys)?;
        if node.is_null() {
            *node = Value::Sequence(Vec::new());
        }
        node.as_sequence_mut()
            .ok_or_else(|| shape_error(&path, keys, "sequence"))
    }
}

/// Walk `keys` from `root`, creating intermediate mappings as needed
fn descend<'a>(root: &'a mut Value, path: &Path, keys: &[&str]) -> OnboardResult<&'a mut Value> {
    let mut node = root;
    for (depth, key) in keys.iter().enumerate() {
        if node.is_null() {
            *node = Value::Mapping(Mapping::new());
        }
        let mapping = match node {
            Value::Mapping(mapping) => mapping,
            _ => return Err(shape_error(path, &keys[..depth], "mapping")),
        };
        node = mapping
            .entry(Value::String((*key).to_string()))
            .or_insert(Value::Null);
    }
    Ok(node)
}

fn shape_error(path: &Path, keys: &[&str], expected: &'static str) -> OnboardError {
    let section = if keys.is_empty() {
        "<root>".to_string()
    } else {
        keys.join(".")
    };
    OnboardError::DocumentShape {
        path: path.to_path_buf(),
        section,
        expected,
    }
}

/// Re-order a mapping by key, lexicographically and stably
pub fn sort_mapping(mapping: &mut Mapping) {
    let mut entries: Vec<(Value, Value)> = std::mem::take(mapping).into_iter().collect();
    entries.sort_by_cached_key(|(key, _)| key_text(key));
    *mapping = entries.into_iter().collect();
}

fn key_text(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_backup_is_verbatim_and_creates_directory() {
        let original = "# managed by hand\nhttp:\n  routers: {}\n";
        let file = write_temp(original);
        let doc = YamlDocument::load(file.path()).unwrap();

        let scratch = tempfile::tempdir().unwrap();
        let backup_dir = scratch.path().join("nested").join("backups");
        let backup = doc.backup(&backup_dir, "config_backup_20240101_000000.yml").unwrap();

        assert_eq!(fs::read_to_string(&backup).unwrap(), original);
        let reparsed: Value = serde_yaml::from_str(&fs::read_to_string(&backup).unwrap()).unwrap();
        assert_eq!(&reparsed, doc.root());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let scratch = tempfile::tempdir().unwrap();
        let err = YamlDocument::load(scratch.path().join("absent.yml")).unwrap_err();
        assert!(matches!(err, OnboardError::Io { .. }));
    }

    #[test]
    fn test_malformed_yaml_is_yaml_error() {
        let file = write_temp("http: [unclosed\n");
        let err = YamlDocument::load(file.path()).unwrap_err();
        assert!(matches!(err, OnboardError::Yaml { .. }));
    }

    #[test]
    fn test_mapping_mut_creates_missing_sections() {
        let file = write_temp("other: 1\n");
        let mut doc = YamlDocument::load(file.path()).unwrap();

        doc.mapping_mut(&["http", "routers"]).unwrap();

        assert!(doc.root()["http"]["routers"].is_mapping());
        assert_eq!(doc.root()["other"], Value::from(1));
    }

    #[test]
    fn test_wrong_kind_is_shape_error() {
        let file = write_temp("http:\n  routers:\n    - a\n");
        let mut doc = YamlDocument::load(file.path()).unwrap();

        let err = doc.mapping_mut(&["http", "routers"]).unwrap_err();
        match err {
            OnboardError::DocumentShape { section, expected, .. } => {
                assert_eq!(section, "http.routers");
                assert_eq!(expected, "mapping");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_sort_mapping_orders_keys() {
        let mut mapping: Mapping = serde_yaml::from_str("zeta: 1\nalpha: 2\nmid: 3\n").unwrap();
        sort_mapping(&mut mapping);

        let keys: Vec<&str> = mapping.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, vec!["alpha", "mid", "zeta"]);
        assert_eq!(mapping.get("alpha"), Some(&Value::from(2)));
    }

    #[test]
    fn test_save_round_trips() {
        let file = write_temp("http:\n  routers: {}\n");
        let mut doc = YamlDocument::load(file.path()).unwrap();
        doc.mapping_mut(&["http", "routers"])
            .unwrap()
            .insert(Value::from("web"), Value::from("x"));
        doc.save().unwrap();

        let reloaded = YamlDocument::load(file.path()).unwrap();
        assert_eq!(reloaded.root()["http"]["routers"]["web"], Value::from("x"));
    }
}
