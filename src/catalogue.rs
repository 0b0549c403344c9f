//! Schema catalogue
//!
//! Loads every schema file under a directory. All files are parsed together
//! so that a named type defined in one file can be referenced from another.

use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::avro::from_avro;
use crate::config::CatalogueConfig;
use crate::error::{Result, SchemaError};
use crate::report::ValidationReport;
use crate::schema::Schema;
use crate::validator::SchemaValidator;

/// One schema file
#[derive(Debug, Clone)]
pub struct CatalogueEntry {
    pub path: PathBuf,
    pub schema: Schema,
}

impl CatalogueEntry {
    /// Full name of the file's top-level type
    pub fn name(&self) -> &str {
        self.schema.full_name().unwrap_or_default()
    }
}

/// All schema files found under one or more paths
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    entries: Vec<CatalogueEntry>,
}

impl Catalogue {
    /// Load the directory (or single file) configured as the catalogue root
    pub fn load(config: &CatalogueConfig) -> Result<Self> {
        Self::load_paths(std::slice::from_ref(&config.root), &config.extension)
    }

    /// Load every file with `extension` under each of `paths`
    pub fn load_paths(paths: &[PathBuf], extension: &str) -> Result<Self> {
        let mut files = Vec::new();
        for path in paths {
            files.extend(schema_files(path, extension)?);
        }

        let mut sources = Vec::with_capacity(files.len());
        for file in files {
            let content = std::fs::read_to_string(&file)?;
            sources.push((file, content));
        }
        Self::from_sources(sources)
    }

    /// Parse schema sources given as `(path, content)` pairs
    pub fn from_sources(sources: Vec<(PathBuf, String)>) -> Result<Self> {
        if sources.is_empty() {
            return Ok(Self::default());
        }
        let texts: Vec<&str> = sources.iter().map(|(_, content)| content.as_str()).collect();
        let parsed = apache_avro::Schema::parse_list(&texts)?;
        if parsed.len() != sources.len() {
            return Err(SchemaError::InvalidFormat(format!(
                "parsed {} schemas from {} files",
                parsed.len(),
                sources.len()
            )));
        }

        let entries: Vec<CatalogueEntry> = sources
            .into_iter()
            .zip(parsed.iter())
            .map(|((path, _), schema)| CatalogueEntry {
                path,
                schema: from_avro(schema),
            })
            .collect();

        info!(schemas = entries.len(), "loaded schema catalogue");
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogueEntry] {
        &self.entries
    }

    /// Entry whose top-level type has the given full name
    pub fn get(&self, name: &str) -> Option<&CatalogueEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-level schemas of every entry, in load order
    pub fn roots(&self) -> Vec<Schema> {
        self.entries.iter().map(|e| e.schema.clone()).collect()
    }

    /// Validate every entry; references across files resolve
    pub fn validate(&self, validator: &SchemaValidator) -> Result<ValidationReport> {
        validator.validate(&self.roots())
    }
}

/// Schema files under `path`, sorted by path. A file path is returned as is.
fn schema_files(path: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(SchemaError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }

    let files: Vec<PathBuf> = WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map(|x| x == extension).unwrap_or(false))
        .map(|e| e.into_path())
        .collect();
    debug!(dir = %path.display(), files = files.len(), "found schema files");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const LEVEL: &str = r#"{"type": "enum", "name": "Level", "namespace": "org.example",
        "doc": "Battery level.", "symbols": ["LOW", "HIGH", "UNKNOWN"]}"#;

    const BATTERY: &str = r#"{"type": "record", "name": "Battery", "namespace": "org.example",
        "doc": "Battery state.", "fields": [
            {"name": "level", "type": "org.example.Level", "doc": "Current level.", "default": "UNKNOWN"}
        ]}"#;

    #[test]
    fn test_load_directory_resolves_across_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("a_level.avsc"), LEVEL).unwrap();
        fs::write(dir.path().join("nested/battery.avsc"), BATTERY).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a schema").unwrap();

        let catalogue = Catalogue::load_paths(&[dir.path().to_path_buf()], "avsc").unwrap();
        assert_eq!(catalogue.len(), 2);
        assert!(catalogue.get("org.example.Battery").is_some());

        let report = catalogue.validate(&SchemaValidator::new()).unwrap();
        assert!(report.is_valid(), "{}", report);
    }

    #[test]
    fn test_missing_path() {
        let dir = TempDir::new().unwrap();
        let err = Catalogue::load_paths(&[dir.path().join("absent")], "avsc").unwrap_err();
        assert!(matches!(err, SchemaError::Io(_)));
    }

    #[test]
    fn test_unparseable_file_is_a_load_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.avsc"), "{\"type\": ").unwrap();
        assert!(Catalogue::load_paths(&[dir.path().to_path_buf()], "avsc").is_err());
    }

    #[test]
    fn test_empty_catalogue() {
        let catalogue = Catalogue::from_sources(Vec::new()).unwrap();
        assert!(catalogue.is_empty());
        assert!(matches!(
            catalogue.validate(&SchemaValidator::new()),
            Err(SchemaError::EmptyInput)
        ));
    }
}
