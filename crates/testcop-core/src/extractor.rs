use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::types::{ProductionUnit, Project, TestUnit};

/// Errors raised while building the unit model.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("failed to read '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{}': {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
}

impl ExtractionError {
    pub fn parse(path: &Path, reason: impl Into<String>) -> Self {
        ExtractionError::Parse {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// File of the unit that failed.
    pub fn path(&self) -> &Path {
        match self {
            ExtractionError::Io { path, .. } | ExtractionError::Parse { path, .. } => path,
        }
    }
}

/// Result of extracting many units: the ones that made it and the ones that did not.
#[derive(Debug)]
pub struct Batch<T> {
    pub units: Vec<T>,
    pub failures: Vec<ExtractionError>,
}

impl<T> Batch<T> {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A project snapshot plus the test units that could not be extracted.
#[derive(Debug)]
pub struct Extraction {
    pub project: Project,
    pub failures: Vec<ExtractionError>,
}

/// Trait that each extraction backend must implement.
pub trait Extractor: Send + Sync {
    /// Backend name (e.g., "source", "bytecode")
    fn backend(&self) -> &'static str;

    /// Every production unit under the production root.
    fn production_units(&self) -> Result<Vec<ProductionUnit>, ExtractionError>;

    /// Every test unit under the test root. A unit that fails to extract is
    /// reported in the batch and does not affect the others.
    fn test_units(&self) -> Batch<TestUnit>;

    /// Snapshot both collections into a project.
    fn project(&self) -> Result<Extraction, ExtractionError> {
        let production = self.production_units()?;
        let Batch { units, failures } = self.test_units();
        tracing::info!(
            backend = self.backend(),
            production = production.len(),
            tests = units.len(),
            failed = failures.len(),
            "extracted units"
        );
        Ok(Extraction {
            project: Project::new(production, units),
            failures,
        })
    }
}

/// Files under `root` with one of `extensions`, sorted for stable output.
/// A missing root yields no files.
pub fn source_files(root: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    if !root.exists() {
        tracing::debug!(root = %root.display(), "root does not exist, nothing to extract");
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|ext| extensions.iter().any(|x| ext == *x))
        })
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Split per-unit results into extracted units and failures.
pub fn collect_units<T>(results: impl IntoIterator<Item = Result<T, ExtractionError>>) -> Batch<T> {
    let mut units = Vec::new();
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(unit) => units.push(unit),
            Err(e) => {
                tracing::warn!("{e}");
                failures.push(e);
            }
        }
    }
    Batch { units, failures }
}

/// Read a file, mapping failures to [`ExtractionError::Io`].
pub fn read_file(path: &Path) -> Result<Vec<u8>, ExtractionError> {
    std::fs::read(path).map_err(|source| ExtractionError::Io {
        path: path.to_path_buf(),
        source,
    })
}
