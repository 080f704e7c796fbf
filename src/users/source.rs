use super::collection::{UserCollection, UserRecord};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Failures while obtaining the user collection.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read user fixture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("user fixture {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("user fixture {path} must contain a JSON array")]
    NotAnArray { path: PathBuf },
    #[error("user fixture {path}: element {index} is not a JSON object")]
    NotAnObject { path: PathBuf, index: usize },
    #[error("user source unavailable: {0}")]
    Unavailable(String),
}

/// Provider of the process-wide user collection.
///
/// Implementations are injected into handlers so the fixture can be replaced
/// by another store without touching handler code.
pub trait UserSource: Send + Sync {
    /// Return the full, unfiltered collection.
    fn users(&self) -> Result<UserCollection, SourceError>;
}

/// User collection loaded once from a JSON fixture file.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    path: PathBuf,
    users: UserCollection,
}

impl FixtureSource {
    /// Read and validate the fixture at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the file cannot be read, is not JSON, or is
    /// not an array of objects.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();
        let text = fs::read_to_string(&path).map_err(|source| SourceError::Io {
            path: path.clone(),
            source,
        })?;
        let users = parse_fixture(&text, &path)?;
        info!(
            path = %path.display(),
            user_count = users.len(),
            "User fixture loaded"
        );
        Ok(Self { path, users })
    }

    /// Parse fixture text that did not come from a file (embedded data, tests).
    ///
    /// # Errors
    ///
    /// Same validation as [`FixtureSource::load`].
    pub fn from_json_str(text: &str) -> Result<Self, SourceError> {
        let path = PathBuf::from("<inline>");
        let users = parse_fixture(text, &path)?;
        Ok(Self { path, users })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UserSource for FixtureSource {
    fn users(&self) -> Result<UserCollection, SourceError> {
        Ok(self.users.clone())
    }
}

fn parse_fixture(text: &str, path: &Path) -> Result<UserCollection, SourceError> {
    let value: Value = serde_json::from_str(text).map_err(|source| SourceError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let Value::Array(items) = value else {
        return Err(SourceError::NotAnArray {
            path: path.to_path_buf(),
        });
    };
    let records = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            UserRecord::try_from(item).map_err(|_| SourceError::NotAnObject {
                path: path.to_path_buf(),
                index,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    debug!(path = %path.display(), records = records.len(), "Fixture parsed");
    Ok(records.into())
}

/// In-memory source around an already built collection.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    users: UserCollection,
}

impl StaticSource {
    #[must_use]
    pub fn new(users: UserCollection) -> Self {
        Self { users }
    }
}

impl UserSource for StaticSource {
    fn users(&self) -> Result<UserCollection, SourceError> {
        Ok(self.users.clone())
    }
}
