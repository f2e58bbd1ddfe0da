use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A project record as it comes out of the document store.  Dates and the
/// color are kept as the strings that were stored; they are only interpreted
/// when a calendar is built from the snapshot.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Project {
    #[serde(alias = "_id")]
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) color: String,
    pub(crate) start_date: String,
    pub(crate) end_date: String,
}

/// Anything that can hand over the current list of projects
pub(crate) trait ProjectSource {
    fn load(&self) -> Result<Snapshot, LoadError>;
}

/// The projects supplied by one load, in the order the source listed them
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Snapshot {
    pub(crate) projects: Vec<Project>,
    /// Number of records that could not be read as projects
    pub(crate) skipped: usize,
}

impl Snapshot {
    /// Decode a JSON document holding either an array of project records or
    /// an object with a `projects` array.  A record that does not decode is
    /// skipped without affecting the others.
    pub(crate) fn from_json(value: Value) -> Result<Snapshot, SnapshotShapeError> {
        let records = match value {
            Value::Array(records) => records,
            Value::Object(mut obj) => match obj.remove("projects") {
                Some(Value::Array(records)) => records,
                _ => return Err(SnapshotShapeError),
            },
            _ => return Err(SnapshotShapeError),
        };
        let mut snapshot = Snapshot::default();
        for (i, rec) in records.into_iter().enumerate() {
            match Project::deserialize(rec) {
                Ok(p) => snapshot.projects.push(p),
                Err(e) => {
                    log::warn!("Skipping project record #{i}: {e}");
                    snapshot.skipped += 1;
                }
            }
        }
        Ok(snapshot)
    }
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
#[error("expected an array of projects or an object with a \"projects\" array")]
pub(crate) struct SnapshotShapeError;

/// A JSON file exported from (or mirroring) the projects collection
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub(crate) fn new<P: Into<PathBuf>>(path: P) -> JsonFile {
        JsonFile { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl ProjectSource for JsonFile {
    fn load(&self) -> Result<Snapshot, LoadError> {
        let src = fs::read_to_string(&self.path).map_err(|source| LoadError::Read {
            path: self.path.clone(),
            source,
        })?;
        let value =
            serde_json::from_str::<Value>(&src).map_err(|source| LoadError::Parse {
                path: self.path.clone(),
                source,
            })?;
        let snapshot = Snapshot::from_json(value).map_err(|source| LoadError::Shape {
            path: self.path.clone(),
            source,
        })?;
        log::info!(
            "Loaded {} projects from {} ({} skipped)",
            snapshot.projects.len(),
            self.path.display(),
            snapshot.skipped
        );
        Ok(snapshot)
    }
}

#[derive(Debug, Error)]
pub(crate) enum LoadError {
    #[error("failed to read {}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {} as JSON", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("unexpected document layout in {}", path.display())]
    Shape {
        path: PathBuf,
        source: SnapshotShapeError,
    },
}

#[cfg(test)]
pub(crate) fn project(name: &str, color: &str, start: &str, end: &str) -> Project {
    Project {
        id: format!("id-{name}"),
        name: name.to_owned(),
        color: color.to_owned(),
        start_date: start.to_owned(),
        end_date: end.to_owned(),
    }
}
