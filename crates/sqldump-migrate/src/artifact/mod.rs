//! Interchange artifacts persisted between pipeline stages.
//!
//! Three JSON files can sit between a scan and an emission:
//!
//! - the discovered schema, `{"table": ["col", ...], ...}` in discovery order
//! - the identifier verdicts, `{"table": "short_string" | "long_string" | "numeric"}`
//! - the frozen [`SchemaDocument`]
//!
//! Every write goes to a sibling temp file first and is renamed into place,
//! so a reader never sees a half-written artifact.

use serde::de::{self, DeserializeOwned, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::classify::Classifications;
use crate::error::{MigrateError, Result};
use crate::model::SchemaDocument;
use crate::scanner::DiscoveredSchema;

/// Write `contents` to `path` atomically.
pub fn write_atomic<P: AsRef<Path>>(path: P, contents: &str) -> Result<()> {
    let path = path.as_ref();
    let temp_path = temp_sibling(path);

    fs::write(&temp_path, contents)?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    debug!("Wrote {} ({} bytes)", path.display(), contents.len());
    Ok(())
}

/// Write several files as one unit.
///
/// Every file is staged to a temp sibling first; nothing is renamed into
/// place unless all staging writes succeed. On failure no target is left
/// holding output of this call.
pub fn write_all_atomic(files: &[(&Path, &str)]) -> Result<()> {
    let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(files.len());

    for &(path, contents) in files {
        let temp_path = temp_sibling(path);
        if let Err(e) = fs::write(&temp_path, contents) {
            let _ = fs::remove_file(&temp_path);
            for (temp, _) in &staged {
                let _ = fs::remove_file(temp);
            }
            return Err(e.into());
        }
        staged.push((temp_path, path));
    }

    for (i, (temp_path, path)) in staged.iter().enumerate() {
        if let Err(e) = fs::rename(temp_path, path) {
            for (temp, _) in &staged[i..] {
                let _ = fs::remove_file(temp);
            }
            for (_, committed) in &staged[..i] {
                let _ = fs::remove_file(committed);
            }
            return Err(e.into());
        }
        debug!("Wrote {}", path.display());
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

/// Read a required input, mapping any failure to a missing source.
pub fn read_source<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|e| MigrateError::missing_source(path, e))
}

/// A value persisted as pretty JSON.
pub trait Artifact: Serialize + DeserializeOwned {
    /// Human-readable kind, used in error messages.
    const KIND: &'static str;

    /// Structural checks run after loading.
    fn check(&self) -> Result<()> {
        Ok(())
    }

    /// Render as JSON text.
    fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Parse from JSON text and check it.
    fn from_json(json: &str) -> Result<Self> {
        let value: Self = serde_json::from_str(json)
            .map_err(|e| MigrateError::Schema(format!("invalid {}: {}", Self::KIND, e)))?;
        value.check()?;
        Ok(value)
    }

    /// Save atomically.
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_atomic(path, &self.to_json()?)
    }

    /// Load from a file.
    fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = read_source(path)?;
        Self::from_json(&json).map_err(|e| match e {
            MigrateError::Schema(msg) => {
                MigrateError::Schema(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }
}

impl Artifact for DiscoveredSchema {
    const KIND: &'static str = "schema mapping";
}

impl Artifact for Classifications {
    const KIND: &'static str = "identifier classifications";
}

impl Artifact for SchemaDocument {
    const KIND: &'static str = "schema document";

    fn check(&self) -> Result<()> {
        self.check_invariants()
    }
}

impl Serialize for DiscoveredSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for table in self.tables() {
            map.serialize_entry(&table.name, &table.columns)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DiscoveredSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(SchemaVisitor)
    }
}

struct SchemaVisitor;

impl<'de> Visitor<'de> for SchemaVisitor {
    type Value = DiscoveredSchema;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map from table name to column names")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> std::result::Result<Self::Value, M::Error> {
        let mut schema = DiscoveredSchema::new();
        while let Some((table, columns)) = map.next_entry::<String, Vec<String>>()? {
            if columns.is_empty() {
                return Err(de::Error::custom(format!("table '{}' has no columns", table)));
            }
            if !schema.insert(&table, columns) {
                return Err(de::Error::custom(format!("duplicate table '{}'", table)));
            }
        }
        Ok(schema)
    }
}
