//! Scene snapshot: compositions, layers, property trees, timelines and flow graphs.

pub(crate) mod dsl;
pub(crate) mod model;
/// Structurally significant property names.
pub mod names;
pub(crate) mod query;
pub(crate) mod validate;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::foundation::error::{PropelError, PropelResult};
use crate::scene::model::Scene;

impl Scene {
    /// Parse a snapshot from a JSON reader. The result is not validated.
    pub fn from_reader<R: std::io::Read>(r: R) -> PropelResult<Self> {
        serde_json::from_reader(r).map_err(|e| PropelError::serde(format!("parse scene JSON: {e}")))
    }

    /// Parse a snapshot from a JSON string. The result is not validated.
    pub fn from_json_str(s: &str) -> PropelResult<Self> {
        serde_json::from_str(s).map_err(|e| PropelError::serde(format!("parse scene JSON: {e}")))
    }

    /// Parse and validate a snapshot from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> PropelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            PropelError::validation(format!("open scene JSON '{}': {e}", path.display()))
        })?;
        let scene = Self::from_reader(BufReader::new(f))?;
        scene.validate()?;
        Ok(scene)
    }

    /// Serialize the snapshot as pretty JSON.
    pub fn to_json_pretty(&self) -> PropelResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| PropelError::serde(e.to_string()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/mod.rs"]
mod tests;
