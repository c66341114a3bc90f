//! Graph configuration
//!
//! Every field has a default, so a YAML file only needs the values it
//! changes:
//!
//! ```yaml
//! keys:
//!   id: _id
//! adjacency: set
//! id_start:
//!   vertex: 1000
//! ```

use crate::graph::{AdjacencyPolicy, GraphError, GraphResult, Label, ReservedKeys};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Names of the reserved identity keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyNames {
    pub id: String,
    pub revision: String,
    pub label: String,
}

impl Default for KeyNames {
    fn default() -> Self {
        let keys = ReservedKeys::default();
        Self {
            id: keys.id,
            revision: keys.revision,
            label: keys.label,
        }
    }
}

/// Label given to an element created without one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultLabels {
    pub graph: Label,
    pub vertex: Label,
    pub edge: Label,
    pub hyperedge: Label,
    pub multi_edge: Label,
}

impl Default for DefaultLabels {
    fn default() -> Self {
        Self {
            graph: Label::from("graph"),
            vertex: Label::from("vertex"),
            edge: Label::from("edge"),
            hyperedge: Label::from("hyperedge"),
            multi_edge: Label::from("multiedge"),
        }
    }
}

/// First raw id each generator hands out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdStart {
    pub vertex: u64,
    pub edge: u64,
    pub hyperedge: u64,
    pub multi_edge: u64,
}

impl Default for IdStart {
    fn default() -> Self {
        Self {
            vertex: 1,
            edge: 1,
            hyperedge: 1,
            multi_edge: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub keys: KeyNames,
    pub labels: DefaultLabels,
    pub adjacency: AdjacencyPolicy,
    pub id_start: IdStart,
}

impl GraphConfig {
    pub fn from_yaml_str(yaml: &str) -> GraphResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> GraphResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn to_yaml(&self) -> GraphResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reserved keys must be non-empty and distinct
    pub fn validate(&self) -> GraphResult<()> {
        let KeyNames { id, revision, label } = &self.keys;
        if id.is_empty() || revision.is_empty() || label.is_empty() {
            return Err(GraphError::InvalidArgument(
                "reserved key names must not be empty".to_string(),
            ));
        }
        if id == revision || id == label || revision == label {
            return Err(GraphError::InvalidArgument(format!(
                "reserved key names must be distinct (id '{}', revision '{}', label '{}')",
                id, revision, label
            )));
        }
        Ok(())
    }

    pub fn reserved_keys(&self) -> ReservedKeys {
        ReservedKeys::new(
            self.keys.id.clone(),
            self.keys.revision.clone(),
            self.keys.label.clone(),
        )
    }
}
