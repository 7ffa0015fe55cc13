//! dbt-style `manifest.json` reading and lineage graph construction.
//!
//! Only the fields the diagram needs are deserialized; everything else in
//! the manifest is ignored. Nullable or missing fields fall back to empty
//! values.

use crate::error::{ConvertError, Result};
use crate::ir::{EdgeKind, LineageGraph, NodeAttributes, NodeKind};
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::str::FromStr;

/// Directory dbt installs package dependencies into.
const PACKAGES_DIR: &str = "dbt_packages";
const DEFAULT_MATERIALIZATION: &str = "unknown";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub metadata: ManifestMetadata,
    #[serde(default)]
    pub nodes: BTreeMap<String, ManifestNode>,
    #[serde(default)]
    pub sources: BTreeMap<String, ManifestSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestMetadata {
    #[serde(default)]
    pub project_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestNode {
    pub name: String,
    pub resource_type: String,
    #[serde(default)]
    pub original_file_path: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub package_name: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub config: NodeConfig,
    #[serde(default)]
    pub depends_on: DependsOn,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeConfig {
    /// `None` when the key is absent, `Some(None)` for an explicit `null`.
    #[serde(default, deserialize_with = "present")]
    pub materialized: Option<Option<String>>,
}

/// Keeps a present-but-null field distinguishable from a missing one.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DependsOn {
    #[serde(default)]
    pub nodes: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestSource {
    pub name: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl ManifestNode {
    pub fn is_model(&self) -> bool {
        self.resource_type == "model"
    }

    pub fn is_test(&self) -> bool {
        self.resource_type == "test"
    }

    /// Materialization tag text. A missing or empty setting reads as
    /// `unknown`; an explicit `null` means the model gets no tag.
    pub fn materialization(&self) -> Option<String> {
        match &self.config.materialized {
            None => Some(DEFAULT_MATERIALIZATION.to_string()),
            Some(None) => None,
            Some(Some(value)) if value.is_empty() => Some(DEFAULT_MATERIALIZATION.to_string()),
            Some(Some(value)) => Some(value.clone()),
        }
    }

    /// `schema.alias`, or the bare alias when the schema is unknown. The
    /// alias falls back to the model name.
    pub fn table_name(&self) -> String {
        let alias = non_empty(&self.alias).unwrap_or(&self.name);
        match non_empty(&self.schema) {
            Some(schema) => format!("{schema}.{alias}"),
            None => alias.to_string(),
        }
    }
}

impl ManifestSource {
    pub fn table_name(&self) -> String {
        let identifier = non_empty(&self.identifier).unwrap_or(&self.name);
        match (non_empty(&self.database), non_empty(&self.schema)) {
            (Some(database), Some(schema)) => format!("{database}.{schema}.{identifier}"),
            (Some(database), None) => format!("{database}.{identifier}"),
            _ => identifier.to_string(),
        }
    }
}

impl Manifest {
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConvertError::ManifestRead {
            path: path.to_path_buf(),
            source,
        })?;
        contents.parse()
    }

    pub fn project_name(&self) -> Option<&str> {
        non_empty(&self.metadata.project_name)
    }

    /// Manifest ids referenced by at least one test node.
    pub fn tested_ids(&self) -> HashSet<&str> {
        self.nodes
            .values()
            .filter(|node| node.is_test())
            .flat_map(|node| node.depends_on.nodes.iter().map(String::as_str))
            .collect()
    }
}

impl FromStr for Manifest {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

/// A model is treated as coming from a package when it lives under the
/// packages directory or belongs to a package other than the project.
pub fn is_package_model(attributes: &NodeAttributes, project_name: Option<&str>) -> bool {
    if attributes.origin_path.contains(PACKAGES_DIR) {
        return true;
    }
    !attributes.package_name.is_empty() && Some(attributes.package_name.as_str()) != project_name
}

/// Builds the lineage graph: every model becomes a unit node, every source
/// a model reads from becomes an external-source node. Model-to-model
/// dependencies become `DerivedFrom` edges and source dependencies
/// `SourcedFrom` edges, both pointing from the upstream node.
pub fn build_graph(manifest: &Manifest) -> LineageGraph {
    let mut graph = match manifest.project_name() {
        Some(project) => LineageGraph::with_project(project),
        None => LineageGraph::new(),
    };
    let tested = manifest.tested_ids();

    for (unique_id, node) in manifest.nodes.iter().filter(|(_, node)| node.is_model()) {
        let attributes = NodeAttributes {
            origin_path: node.original_file_path.clone().unwrap_or_default(),
            description: node.description.clone().unwrap_or_default(),
            package_name: node.package_name.clone().unwrap_or_default(),
            materialization: node.materialization(),
            manifest_id: unique_id.clone(),
            table_name: Some(node.table_name()),
            tested: tested.contains(unique_id.as_str()),
        };
        tracing::debug!(model = %node.name, table = ?attributes.table_name, "model table");
        if is_package_model(&attributes, manifest.project_name()) {
            tracing::info!(
                model = %node.name,
                package = %attributes.package_name,
                path = %attributes.origin_path,
                "identified package model"
            );
        }
        if !graph.add_node(node.name.clone(), NodeKind::Unit, attributes) {
            tracing::warn!(model = %node.name, id = %unique_id, "duplicate model name, keeping the first");
        }
    }

    for node in manifest.nodes.values().filter(|node| node.is_model()) {
        for dependency in &node.depends_on.nodes {
            if let Some(upstream) = manifest.nodes.get(dependency) {
                if upstream.is_model() {
                    graph.add_edge(&upstream.name, &node.name, EdgeKind::DerivedFrom);
                }
            } else if let Some(source) = manifest.sources.get(dependency) {
                let attributes = NodeAttributes {
                    manifest_id: dependency.clone(),
                    table_name: Some(source.table_name()),
                    tested: true,
                    ..NodeAttributes::default()
                };
                if graph.add_node(source.name.clone(), NodeKind::ExternalSource, attributes) {
                    tracing::debug!(source = %source.name, table = %source.table_name(), "source table");
                }
                graph.add_edge(&source.name, &node.name, EdgeKind::SourcedFrom);
            }
        }
    }

    tracing::info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "built lineage graph"
    );
    graph
}
