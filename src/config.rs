//! Runtime configuration and the named-graph layout.
//!
//! Four logical partitions hang off one configured namespace root: a
//! shared Records graph, a reference-count bookkeeping graph, a shared
//! Annotations graph, and one graph per collection. Every graph URI is
//! derived from the root by a fixed template, so the layout is fully
//! determined by configuration.

use chrono::{NaiveDate, Utc};
use oxrdf::NamedNode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid namespace root: {0}")]
    InvalidNamespaceRoot(String),

    #[error("invalid collection slug: {0:?}")]
    InvalidSlug(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Namespace root every graph URI is derived from; must end in `/`.
    pub namespace_root: String,
    /// SPARQL query endpoint of the backing store.
    pub query_endpoint: String,
    /// SPARQL update endpoint of the backing store.
    pub update_endpoint: String,
    /// Days a zero-count record is kept before the sweep may forget it.
    pub gc_grace_days: u32,
    /// Seconds between scheduled garbage sweeps.
    pub sweep_interval_secs: u64,
    /// Port of the HTTP facade.
    pub http_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace_root: "https://cardex.dev/data/".to_string(),
            query_endpoint: "http://localhost:9999/sparql".to_string(),
            update_endpoint: "http://localhost:9999/sparql".to_string(),
            gc_grace_days: 14,
            sweep_interval_secs: 24 * 60 * 60,
            http_port: 8686,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&text)?;
        config.layout()?;
        Ok(config)
    }

    /// The graph layout rooted at this configuration's namespace.
    pub fn layout(&self) -> ConfigResult<GraphLayout> {
        GraphLayout::new(&self.namespace_root)
    }

    /// Default sweep cutoff: records untouched for the grace period.
    pub fn default_cutoff(&self) -> NaiveDate {
        Utc::now().date_naive() - chrono::Duration::days(i64::from(self.gc_grace_days))
    }
}

/// The deterministic named-graph URI templates.
#[derive(Debug, Clone)]
pub struct GraphLayout {
    root: String,
    records: NamedNode,
    bookkeeping: NamedNode,
    annotations: NamedNode,
}

impl GraphLayout {
    /// Build the layout from a namespace root ending in `/`.
    pub fn new(root: &str) -> ConfigResult<Self> {
        if !root.ends_with('/') {
            return Err(ConfigError::InvalidNamespaceRoot(format!(
                "{root:?} does not end in '/'"
            )));
        }
        let parse = |suffix: &str| {
            NamedNode::new(format!("{root}{suffix}"))
                .map_err(|e| ConfigError::InvalidNamespaceRoot(e.to_string()))
        };
        Ok(Self {
            root: root.to_string(),
            records: parse("records/")?,
            bookkeeping: parse("records-gc/")?,
            annotations: parse("annotations/")?,
        })
    }

    /// The shared Records graph.
    pub fn records_graph(&self) -> &NamedNode {
        &self.records
    }

    /// The reference-count bookkeeping graph.
    pub fn gc_graph(&self) -> &NamedNode {
        &self.bookkeeping
    }

    /// The shared Annotations graph.
    pub fn annotations_graph(&self) -> &NamedNode {
        &self.annotations
    }

    /// URI (and graph identifier) of the collection with this slug.
    pub fn collection_uri(&self, slug: &str) -> ConfigResult<NamedNode> {
        if slug.is_empty()
            || !slug
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::InvalidSlug(slug.to_string()));
        }
        NamedNode::new(format!("{}collections/{slug}", self.root))
            .map_err(|e| ConfigError::InvalidNamespaceRoot(e.to_string()))
    }

    /// Mint a fresh annotation URI under the Annotations partition.
    pub fn mint_annotation_uri(&self) -> NamedNode {
        NamedNode::new_unchecked(format!(
            "{}annotations/{}",
            self.root,
            Uuid::new_v4().simple()
        ))
    }

    /// Mint a fresh blank-record URI.
    pub fn mint_blank_record_uri(&self) -> NamedNode {
        NamedNode::new_unchecked(format!(
            "{}blank-records/{}",
            self.root,
            Uuid::new_v4().simple()
        ))
    }
}
