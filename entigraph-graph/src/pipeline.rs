//! One full generation run: discover, parse, extract, assemble, write.
//!
//! Runs are all-or-nothing. The first file that cannot be read aborts the
//! run before anything is written, so a snapshot on disk always describes a
//! complete repository.

use crate::builder::GraphBuilder;
use crate::graph::{EntityGraph, GraphError};
use crate::store::{GraphStore, StoreError};
use entigraph_core::{
    discover_entity_files, entity_id, CrossReferenceExtractor, EntityError, EntityParser,
    GraphConfig,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info};

/// Why a run failed.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("pipeline setup failed: {0}")]
    Setup(#[source] EntityError),

    #[error("entity discovery failed: {0}")]
    Discovery(#[source] EntityError),

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: EntityError,
    },

    #[error("failed to extract references from {}: {source}", .path.display())]
    Extract {
        path: PathBuf,
        #[source]
        source: EntityError,
    },

    #[error("graph assembly failed: {0}")]
    Assembly(#[from] GraphError),

    #[error("failed to write snapshot: {0}")]
    Write(#[from] StoreError),
}

impl PipelineError {
    /// True when the pipeline gave up on the input, as opposed to an
    /// unexpected failure in setup or while writing.
    pub fn is_aborted(&self) -> bool {
        !matches!(self, Self::Setup(_) | Self::Write(_))
    }

    /// Name of the stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Setup(_) => "setup",
            Self::Discovery(_) => "discovery",
            Self::Parse { .. } => "parse",
            Self::Extract { .. } => "extract",
            Self::Assembly(_) => "assembly",
            Self::Write(_) => "write",
        }
    }

    /// File that caused the failure, when known.
    pub fn file(&self) -> Option<&Path> {
        match self {
            Self::Parse { path, .. } | Self::Extract { path, .. } => Some(path),
            Self::Discovery(source) => source.path(),
            Self::Setup(_) | Self::Assembly(_) => None,
            Self::Write(StoreError::Io { path, .. }) => Some(path),
            Self::Write(_) => None,
        }
    }
}

/// Result of assembling the graph in memory.
#[derive(Debug)]
pub struct GenerateResult {
    /// The assembled graph.
    pub graph: EntityGraph,
    /// Number of entity files discovered.
    pub files_scanned: usize,
    /// Wall-clock time of the run.
    pub duration_ms: u64,
}

/// Counts reported after a successful regenerate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegenerateSummary {
    pub nodes: usize,
    pub edges: usize,
    pub output: PathBuf,
    pub duration_ms: u64,
}

/// Assembles the entity graph for `config.root` without writing anything.
pub fn generate(config: &GraphConfig) -> Result<GenerateResult, PipelineError> {
    let start = Instant::now();
    let root = config.root.as_path();
    let extractor = CrossReferenceExtractor::new().map_err(PipelineError::Setup)?;
    info!("Parsing entities from {}", root.display());

    let files = discover_entity_files(root).map_err(PipelineError::Discovery)?;
    info!("Found {} entity files", files.len());

    let parser = EntityParser::with_overrides(config.summary_overrides.clone());
    let mut builder = GraphBuilder::new();

    for file in &files {
        let node = parser.parse_file(file, root).map_err(|source| {
            error!("Error parsing {}: {}", file.display(), source);
            PipelineError::Parse {
                path: file.clone(),
                source,
            }
        })?;
        builder.add_node(node)?;
    }

    let valid_ids = builder.entity_ids();
    debug!("Parsed {} entities", valid_ids.len());

    let mut edge_total = 0;

    for file in &files {
        let edges = entity_id(file, root)
            .and_then(|id| extractor.extract_file(file, &id, &valid_ids))
            .map_err(|source| {
                error!("Error extracting references from {}: {}", file.display(), source);
                PipelineError::Extract {
                    path: file.clone(),
                    source,
                }
            })?;
        edge_total += builder.add_edges(edges);
    }

    info!("Extracted {} cross-references", edge_total);

    Ok(GenerateResult {
        graph: builder.build(),
        files_scanned: files.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Assembles the graph and writes the snapshot to `config.output`.
///
/// Nothing is written unless every file parsed.
pub fn regenerate(config: &GraphConfig) -> Result<(EntityGraph, RegenerateSummary), PipelineError> {
    let result = generate(config)?;

    let store = GraphStore::new(&config.output);
    store.save_graph(&result.graph)?;

    let summary = RegenerateSummary {
        nodes: result.graph.node_count(),
        edges: result.graph.edge_count(),
        output: config.output.clone(),
        duration_ms: result.duration_ms,
    };
    info!(
        "Graph data written to {} ({} nodes, {} edges)",
        config.output.display(),
        summary.nodes,
        summary.edges
    );

    Ok((result.graph, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use entigraph_core::{EntityEdge, EntitySummary, SummaryOverrides};
    use std::collections::HashSet;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn write(root: &Path, rel: &str, content: impl AsRef<[u8]>) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn project() -> (TempDir, GraphConfig) {
        let dir = tempdir().unwrap();
        let config = GraphConfig::new(
            dir.path().join("memory"),
            dir.path().join("data/entities.json"),
        );
        (dir, config)
    }

    #[test]
    fn test_reference_scenario() {
        let (_dir, config) = project();
        write(&config.root, "concepts/a.md", "See concepts/b for details");
        write(&config.root, "concepts/b.md", "# B\nNo references here.");

        let graph = generate(&config).unwrap().graph;
        let data = graph.to_data();

        assert_eq!(data.nodes.len(), 2);
        assert_eq!(
            data.edges,
            vec![EntityEdge::references("concepts/a", "concepts/b")]
        );
        assert!(graph.references("concepts/b").is_empty());
    }

    #[test]
    fn test_single_category_only() {
        let (_dir, config) = project();
        write(&config.root, "people/ada.md", "# Ada Lovelace\n");

        let result = generate(&config).unwrap();

        assert_eq!(result.files_scanned, 1);
        assert_eq!(result.graph.node_count(), 1);
        assert_eq!(result.graph.edge_count(), 0);
        assert_eq!(result.graph.get_by_id("people/ada").unwrap().label, "Ada Lovelace");
    }

    #[test]
    fn test_one_node_per_file_with_unique_ids() {
        let (_dir, config) = project();
        write(&config.root, "concepts/layers.md", "");
        write(&config.root, "patterns/layers.md", "");
        write(&config.root, "anti-patterns/silent_failure.md", "");
        write(&config.root, "skills/rust.md", "");
        write(&config.root, "misc/ignored.md", "");

        let data = generate(&config).unwrap().graph.to_data();
        let ids: Vec<_> = data.nodes.iter().map(|n| n.id.as_str()).collect();

        assert_eq!(
            ids,
            vec![
                "concepts/layers",
                "patterns/layers",
                "anti-patterns/silent_failure",
                "skills/rust",
            ]
        );
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        for node in &data.nodes {
            assert!(node.id.starts_with(&format!("{}/", node.entity_type)));
        }
    }

    #[test]
    fn test_self_and_dangling_references_dropped() {
        let (_dir, config) = project();
        write(
            &config.root,
            "concepts/a.md",
            "I am concepts/a. See concepts/ghost and patterns/retry.",
        );
        write(&config.root, "patterns/retry.md", "Used by concepts/a and concepts/a");

        let data = generate(&config).unwrap().graph.to_data();

        assert_eq!(
            data.edges,
            vec![
                EntityEdge::references("concepts/a", "patterns/retry"),
                EntityEdge::references("patterns/retry", "concepts/a"),
            ]
        );
    }

    #[test]
    fn test_idempotent_output() {
        let (dir, config) = project();
        write(&config.root, "concepts/a.md", "# A\n## Overview\nIdea\nconcepts/c concepts/b");
        write(&config.root, "concepts/b.md", "concepts/a");
        write(&config.root, "concepts/c.md", "people/ada");
        write(&config.root, "people/ada.md", "projects/engine concepts/c");
        write(&config.root, "projects/engine.md", "## Architecture\nGears");

        regenerate(&config).unwrap();
        let first = fs::read(&config.output).unwrap();
        regenerate(&config).unwrap();
        let second = fs::read(&config.output).unwrap();

        assert_eq!(first, second);
        assert!(dir.path().join("data/entities.json").exists());
    }

    #[test]
    fn test_unreadable_file_aborts_without_output() {
        let (_dir, config) = project();
        for i in 0..9 {
            write(&config.root, &format!("concepts/c{}.md", i), "# Fine");
        }
        write(&config.root, "concepts/c9.md", [0xffu8, 0xfe, 0x80, 0x00]);

        let err = regenerate(&config).unwrap_err();

        assert!(err.is_aborted());
        assert_eq!(err.stage(), "parse");
        assert_eq!(err.file(), Some(config.root.join("concepts/c9.md").as_path()));
        assert!(!config.output.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_unlistable_category_aborts_in_discovery() {
        let (_dir, config) = project();
        write(&config.root, "concepts/a.md", "# A");
        std::os::unix::fs::symlink(
            config.root.join("missing.md"),
            config.root.join("concepts/x.md"),
        )
        .unwrap();

        let err = regenerate(&config).unwrap_err();

        assert!(matches!(err, PipelineError::Discovery(_)));
        assert!(err.is_aborted());
        assert_eq!(err.stage(), "discovery");
        assert_eq!(err.file(), Some(config.root.join("concepts").as_path()));
        assert!(!config.output.exists());
    }

    #[test]
    fn test_setup_failure_is_not_an_abort() {
        let setup = PipelineError::Setup(EntityError::InvalidPath(PathBuf::from("x")));
        assert!(!setup.is_aborted());
        assert_eq!(setup.stage(), "setup");

        let assembly = PipelineError::from(GraphError::DuplicateId("concepts/a".into()));
        assert!(assembly.is_aborted());
    }

    #[test]
    fn test_failed_run_keeps_previous_snapshot() {
        let (_dir, config) = project();
        write(&config.root, "concepts/a.md", "# A");
        regenerate(&config).unwrap();
        let before = fs::read(&config.output).unwrap();

        write(&config.root, "concepts/b.md", [0xc3u8, 0x28]);
        assert!(regenerate(&config).is_err());

        assert_eq!(fs::read(&config.output).unwrap(), before);
    }

    #[test]
    fn test_summary_override_from_config() {
        let (_dir, config) = project();
        write(&config.root, "people/izzy.md", "## Overview\nGeneric text");

        let mut overrides = SummaryOverrides::new();
        overrides.insert(
            "people/izzy",
            EntitySummary {
                core_idea: Some("Hand written".into()),
                ..Default::default()
            },
        );
        let config = config.with_overrides(overrides);

        let graph = generate(&config).unwrap().graph;
        let summary = graph.get_by_id("people/izzy").unwrap().summary.clone().unwrap();
        assert_eq!(summary.core_idea.as_deref(), Some("Hand written"));
    }

    #[test]
    fn test_regenerate_summary_counts() {
        let (_dir, config) = project();
        write(&config.root, "concepts/a.md", "concepts/b");
        write(&config.root, "concepts/b.md", "concepts/a");

        let (_, summary) = regenerate(&config).unwrap();

        assert_eq!(summary.nodes, 2);
        assert_eq!(summary.edges, 2);
        assert_eq!(summary.output, config.output);
    }

    #[test]
    fn test_empty_repository() {
        let (_dir, config) = project();

        let (graph, summary) = regenerate(&config).unwrap();

        assert_eq!(graph.node_count(), 0);
        assert_eq!(summary.edges, 0);
        assert!(config.output.exists());
    }
}
