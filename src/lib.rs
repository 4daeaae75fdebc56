//! # simgraph: Simulation Configuration as a Property Graph
//!
//! Ingests the typed YAML documents that describe a distributed simulation
//! (models, stacks, channels, signal groups, networks, propagators,
//! manifests) and materializes them as a property graph, then infers the
//! relationships the documents only imply, most importantly which runtime
//! Channel carries which SignalGroup.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `GraphStore` is the only contract with the database
//! 2. **Clean DTOs**: `Node`, `Relationship`, `Value` cross all boundaries
//! 3. **Closed dispatch**: every document kind is a `KindSpec` variant
//! 4. **Pure inference**: rules map a `GraphSnapshot` to edge proposals
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use simgraph::{Graph, GraphStore};
//!
//! # async fn example() -> simgraph::Result<()> {
//! let graph = Graph::open_memory().await?;
//! let report = graph.import_path("sim/".as_ref()).await?;
//! if !report.is_success() {
//!     for failure in report.failures() {
//!         eprintln!("{failure}");
//!     }
//! }
//! println!("{} nodes", graph.store().node_count().await?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Graph Stores
//!
//! | Store | Feature | Description |
//! |---------|---------|-------------|
//! | Memory | (default) | In-memory graph for testing/embedding |
//! | Bolt | `bolt` | External Neo4j via Bolt protocol |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod storage;
pub mod document;
pub mod mapper;
pub mod inference;
pub mod export;

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

// ============================================================================
// Re-exports
// ============================================================================

pub use model::{
    Node, Relationship, Value, PropertyMap,
    NodeId, RelId, Direction,
};

pub use storage::{GraphStore, DropScope, BoltConfig, MemoryStore};
#[cfg(feature = "bolt")]
pub use storage::BoltStore;

pub use document::{Document, Kind, KindSpec, SourceFile};
pub use inference::{Step, StepOutcome};

// ============================================================================
// Configuration
// ============================================================================

/// Controls a batch import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// Run the inference pipeline after the batch.
    pub infer: bool,
    /// File extensions picked up when walking a directory (no leading dot).
    pub extensions: Vec<String>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            infer: true,
            extensions: vec!["yaml".into(), "yml".into()],
        }
    }
}

impl ImportOptions {
    pub fn with_infer(mut self, infer: bool) -> Self {
        self.infer = infer;
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Whether a walked file qualifies, by case-insensitive extension.
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

// ============================================================================
// Import report
// ============================================================================

/// A document that made it into the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedDocument {
    pub index: usize,
    pub kind: Kind,
    pub name: String,
    pub node: NodeId,
}

/// Outcome for one source file.
#[derive(Debug, Default)]
pub struct FileReport {
    pub file: String,
    pub imported: Vec<ImportedDocument>,
    /// Decode, unknown-kind, fragment and store failures, one per document.
    pub failures: Vec<Error>,
}

/// Outcome of one batch.
#[derive(Debug)]
pub struct ImportReport {
    pub started: DateTime<Utc>,
    pub finished: Option<DateTime<Utc>>,
    pub files: Vec<FileReport>,
    /// Empty when inference was disabled.
    pub inference: Vec<StepOutcome>,
}

impl ImportReport {
    fn begin() -> Self {
        Self { started: Utc::now(), finished: None, files: Vec::new(), inference: Vec::new() }
    }

    /// False when any document failed to import. Inference step failures are
    /// advisory and do not count.
    pub fn is_success(&self) -> bool {
        self.files.iter().all(|f| f.failures.is_empty())
    }

    pub fn failures(&self) -> impl Iterator<Item = &Error> {
        self.files.iter().flat_map(|f| f.failures.iter())
    }

    pub fn imported(&self) -> impl Iterator<Item = &ImportedDocument> {
        self.files.iter().flat_map(|f| f.imported.iter())
    }
}

// ============================================================================
// Top-level Graph handle
// ============================================================================

/// The primary entry point. A `Graph` wraps a graph store and runs
/// imports, inference, drops and exports against it.
pub struct Graph<S: GraphStore> {
    store: S,
    options: ImportOptions,
}

impl<S: GraphStore> Graph<S> {
    /// Create a Graph with the given store.
    pub fn with_store(store: S) -> Self {
        Self { store, options: ImportOptions::default() }
    }

    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Access the underlying store (for reads and advanced use).
    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }

    /// Decode everything under `path` and import it as one batch.
    pub async fn import_path(&self, path: &Path) -> Result<ImportReport> {
        let files = document::detect(path, &self.options)?;
        Ok(self.import(files).await)
    }

    /// Import YAML text as if read from a file named `file`.
    pub async fn import_str(&self, file: &str, text: &str) -> ImportReport {
        let source = SourceFile { path: file.into(), documents: document::decode_str(file, text) };
        self.import(vec![source]).await
    }

    /// Import a batch of decoded files, then run inference once.
    ///
    /// A failing document is recorded and skipped; its siblings and the
    /// rest of the batch still import.
    pub async fn import(&self, files: Vec<SourceFile>) -> ImportReport {
        let mut report = ImportReport::begin();

        for source in files {
            let mut file_report = FileReport { file: source.name(), ..FileReport::default() };
            info!(file = %file_report.file, documents = source.documents.len(), "importing");

            for decoded in source.documents {
                let doc = match decoded {
                    Ok(doc) => doc,
                    Err(e) => {
                        file_report.failures.push(e);
                        continue;
                    }
                };
                match mapper::import_document(&self.store, &doc).await {
                    Ok(node) => file_report.imported.push(ImportedDocument {
                        index: doc.index,
                        kind: doc.kind(),
                        name: doc.name,
                        node,
                    }),
                    Err(e) => {
                        warn!(file = %doc.file, index = doc.index, error = %e, "document import failed");
                        file_report.failures.push(e);
                    }
                }
            }
            report.files.push(file_report);
        }

        if self.options.infer {
            report.inference = self.infer().await;
        }
        report.finished = Some(Utc::now());
        info!(
            files = report.files.len(),
            imported = report.imported().count(),
            failed = report.failures().count(),
            "import finished"
        );
        report
    }

    /// Run the inference pipeline over the whole graph.
    pub async fn infer(&self) -> Vec<StepOutcome> {
        inference::run(&self.store).await
    }

    /// Delete every node in `scope`.
    pub async fn drop(&self, scope: DropScope) -> Result<u64> {
        let removed = self.store.drop_by_label(scope).await?;
        info!(?scope, removed, "dropped nodes");
        Ok(removed)
    }

    /// Write the graph as a Cypher MERGE script.
    pub async fn export(&self, writer: &mut dyn std::io::Write) -> Result<()> {
        export::export_cypher(&self.store, writer).await
    }
}

/// In-memory graph for testing and embedding.
impl Graph<MemoryStore> {
    pub async fn open_memory() -> Result<Self> {
        Ok(Self::with_store(MemoryStore::new()))
    }
}

/// Remote Neo4j over Bolt.
#[cfg(feature = "bolt")]
impl Graph<BoltStore> {
    pub async fn connect(config: BoltConfig) -> Result<Self> {
        Ok(Self::with_store(BoltStore::connect(&config).await?))
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{file} document {index}: {message}")]
    Decode { file: String, index: usize, message: String },

    #[error("{file} document {index}: unknown kind '{kind}'")]
    UnknownKind { file: String, index: usize, kind: String },

    #[error("{file} document {index}: bad graph annotation: {message}")]
    Fragment { file: String, index: usize, message: String },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Inference step '{step}' failed: {message}")]
    Inference { step: &'static str, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
