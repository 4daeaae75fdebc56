//! # Document Model
//!
//! A configuration file holds one or more YAML documents shaped as
//! `{kind, metadata: {name, labels, annotations}, spec}`. Decoding turns each
//! into a [`Document`] whose payload is a closed [`KindSpec`] union, so every
//! mapper dispatch is an exhaustive `match`.
//!
//! Decoding never drops a document silently: every position in the stream
//! yields either a `Document` or an error naming the file and position.

pub mod fragment;
pub mod kinds;
pub mod text;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::{Error, ImportOptions, Result};
pub use fragment::{FragmentNode, GraphFragment, GRAPH_ANNOTATION};
pub use kinds::*;

// ============================================================================
// Kind tag
// ============================================================================

/// The nine document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    SignalGroup,
    Model,
    Stack,
    Network,
    Propagator,
    Manifest,
    Simulation,
    ParameterSet,
    Runnable,
}

impl Kind {
    pub const ALL: [Kind; 9] = [
        Kind::SignalGroup,
        Kind::Model,
        Kind::Stack,
        Kind::Network,
        Kind::Propagator,
        Kind::Manifest,
        Kind::Simulation,
        Kind::ParameterSet,
        Kind::Runnable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::SignalGroup => "SignalGroup",
            Kind::Model => "Model",
            Kind::Stack => "Stack",
            Kind::Network => "Network",
            Kind::Propagator => "Propagator",
            Kind::Manifest => "Manifest",
            Kind::Simulation => "Simulation",
            Kind::ParameterSet => "ParameterSet",
            Kind::Runnable => "Runnable",
        }
    }

    /// Namespace label of the primary node. Only Simulation is design-time.
    pub fn namespace(self) -> &'static str {
        match self {
            Kind::Simulation => crate::mapper::AST,
            _ => crate::mapper::SIM,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        Kind::ALL.into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Kind-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub enum KindSpec {
    SignalGroup(SignalGroupSpec),
    Model(ModelSpec),
    Stack(StackSpec),
    Network(NetworkSpec),
    Propagator(PropagatorSpec),
    Manifest(ManifestSpec),
    Simulation(SimulationSpec),
    ParameterSet(ParameterSetSpec),
    Runnable(RunnableSpec),
}

impl KindSpec {
    /// Decode the raw `spec` value for `kind`.
    fn decode(kind: Kind, spec: serde_yaml::Value) -> std::result::Result<Self, serde_yaml::Error> {
        use serde_yaml::from_value;
        Ok(match kind {
            Kind::SignalGroup => KindSpec::SignalGroup(from_value(spec)?),
            Kind::Model => KindSpec::Model(from_value(spec)?),
            Kind::Stack => KindSpec::Stack(from_value(spec)?),
            Kind::Network => KindSpec::Network(from_value(spec)?),
            Kind::Propagator => KindSpec::Propagator(from_value(spec)?),
            Kind::Manifest => KindSpec::Manifest(from_value(spec)?),
            Kind::Simulation => KindSpec::Simulation(from_value(spec)?),
            Kind::ParameterSet => KindSpec::ParameterSet(from_value(spec)?),
            Kind::Runnable => KindSpec::Runnable(from_value(spec)?),
        })
    }

    pub fn kind(&self) -> Kind {
        match self {
            KindSpec::SignalGroup(_) => Kind::SignalGroup,
            KindSpec::Model(_) => Kind::Model,
            KindSpec::Stack(_) => Kind::Stack,
            KindSpec::Network(_) => Kind::Network,
            KindSpec::Propagator(_) => Kind::Propagator,
            KindSpec::Manifest(_) => Kind::Manifest,
            KindSpec::Simulation(_) => Kind::Simulation,
            KindSpec::ParameterSet(_) => Kind::ParameterSet,
            KindSpec::Runnable(_) => Kind::Runnable,
        }
    }
}

// ============================================================================
// Document
// ============================================================================

/// One decoded configuration document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Base name of the source file.
    pub file: String,
    /// 1-based position within the file.
    pub index: usize,
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, serde_json::Value>,
    /// Parsed `annotations.graph` block, if any.
    pub fragment: Option<GraphFragment>,
    pub spec: KindSpec,
}

impl Document {
    pub fn kind(&self) -> Kind {
        self.spec.kind()
    }
}

#[derive(Deserialize)]
struct RawDocument {
    kind: Option<String>,
    #[serde(default)]
    metadata: Option<RawMetadata>,
    #[serde(default)]
    spec: serde_yaml::Value,
}

#[derive(Default, Deserialize)]
struct RawMetadata {
    #[serde(default, deserialize_with = "text::option")]
    name: Option<String>,
    #[serde(default, deserialize_with = "text::map")]
    labels: BTreeMap<String, String>,
    #[serde(default)]
    annotations: Option<BTreeMap<String, serde_json::Value>>,
}

/// Decode every YAML document in `text`. `file` names the source in errors.
///
/// Empty documents (a bare `---`) occupy a position but yield nothing.
/// A YAML syntax error ends the stream: the parser cannot resynchronise.
pub fn decode_str(file: &str, text: &str) -> Vec<Result<Document>> {
    let mut out = Vec::new();

    for (pos, de) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let index = pos + 1;
        let raw = match Option::<RawDocument>::deserialize(de) {
            Ok(Some(raw)) => raw,
            Ok(None) => continue,
            Err(e) => {
                warn!(file, index, error = %e, "undecodable document");
                out.push(Err(Error::Decode { file: file.into(), index, message: e.to_string() }));
                continue;
            }
        };
        let doc = decode_document(file, index, raw);
        if let Ok(doc) = &doc {
            debug!(file, index, kind = %doc.kind(), name = %doc.name, "decoded document");
        }
        out.push(doc);
    }
    out
}

fn decode_document(file: &str, index: usize, raw: RawDocument) -> Result<Document> {
    let decode_err = |message: String| Error::Decode { file: file.into(), index, message };

    let kind_tag = raw.kind.ok_or_else(|| decode_err("missing 'kind'".into()))?;
    let kind: Kind = kind_tag.parse().map_err(|kind| Error::UnknownKind {
        file: file.into(),
        index,
        kind,
    })?;

    let metadata = raw.metadata.unwrap_or_default();
    let name = metadata.name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| decode_err("missing 'metadata.name'".into()))?;
    let annotations = metadata.annotations.unwrap_or_default();

    let fragment = annotations.get(GRAPH_ANNOTATION)
        .map(GraphFragment::parse)
        .transpose()
        .map_err(|message| Error::Fragment { file: file.into(), index, message })?;

    let spec = match raw.spec {
        serde_yaml::Value::Null => serde_yaml::Value::Mapping(Default::default()),
        other => other,
    };
    let spec = KindSpec::decode(kind, spec)
        .map_err(|e| decode_err(format!("{kind} spec: {e}")))?;

    Ok(Document {
        file: file.into(),
        index,
        name,
        labels: metadata.labels,
        annotations,
        fragment,
        spec,
    })
}

// ============================================================================
// Detection
// ============================================================================

/// A source file and its decode outcomes.
#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub documents: Vec<Result<Document>>,
}

impl SourceFile {
    /// File name used for the `File` node.
    pub fn name(&self) -> String {
        base_name(&self.path)
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read and decode one file.
pub fn load_file(path: &Path) -> Result<SourceFile> {
    let text = std::fs::read_to_string(path)?;
    let documents = decode_str(&base_name(path), &text);
    Ok(SourceFile { path: path.to_path_buf(), documents })
}

/// Collect the documents under `path`.
///
/// A file is decoded as-is. A directory is walked recursively, in file-name
/// order, picking up files whose extension is in `options.extensions`.
pub fn detect(path: &Path, options: &ImportOptions) -> Result<Vec<SourceFile>> {
    if !path.is_dir() {
        return Ok(vec![load_file(path)?]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if !entry.file_type().is_file() || !options.accepts(entry.path()) {
            continue;
        }
        files.push(load_file(entry.path())?);
    }
    info!(path = %path.display(), files = files.len(), "detected documents");
    Ok(files)
}
