//! Kind payload shapes.
//!
//! Keys are camelCase in the YAML. Collections default to empty and scalars
//! are optional unless a field is the natural key of its structure. Text
//! fields read any scalar through [`text`].
//! Free-form fields (annotations, env maps, numeric-or-text values) stay as
//! `serde_json::Value` and are stored as opaque properties.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::text;

type Opaque = Option<serde_json::Value>;

// ============================================================================
// SignalGroup
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignalGroupSpec {
    pub signals: Vec<GroupSignal>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSignal {
    #[serde(deserialize_with = "text::string")]
    pub signal: String,
    #[serde(default)]
    pub annotations: Opaque,
}

// ============================================================================
// Model
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelSpec {
    pub channels: Vec<ChannelSelectors>,
    pub runtime: Option<ModelRuntime>,
}

/// A channel requirement: alias plus selector tags.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelSelectors {
    #[serde(default, deserialize_with = "text::option")]
    pub alias: Option<String>,
    #[serde(default, deserialize_with = "text::map")]
    pub selectors: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelRuntime {
    pub dynlib: Vec<Lib>,
    pub executable: Vec<Executable>,
    pub gateway: Option<Gateway>,
    pub mcl: Vec<Lib>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Lib {
    #[serde(default, deserialize_with = "text::option")]
    pub arch: Option<String>,
    #[serde(default, deserialize_with = "text::option")]
    pub os: Option<String>,
    #[serde(default, deserialize_with = "text::option")]
    pub path: Option<String>,
    pub annotations: Opaque,
    #[serde(default, deserialize_with = "text::list")]
    pub libs: Vec<String>,
    #[serde(default, deserialize_with = "text::option")]
    pub variant: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Executable {
    #[serde(default, deserialize_with = "text::option")]
    pub arch: Option<String>,
    #[serde(default, deserialize_with = "text::option")]
    pub os: Option<String>,
    pub annotations: Opaque,
    #[serde(default, deserialize_with = "text::list")]
    pub libs: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Gateway {
    pub annotations: Opaque,
}

// ============================================================================
// Stack
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StackSpec {
    pub models: Vec<ModelInstance>,
    pub connection: Option<Connection>,
    pub runtime: Option<StackRuntime>,
}

/// Instance name reserved for the simulation bus.
pub const SIMBUS: &str = "simbus";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInstance {
    #[serde(deserialize_with = "text::string")]
    pub name: String,
    #[serde(default)]
    pub uid: Option<i64>,
    #[serde(default)]
    pub model: Option<ModelRef>,
    #[serde(default)]
    pub annotations: Opaque,
    #[serde(default)]
    pub channels: Vec<StackChannel>,
    #[serde(default)]
    pub runtime: Option<InstanceRuntime>,
}

impl ModelInstance {
    pub fn is_simbus(&self) -> bool {
        self.name == SIMBUS
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model.as_ref().map(|m| m.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelRef {
    #[serde(deserialize_with = "text::string")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StackChannel {
    #[serde(default, deserialize_with = "text::option")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "text::option")]
    pub alias: Option<String>,
    #[serde(default, deserialize_with = "text::map")]
    pub selectors: BTreeMap<String, String>,
    pub expected_model_count: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstanceRuntime {
    pub env: Opaque,
    pub x32: Option<bool>,
    #[serde(default, deserialize_with = "text::list")]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Connection {
    #[serde(default, deserialize_with = "text::option")]
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StackRuntime {
    pub env: Opaque,
    pub stacked: Option<bool>,
}

// ============================================================================
// Network
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkSpec {
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(deserialize_with = "text::string")]
    pub message: String,
    #[serde(default)]
    pub annotations: Opaque,
    #[serde(default)]
    pub signals: Vec<MessageSignal>,
    #[serde(default)]
    pub functions: Option<Functions>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageSignal {
    #[serde(deserialize_with = "text::string")]
    pub signal: String,
    #[serde(default)]
    pub annotations: Opaque,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Functions {
    pub encode: Vec<Function>,
    pub decode: Vec<Function>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Function {
    #[serde(deserialize_with = "text::string")]
    pub function: String,
    #[serde(default)]
    pub annotations: Opaque,
}

// ============================================================================
// Propagator
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropagatorSpec {
    pub signals: Vec<PropagatorSignal>,
    pub options: Option<PropagatorOptions>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PropagatorSignal {
    #[serde(deserialize_with = "text::string")]
    pub signal: String,
    #[serde(default, deserialize_with = "text::option")]
    pub target: Option<String>,
    #[serde(default)]
    pub encoding: Option<Encoding>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Encoding {
    pub linear: Option<Linear>,
    pub mapping: Vec<Mapping>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Linear {
    pub factor: Option<f64>,
    pub offset: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Mapping {
    #[serde(default, deserialize_with = "text::option")]
    pub name: Option<String>,
    pub source: Opaque,
    pub target: Opaque,
    pub range: Option<Range>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Range {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PropagatorOptions {
    #[serde(default, deserialize_with = "text::option")]
    pub direction: Option<String>,
}

// ============================================================================
// Manifest
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManifestSpec {
    pub documentation: Vec<ManifestFile>,
    pub models: Vec<ManifestModel>,
    pub repos: Vec<Repo>,
    pub simulations: Vec<ManifestSimulation>,
    pub tools: Vec<Tool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ManifestFile {
    #[serde(deserialize_with = "text::string")]
    pub name: String,
    #[serde(default)]
    pub generate: Option<bool>,
    #[serde(default)]
    pub modelc: Option<bool>,
    #[serde(default, deserialize_with = "text::option")]
    pub processing: Option<String>,
    #[serde(default, deserialize_with = "text::option")]
    pub repo: Option<String>,
    #[serde(default, deserialize_with = "text::option")]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ManifestModel {
    #[serde(deserialize_with = "text::string")]
    pub name: String,
    #[serde(default)]
    pub arch: Opaque,
    #[serde(default, deserialize_with = "text::option")]
    pub repo: Option<String>,
    #[serde(default, deserialize_with = "text::option")]
    pub schema: Option<String>,
    #[serde(default, deserialize_with = "text::option")]
    pub version: Option<String>,
    #[serde(default)]
    pub channels: Vec<ChannelSelectors>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Repo {
    #[serde(deserialize_with = "text::string")]
    pub name: String,
    #[serde(default, deserialize_with = "text::option")]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "text::option")]
    pub registry: Option<String>,
    #[serde(default, deserialize_with = "text::option")]
    pub repo: Option<String>,
    #[serde(default, deserialize_with = "text::option")]
    pub token: Option<String>,
    #[serde(default, deserialize_with = "text::option")]
    pub user: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ManifestSimulation {
    #[serde(deserialize_with = "text::string")]
    pub name: String,
    #[serde(default)]
    pub parameters: Option<SimulationParameters>,
    #[serde(default)]
    pub files: Vec<ManifestFile>,
    #[serde(default)]
    pub models: Vec<ManifestSimModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    pub transport: Opaque,
    pub environment: Opaque,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ManifestSimModel {
    #[serde(deserialize_with = "text::string")]
    pub name: String,
    #[serde(default, deserialize_with = "text::option")]
    pub model: Option<String>,
    #[serde(default)]
    pub channels: Vec<ChannelSelectors>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tool {
    #[serde(deserialize_with = "text::string")]
    pub name: String,
    #[serde(default)]
    pub arch: Opaque,
    #[serde(default, deserialize_with = "text::option")]
    pub repo: Option<String>,
    #[serde(default, deserialize_with = "text::option")]
    pub schema: Option<String>,
    #[serde(default, deserialize_with = "text::option")]
    pub version: Option<String>,
}

// ============================================================================
// Simulation (Ast)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationSpec {
    #[serde(default, deserialize_with = "text::option")]
    pub arch: Option<String>,
    pub channels: Vec<SimulationChannel>,
    pub stacks: Vec<SimulationStack>,
    pub uses: Vec<Uses>,
    pub vars: Vec<Var>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationChannel {
    #[serde(deserialize_with = "text::string")]
    pub name: String,
    #[serde(default)]
    pub networks: Vec<ChannelNetwork>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelNetwork {
    #[serde(deserialize_with = "text::string")]
    pub name: String,
    #[serde(default, deserialize_with = "text::option")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationStack {
    #[serde(deserialize_with = "text::string")]
    pub name: String,
    #[serde(default, deserialize_with = "text::option")]
    pub arch: Option<String>,
    #[serde(default)]
    pub stacked: Option<bool>,
    #[serde(default)]
    pub env: Vec<Var>,
    #[serde(default)]
    pub models: Vec<SimulationModel>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationModel {
    #[serde(deserialize_with = "text::string")]
    pub name: String,
    #[serde(default, deserialize_with = "text::option")]
    pub arch: Option<String>,
    #[serde(default, deserialize_with = "text::option")]
    pub model: Option<String>,
    #[serde(default)]
    pub channels: Vec<ModelChannelRef>,
    #[serde(default)]
    pub env: Vec<Var>,
    #[serde(default)]
    pub workflows: Vec<Workflow>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelChannelRef {
    #[serde(deserialize_with = "text::string")]
    pub name: String,
    #[serde(default, deserialize_with = "text::option")]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Workflow {
    #[serde(deserialize_with = "text::string")]
    pub name: String,
    #[serde(default, deserialize_with = "text::option")]
    pub uses: Option<String>,
    #[serde(default)]
    pub vars: Vec<Var>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Uses {
    #[serde(deserialize_with = "text::string")]
    pub name: String,
    #[serde(default, deserialize_with = "text::option")]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "text::option")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "text::option")]
    pub version: Option<String>,
}

/// `name=value` pair used for env entries and workflow vars.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Var {
    #[serde(deserialize_with = "text::string")]
    pub name: String,
    #[serde(default, deserialize_with = "text::string")]
    pub value: String,
}

// ============================================================================
// ParameterSet / Runnable
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ParameterSetSpec {
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Parameter {
    #[serde(deserialize_with = "text::string")]
    pub parameter: String,
    #[serde(default)]
    pub value: Opaque,
    #[serde(default)]
    pub annotations: Opaque,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunnableSpec {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Task {
    #[serde(deserialize_with = "text::string")]
    pub function: String,
    #[serde(default)]
    pub schedule: Option<i64>,
}
