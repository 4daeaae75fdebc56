//! Export and drop tests over an imported fixture graph.

use std::path::Path;

use pretty_assertions::assert_eq;
use simgraph::storage::MemoryStore;
use simgraph::{DropScope, Graph, GraphStore};

fn fixtures() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sim"))
}

async fn imported() -> Graph<MemoryStore> {
    let graph = Graph::open_memory().await.unwrap();
    let report = graph.import_path(fixtures()).await.unwrap();
    assert!(report.is_success());
    graph
}

async fn count_with_label(graph: &Graph<MemoryStore>, label: &str) -> usize {
    graph.store().nodes_by_label(label).await.unwrap().len()
}

// ============================================================================
// Export
// ============================================================================

#[tokio::test]
async fn test_export_one_statement_per_element() {
    let graph = imported().await;
    let nodes = graph.store().node_count().await.unwrap() as usize;
    let rels = graph.store().relationship_count().await.unwrap() as usize;

    let mut buf = Vec::new();
    graph.export(&mut buf).await.unwrap();
    let script = String::from_utf8(buf).unwrap();

    let node_lines = script.lines().filter(|l| l.starts_with("MERGE (n")).count();
    let rel_lines = script.lines().filter(|l| l.starts_with("MATCH (a")).count();
    assert_eq!(node_lines, nodes);
    assert_eq!(rel_lines, rels);
    assert!(script.contains(&format!("// Nodes: {nodes}")));
    assert!(script.lines().filter(|l| !l.is_empty() && !l.starts_with("//")).all(|l| l.ends_with(';')));
}

#[tokio::test]
async fn test_export_flattens_maps_and_quotes_strings() {
    let graph = imported().await;
    let mut buf = Vec::new();
    graph.export(&mut buf).await.unwrap();
    let script = String::from_utf8(buf).unwrap();

    let group = script.lines()
        .find(|l| l.contains(":Sim:SignalGroup") && l.contains("input_signals"))
        .expect("signal group statement");
    assert!(group.contains("name: 'input_signals'"));
    // labels map stored as JSON text
    assert!(group.contains(r#"labels: '{"channel":"signal_vector","model":"input"}'"#), "{group}");
}

#[tokio::test]
async fn test_export_empty_graph() {
    let graph = Graph::open_memory().await.unwrap();
    let mut buf = Vec::new();
    graph.export(&mut buf).await.unwrap();
    let script = String::from_utf8(buf).unwrap();

    assert!(script.contains("// Nodes: 0"));
    assert!(!script.contains("MERGE"));
}

// ============================================================================
// Drop
// ============================================================================

#[tokio::test]
async fn test_drop_ast_keeps_sim() {
    let graph = imported().await;
    let ast = count_with_label(&graph, "Ast").await;
    let sim = count_with_label(&graph, "Sim").await;
    assert!(ast > 0);

    let removed = graph.drop(DropScope::Ast).await.unwrap();
    assert_eq!(removed as usize, ast);
    assert_eq!(count_with_label(&graph, "Ast").await, 0);
    assert_eq!(count_with_label(&graph, "Sim").await, sim);

    // Bridges and Connects went with their Ast endpoints
    assert!(graph.store().relationships_by_type("Connects").await.unwrap().is_empty());
    assert_eq!(graph.store().relationships_by_type("Represents").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_drop_sim_then_reimport_restores() {
    let graph = imported().await;
    let nodes = graph.store().node_count().await.unwrap();
    let rels = graph.store().relationship_count().await.unwrap();

    graph.drop(DropScope::Sim).await.unwrap();
    assert_eq!(count_with_label(&graph, "Sim").await, 0);
    assert!(count_with_label(&graph, "Ast").await > 0);

    graph.import_path(fixtures()).await.unwrap();
    assert_eq!(graph.store().node_count().await.unwrap(), nodes);
    assert_eq!(graph.store().relationship_count().await.unwrap(), rels);
}

#[tokio::test]
async fn test_drop_all() {
    let graph = imported().await;
    let total = graph.store().node_count().await.unwrap();

    assert_eq!(graph.drop("--all".parse().unwrap()).await.unwrap(), total);
    assert_eq!(graph.store().node_count().await.unwrap(), 0);
    assert_eq!(graph.store().relationship_count().await.unwrap(), 0);
}
