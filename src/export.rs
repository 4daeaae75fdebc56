//! Cypher export: serialize the whole graph as an idempotent MERGE script.
//!
//! ```text
//! GraphStore → export_cypher() → MERGE statements
//!   → cypher-shell < dump.cypher, or paste into Neo4j Browser
//! ```
//!
//! Every node is merged on a synthetic `_export_id` so relationship
//! statements can find their endpoints; running the script twice yields the
//! same graph. Map-valued properties are written as JSON strings since Neo4j
//! cannot store maps.

use std::collections::BTreeMap;
use std::io::Write;

use tracing::info;

use crate::model::*;
use crate::storage::GraphStore;
use crate::Result;

/// Property carrying the exported node id.
pub const EXPORT_ID: &str = "_export_id";

/// Write a Cypher script reproducing every node and relationship in `store`.
pub async fn export_cypher<S: GraphStore + ?Sized>(store: &S, writer: &mut dyn Write) -> Result<()> {
    let nodes = store.all_nodes().await?;
    let relationships = store.all_relationships().await?;

    writeln!(writer, "// simgraph Cypher export")?;
    writeln!(writer, "// Nodes: {}", nodes.len())?;
    writeln!(writer, "// Relationships: {}", relationships.len())?;
    writeln!(writer)?;

    for node in &nodes {
        let labels: String = node.labels.iter().map(|l| format!(":{}", quote_name(l))).collect();
        let props = format_properties(&node.properties);
        writeln!(
            writer,
            "MERGE (n{labels} {{{EXPORT_ID}: {}}}){};",
            node.id.0,
            if props.is_empty() { String::new() } else { format!(" SET n += {{{props}}}") },
        )?;
    }

    writeln!(writer)?;
    writeln!(writer, "// Relationships")?;

    for rel in &relationships {
        let props = format_properties(&rel.properties);
        writeln!(
            writer,
            "MATCH (a {{{EXPORT_ID}: {}}}), (b {{{EXPORT_ID}: {}}}) MERGE (a)-[r:{}]->(b){};",
            rel.src.0,
            rel.dst.0,
            quote_name(&rel.rel_type),
            if props.is_empty() { String::new() } else { format!(" SET r += {{{props}}}") },
        )?;
    }

    info!(nodes = nodes.len(), relationships = relationships.len(), "exported graph");
    Ok(())
}

/// Backtick a label or type unless it is a plain identifier.
fn quote_name(name: &str) -> String {
    let plain = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "``"))
    }
}

/// Format a PropertyMap as a Cypher map body, keys sorted.
fn format_properties(props: &PropertyMap) -> String {
    let sorted: BTreeMap<&String, &Value> = props.iter().filter(|(_, v)| !v.is_null()).collect();
    sorted.into_iter()
        .map(|(key, value)| format!("{}: {}", quote_name(key), format_value(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format a Value as a Cypher literal.
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => string_literal(s),
        Value::Int(i) => i.to_string(),
        Value::Float(f) if f.is_finite() => format!("{f:?}"),
        // No NaN or infinity literal in Cypher
        Value::Float(_) => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        v if v.is_nested() => string_literal(&v.to_json().to_string()),
        Value::List(items) => {
            let inner: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Map(_) => string_literal(&value.to_json().to_string()),
    }
}

fn string_literal(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&Value::String("it's".into())), "'it\\'s'");
        assert_eq!(format_value(&Value::Int(42)), "42");
        assert_eq!(format_value(&Value::Float(2.0)), "2.0");
        assert_eq!(format_value(&Value::Bool(true)), "true");
        assert_eq!(format_value(&Value::List(vec![Value::from("a")])), "['a']");
        assert_eq!(format_value(&Value::from(serde_json::json!({"b": 1, "a": 2}))), r#"'{"a":2,"b":1}'"#);
    }

    #[test]
    fn test_non_finite_floats_export_as_null() {
        assert_eq!(format_value(&Value::Float(f64::NAN)), "null");
        assert_eq!(format_value(&Value::Float(f64::INFINITY)), "null");
        assert_eq!(format_value(&Value::Float(f64::NEG_INFINITY)), "null");
        assert_eq!(format_value(&Value::Float(2.0)), "2.0");
        assert_eq!(
            format_value(&Value::List(vec![Value::Float(0.5), Value::Float(f64::NAN)])),
            "[0.5, null]"
        );
    }

    #[test]
    fn test_quote_name() {
        assert_eq!(quote_name("ModelInst"), "ModelInst");
        assert_eq!(quote_name("has space"), "`has space`");
        assert_eq!(quote_name("9lives"), "`9lives`");
    }

    #[tokio::test]
    async fn test_export_script() {
        let store = MemoryStore::new();
        let file = store.upsert_node(&["File"], props([("name", "a.yaml")]), PropertyMap::new()).await.unwrap();
        let stack = store.upsert_node(&["Sim", "Stack"], props([("name", "default")]), PropertyMap::new()).await.unwrap();
        store.upsert_relationship(file, stack, "Contains", Some(props([("index", 1)]))).await.unwrap();

        let mut out = Vec::new();
        export_cypher(&store, &mut out).await.unwrap();
        let script = String::from_utf8(out).unwrap();

        assert!(script.contains("// Nodes: 2"));
        assert!(script.contains("MERGE (n:File {_export_id: 1}) SET n += {name: 'a.yaml'};"));
        assert!(script.contains("MERGE (n:Sim:Stack {_export_id: 2}) SET n += {name: 'default'};"));
        assert!(script.contains(
            "MATCH (a {_export_id: 1}), (b {_export_id: 2}) MERGE (a)-[r:Contains]->(b) SET r += {index: 1};"
        ));
    }
}
