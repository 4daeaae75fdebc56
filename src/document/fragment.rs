//! The `annotations.graph` extension block.
//!
//! ```yaml
//! metadata:
//!   annotations:
//!     graph:
//!       edge: { label: Uses, direction: in }
//!       nodes:
//!         - label: Extra
//!           properties: { k: v, weight: 2 }
//! ```

use serde::Deserialize;

use crate::model::Direction;

/// Annotation key holding the fragment.
pub const GRAPH_ANNOTATION: &str = "graph";

/// Declarative extra nodes attached to a document's primary node.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphFragment {
    pub edge_label: String,
    /// `Outgoing`: primary → extra node. `Incoming`: extra node → primary.
    pub direction: Direction,
    pub nodes: Vec<FragmentNode>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FragmentNode {
    pub label: String,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct RawFragment {
    #[serde(default)]
    edge: Option<RawEdge>,
    #[serde(default)]
    nodes: Vec<FragmentNode>,
}

#[derive(Deserialize)]
struct RawEdge {
    label: Option<String>,
    direction: Option<String>,
}

impl GraphFragment {
    /// Parse the block. Errors are plain messages; the caller attaches
    /// file and document position.
    pub fn parse(block: &serde_json::Value) -> Result<Self, String> {
        let raw: RawFragment =
            serde_json::from_value(block.clone()).map_err(|e| e.to_string())?;
        let edge = raw.edge.unwrap_or(RawEdge { label: None, direction: None });

        let direction = match edge.direction.as_deref() {
            None | Some("out") => Direction::Outgoing,
            Some("in") => Direction::Incoming,
            Some(other) => return Err(format!("edge direction '{other}' (expected 'in' or 'out')")),
        };

        let edge_label = match edge.label {
            Some(label) if !label.trim().is_empty() => label,
            _ if raw.nodes.is_empty() => String::new(),
            _ => return Err("edge label is required when nodes are declared".into()),
        };

        if let Some(node) = raw.nodes.iter().find(|n| n.label.trim().is_empty()) {
            return Err(format!("node with empty label (properties {:?})", node.properties));
        }

        Ok(Self { edge_label, direction, nodes: raw.nodes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_direction_defaults_to_out() {
        let frag = GraphFragment::parse(&json!({
            "edge": {"label": "Uses"},
            "nodes": [{"label": "Extra", "properties": {"k": "v"}}]
        })).unwrap();
        assert_eq!(frag.direction, Direction::Outgoing);
        assert_eq!(frag.edge_label, "Uses");
        assert_eq!(frag.nodes[0].properties["k"], json!("v"));
    }

    #[test]
    fn test_in_direction() {
        let frag = GraphFragment::parse(&json!({
            "edge": {"label": "Feeds", "direction": "in"},
            "nodes": [{"label": "Extra"}]
        })).unwrap();
        assert_eq!(frag.direction, Direction::Incoming);
        assert!(frag.nodes[0].properties.is_empty());
    }

    #[test]
    fn test_rejects_bad_blocks() {
        assert!(GraphFragment::parse(&json!({"edge": {"label": "X", "direction": "sideways"}})).is_err());
        assert!(GraphFragment::parse(&json!({"nodes": [{"label": "Extra"}]})).is_err());
        assert!(GraphFragment::parse(&json!({"edge": {"label": "X"}, "nodes": [{"label": ""}]})).is_err());
        assert!(GraphFragment::parse(&json!("not a map")).is_err());
    }
}
