//! Remote Neo4j store over the Bolt protocol (`neo4rs`).
//!
//! Every trait call is one auto-commit statement. Neo4j properties cannot
//! hold maps, so map values and lists containing containers are written as
//! JSON strings and read back as strings.

use std::collections::HashMap;
use std::fmt::Display;

use async_trait::async_trait;
use neo4rs::{query, BoltNull, BoltType, ConfigBuilder, Query};
use tracing::{debug, info};

use super::{BoltConfig, DropScope, GraphStore};
use crate::model::*;
use crate::{Error, Result};

/// Neo4j graph store.
pub struct BoltStore {
    graph: neo4rs::Graph,
}

fn store_err(e: impl Display) -> Error {
    Error::StorageError(e.to_string())
}

/// Backtick a label, type or property key for literal use in Cypher.
fn ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn to_bolt(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Bool(b) => BoltType::from(*b),
        Value::Int(i) => BoltType::from(*i),
        Value::Float(f) => BoltType::from(*f),
        Value::String(s) => BoltType::from(s.as_str()),
        v if v.is_nested() => BoltType::from(v.to_json().to_string()),
        Value::List(items) => BoltType::from(items.iter().map(to_bolt).collect::<Vec<_>>()),
        Value::Map(_) => BoltType::from(value.to_json().to_string()),
    }
}

fn to_bolt_map(props: &PropertyMap) -> HashMap<String, BoltType> {
    props.iter().map(|(k, v)| (k.clone(), to_bolt(v))).collect()
}

fn from_json_props(props: HashMap<String, serde_json::Value>) -> PropertyMap {
    props.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
}

fn node_id(raw: i64) -> NodeId {
    NodeId(raw as u64)
}

impl BoltStore {
    /// Open a connection pool to the configured server.
    pub async fn connect(config: &BoltConfig) -> Result<Self> {
        let mut builder = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.user.as_str())
            .password(config.password.as_str());
        if let Some(db) = &config.database {
            builder = builder.db(db.as_str());
        }
        let graph = neo4rs::Graph::connect(builder.build().map_err(store_err)?)
            .await
            .map_err(store_err)?;
        info!(uri = %config.uri, "connected to neo4j");
        Ok(Self { graph })
    }

    /// Run `q` and return its `id` column from the first row.
    async fn fetch_id(&self, q: Query) -> Result<Option<u64>> {
        let mut stream = self.graph.execute(q).await.map_err(store_err)?;
        match stream.next().await.map_err(store_err)? {
            Some(row) => Ok(Some(row.get::<i64>("id").map_err(store_err)? as u64)),
            None => Ok(None),
        }
    }

    async fn fetch_count(&self, cypher: &str, column: &str) -> Result<u64> {
        let mut stream = self.graph.execute(query(cypher)).await.map_err(store_err)?;
        match stream.next().await.map_err(store_err)? {
            Some(row) => Ok(row.get::<i64>(column).map_err(store_err)? as u64),
            None => Ok(0),
        }
    }

    async fn fetch_nodes(&self, cypher: &str) -> Result<Vec<Node>> {
        let mut stream = self.graph.execute(query(cypher)).await.map_err(store_err)?;
        let mut nodes = Vec::new();
        while let Some(row) = stream.next().await.map_err(store_err)? {
            let id: i64 = row.get("id").map_err(store_err)?;
            let labels: Vec<String> = row.get("labels").map_err(store_err)?;
            let props: HashMap<String, serde_json::Value> = row.get("props").map_err(store_err)?;
            let mut node = Node::new(node_id(id)).with_labels(labels);
            node.properties = from_json_props(props);
            nodes.push(node);
        }
        Ok(nodes)
    }
}

#[async_trait]
impl GraphStore for BoltStore {
    async fn ping(&self) -> Result<()> {
        self.fetch_id(query("RETURN 1 AS id")).await?;
        Ok(())
    }

    async fn upsert_node(
        &self,
        labels: &[&str],
        match_props: PropertyMap,
        props: PropertyMap,
    ) -> Result<NodeId> {
        let label_part: String = labels.iter().map(|l| format!(":{}", ident(l))).collect();

        let mut keys: Vec<&String> = match_props.keys().collect();
        keys.sort();
        let key_part = keys.iter()
            .enumerate()
            .map(|(i, k)| format!("{}: $m{i}", ident(k)))
            .collect::<Vec<_>>()
            .join(", ");

        let cypher = format!("MERGE (n{label_part} {{{key_part}}}) SET n += $props RETURN id(n) AS id");
        let mut q = query(&cypher).param("props", to_bolt_map(&props));
        for (i, k) in keys.iter().enumerate() {
            q = q.param(&format!("m{i}"), to_bolt(&match_props[*k]));
        }

        let id = self.fetch_id(q).await?
            .ok_or_else(|| Error::StorageError(format!("MERGE {labels:?} returned no id")))?;
        debug!(?labels, id, "upsert node");
        Ok(NodeId(id))
    }

    async fn upsert_relationship(
        &self,
        start: NodeId,
        end: NodeId,
        rel_type: &str,
        props: Option<PropertyMap>,
    ) -> Result<RelId> {
        let set_part = if props.is_some() { " SET r += $props" } else { "" };
        let cypher = format!(
            "MATCH (a) WHERE id(a) = $start MATCH (b) WHERE id(b) = $end \
             MERGE (a)-[r:{}]->(b){set_part} RETURN id(r) AS id",
            ident(rel_type),
        );
        let mut q = query(&cypher)
            .param("start", start.0 as i64)
            .param("end", end.0 as i64);
        if let Some(props) = &props {
            q = q.param("props", to_bolt_map(props));
        }

        self.fetch_id(q).await?
            .map(RelId)
            .ok_or_else(|| Error::NotFound(format!("Node {start} or {end}")))
    }

    async fn run_scalar_write(&self, cypher: &str, params: PropertyMap) -> Result<Option<u64>> {
        let q = params.iter().fold(query(cypher), |q, (k, v)| q.param(k, to_bolt(v)));
        self.fetch_id(q).await
    }

    async fn drop_by_label(&self, scope: DropScope) -> Result<u64> {
        let cypher = match scope.label() {
            Some(label) => format!("MATCH (n:{}) DETACH DELETE n RETURN count(n) AS removed", ident(label)),
            None => "MATCH (n) DETACH DELETE n RETURN count(n) AS removed".to_string(),
        };
        self.fetch_count(&cypher, "removed").await
    }

    async fn all_nodes(&self) -> Result<Vec<Node>> {
        self.fetch_nodes("MATCH (n) RETURN id(n) AS id, labels(n) AS labels, properties(n) AS props ORDER BY id")
            .await
    }

    async fn nodes_by_label(&self, label: &str) -> Result<Vec<Node>> {
        self.fetch_nodes(&format!(
            "MATCH (n:{}) RETURN id(n) AS id, labels(n) AS labels, properties(n) AS props ORDER BY id",
            ident(label)
        ))
        .await
    }

    async fn all_relationships(&self) -> Result<Vec<Relationship>> {
        let mut stream = self.graph
            .execute(query(
                "MATCH (a)-[r]->(b) RETURN id(r) AS id, id(a) AS src, id(b) AS dst, \
                 type(r) AS type, properties(r) AS props ORDER BY id",
            ))
            .await
            .map_err(store_err)?;

        let mut rels = Vec::new();
        while let Some(row) = stream.next().await.map_err(store_err)? {
            let id: i64 = row.get("id").map_err(store_err)?;
            let src: i64 = row.get("src").map_err(store_err)?;
            let dst: i64 = row.get("dst").map_err(store_err)?;
            let rel_type: String = row.get("type").map_err(store_err)?;
            let props: HashMap<String, serde_json::Value> = row.get("props").map_err(store_err)?;
            let mut rel = Relationship::new(RelId(id as u64), node_id(src), node_id(dst), rel_type);
            rel.properties = from_json_props(props);
            rels.push(rel);
        }
        Ok(rels)
    }

    async fn node_count(&self) -> Result<u64> {
        self.fetch_count("MATCH (n) RETURN count(n) AS count", "count").await
    }

    async fn relationship_count(&self) -> Result<u64> {
        self.fetch_count("MATCH ()-[r]->() RETURN count(r) AS count", "count").await
    }
}
