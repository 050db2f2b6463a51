//! Relationship graph types for Strata.
//!
//! Edges are stored per source node as an ordered outgoing list. Lineage
//! edges only exist in traversal output and are never persisted.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::memory::VectorRecord;

/// How an edge came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    /// Derived from nearest-neighbor computation.
    Similarity,
    /// Registered explicitly by a caller.
    Manual,
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeType::Similarity => write!(f, "similarity"),
            EdgeType::Manual => write!(f, "manual"),
        }
    }
}

impl FromStr for EdgeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "similarity" => Ok(EdgeType::Similarity),
            "manual" => Ok(EdgeType::Manual),
            other => Err(format!("invalid edge type: '{other}'")),
        }
    }
}

/// An outgoing edge from some node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub target: String,
    /// Similarity score, typically cosine in [-1, 1].
    pub weight: f32,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

/// A traversed edge, annotated with the node it was reached from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageEdge {
    pub source: String,
    #[serde(flatten)]
    pub edge: GraphEdge,
}

/// Result of a bounded breadth-first lineage traversal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineageTrace {
    /// The starting record, if it exists in the store.
    pub root: Option<VectorRecord>,
    /// Every visited record including the root, in visit order.
    pub nodes: Vec<VectorRecord>,
    /// Edges in traversal order.
    pub edges: Vec<LineageEdge>,
}

/// Persisted form of the graph: node id to outgoing edges.
pub type GraphSnapshot = BTreeMap<String, Vec<GraphEdge>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_type_roundtrip() {
        for ty in [EdgeType::Similarity, EdgeType::Manual] {
            let parsed: EdgeType = ty.to_string().parse().unwrap();
            assert_eq!(ty, parsed);
        }
    }

    #[test]
    fn test_graph_edge_uses_type_field() {
        let edge = GraphEdge {
            target: "b".to_string(),
            weight: 0.25,
            edge_type: EdgeType::Manual,
            timestamp: 42,
        };
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["type"], "manual");
        assert_eq!(json["target"], "b");

        let parsed: GraphEdge = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, edge);
    }

    #[test]
    fn test_lineage_edge_flattens_edge() {
        let edge = LineageEdge {
            source: "a".to_string(),
            edge: GraphEdge {
                target: "b".to_string(),
                weight: 1.0,
                edge_type: EdgeType::Similarity,
                timestamp: 0,
            },
        };
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["source"], "a");
        assert_eq!(json["target"], "b");
        assert_eq!(json["type"], "similarity");
    }
}
