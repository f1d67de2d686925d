//! Graph host capability and the bundled in-memory host.
//!
//! The engine talks to a graph visualization host only through the
//! [`HostGraph`] trait: nodes and directed edges keyed by [`Id`], a generic
//! [`AttributeBag`] per item and a view-space position per node.
//!
//! [`MemoryGraph`] implements the trait with plain maps:
//! - Node and edge storage in insertion order
//! - Tracking of both incoming and outgoing edges per node
//! - Serialization of the whole graph for inspection

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;

use pathweave_core::{geometry::Point, identifier::Id};

use crate::{
    attributes::{AttributeBag, HostAttribute},
    error::PathweaveError,
};

/// Capabilities the engine needs from a graph host.
///
/// Positions are in view units. Node and edge ids share one namespace.
pub trait HostGraph {
    /// Creates a node at a view position.
    fn create_node(&mut self, id: Id, position: Point) -> Result<(), PathweaveError>;

    /// Removes a node and every edge incident to it.
    ///
    /// Returns the ids of the removed edges.
    fn remove_node(&mut self, id: Id) -> Result<Vec<Id>, PathweaveError>;

    /// Creates a directed edge between two existing nodes.
    fn create_edge(&mut self, id: Id, source: Id, target: Id) -> Result<(), PathweaveError>;

    fn remove_edge(&mut self, id: Id) -> Result<(), PathweaveError>;

    fn contains_node(&self, id: Id) -> bool;

    fn contains_edge(&self, id: Id) -> bool;

    /// Returns `(source, target)` of an edge.
    fn edge_endpoints(&self, id: Id) -> Option<(Id, Id)>;

    /// Returns the attribute bag of a node or edge.
    fn attributes(&self, id: Id) -> Option<AttributeBag>;

    /// Sets one attribute of a node or edge.
    fn set_attribute(
        &mut self,
        id: Id,
        name: &str,
        attribute: HostAttribute,
    ) -> Result<(), PathweaveError>;

    fn position(&self, id: Id) -> Option<Point>;

    fn set_position(&mut self, id: Id, position: Point) -> Result<(), PathweaveError>;
}

#[derive(Debug, Clone, Serialize)]
struct HostNode {
    position: Point,
    attributes: AttributeBag,
}

#[derive(Debug, Clone, Serialize)]
struct HostEdge {
    source: Id,
    target: Id,
    attributes: AttributeBag,
}

/// In-memory graph host.
///
/// The graph is directed and allows self-loops and multiple edges between
/// nodes.
///
/// # Examples
///
/// ```
/// # use pathweave::host::{HostGraph, MemoryGraph};
/// # use pathweave_core::{geometry::Point, identifier::Id};
/// let mut graph = MemoryGraph::new();
/// graph.create_node(Id::new("a"), Point::new(0.0, 0.0)).unwrap();
/// graph.create_node(Id::new("b"), Point::new(50.0, 0.0)).unwrap();
/// graph.create_edge(Id::new("e"), Id::new("a"), Id::new("b")).unwrap();
///
/// let removed = graph.remove_node(Id::new("b")).unwrap();
/// assert_eq!(removed, vec![Id::new("e")]);
/// assert_eq!(graph.edge_count(), 0);
/// ```
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemoryGraph {
    nodes: IndexMap<Id, HostNode>,
    edges: IndexMap<Id, HostEdge>,
    #[serde(skip)]
    incoming_edges: HashMap<Id, Vec<Id>>,
    #[serde(skip)]
    outgoing_edges: HashMap<Id, Vec<Id>>,
}

impl MemoryGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the total number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Iterates over node ids in creation order
    pub fn node_ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.nodes.keys().copied()
    }

    /// Iterates over edge ids in creation order
    pub fn edge_ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.edges.keys().copied()
    }

    /// Returns the ids of edges ending at `node`.
    pub fn incoming(&self, node: Id) -> &[Id] {
        self.incoming_edges.get(&node).map_or(&[], Vec::as_slice)
    }

    /// Returns the ids of edges starting at `node`.
    pub fn outgoing(&self, node: Id) -> &[Id] {
        self.outgoing_edges.get(&node).map_or(&[], Vec::as_slice)
    }

    /// Returns the value of one attribute of a node or edge
    pub fn attribute(&self, id: Id, name: &str) -> Option<&HostAttribute> {
        self.bag(id).and_then(|bag| bag.get(name))
    }

    fn bag(&self, id: Id) -> Option<&AttributeBag> {
        self.nodes
            .get(&id)
            .map(|node| &node.attributes)
            .or_else(|| self.edges.get(&id).map(|edge| &edge.attributes))
    }

    fn bag_mut(&mut self, id: Id) -> Option<&mut AttributeBag> {
        if let Some(node) = self.nodes.get_mut(&id) {
            return Some(&mut node.attributes);
        }
        self.edges.get_mut(&id).map(|edge| &mut edge.attributes)
    }

    fn unlink(&mut self, id: Id, edge: &HostEdge) {
        if let Some(outgoing) = self.outgoing_edges.get_mut(&edge.source) {
            outgoing.retain(|held| *held != id);
        }
        if let Some(incoming) = self.incoming_edges.get_mut(&edge.target) {
            incoming.retain(|held| *held != id);
        }
    }
}

impl HostGraph for MemoryGraph {
    fn create_node(&mut self, id: Id, position: Point) -> Result<(), PathweaveError> {
        if self.nodes.contains_key(&id) || self.edges.contains_key(&id) {
            return Err(PathweaveError::Host(format!("`{id}` already exists")));
        }
        self.nodes.insert(
            id,
            HostNode {
                position,
                attributes: AttributeBag::new(),
            },
        );
        Ok(())
    }

    fn remove_node(&mut self, id: Id) -> Result<Vec<Id>, PathweaveError> {
        if self.nodes.shift_remove(&id).is_none() {
            return Err(PathweaveError::Host(format!("no node `{id}`")));
        }
        let mut incident: Vec<Id> = self.incoming(id).to_vec();
        for edge in self.outgoing(id) {
            if !incident.contains(edge) {
                incident.push(*edge);
            }
        }
        for edge in &incident {
            self.remove_edge(*edge)?;
        }
        self.incoming_edges.remove(&id);
        self.outgoing_edges.remove(&id);
        Ok(incident)
    }

    fn create_edge(&mut self, id: Id, source: Id, target: Id) -> Result<(), PathweaveError> {
        if self.nodes.contains_key(&id) || self.edges.contains_key(&id) {
            return Err(PathweaveError::Host(format!("`{id}` already exists")));
        }
        for endpoint in [source, target] {
            if !self.nodes.contains_key(&endpoint) {
                return Err(PathweaveError::Host(format!(
                    "edge `{id}`: no node `{endpoint}`"
                )));
            }
        }
        self.edges.insert(
            id,
            HostEdge {
                source,
                target,
                attributes: AttributeBag::new(),
            },
        );
        self.outgoing_edges.entry(source).or_default().push(id);
        self.incoming_edges.entry(target).or_default().push(id);
        Ok(())
    }

    fn remove_edge(&mut self, id: Id) -> Result<(), PathweaveError> {
        let edge = self
            .edges
            .shift_remove(&id)
            .ok_or_else(|| PathweaveError::Host(format!("no edge `{id}`")))?;
        self.unlink(id, &edge);
        Ok(())
    }

    fn contains_node(&self, id: Id) -> bool {
        self.nodes.contains_key(&id)
    }

    fn contains_edge(&self, id: Id) -> bool {
        self.edges.contains_key(&id)
    }

    fn edge_endpoints(&self, id: Id) -> Option<(Id, Id)> {
        self.edges.get(&id).map(|edge| (edge.source, edge.target))
    }

    fn attributes(&self, id: Id) -> Option<AttributeBag> {
        self.bag(id).cloned()
    }

    fn set_attribute(
        &mut self,
        id: Id,
        name: &str,
        attribute: HostAttribute,
    ) -> Result<(), PathweaveError> {
        let bag = self
            .bag_mut(id)
            .ok_or_else(|| PathweaveError::Host(format!("no node or edge `{id}`")))?;
        bag.insert(name.to_string(), attribute);
        Ok(())
    }

    fn position(&self, id: Id) -> Option<Point> {
        self.nodes.get(&id).map(|node| node.position)
    }

    fn set_position(&mut self, id: Id, position: Point) -> Result<(), PathweaveError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| PathweaveError::Host(format!("no node `{id}`")))?;
        node.position = position;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::HostValue;

    fn graph_with_nodes(ids: &[&str]) -> MemoryGraph {
        let mut graph = MemoryGraph::new();
        for (i, id) in ids.iter().enumerate() {
            graph
                .create_node(Id::new(id), Point::new(i as f32 * 10.0, 0.0))
                .unwrap();
        }
        graph
    }

    #[test]
    fn test_graph_new() {
        let graph = MemoryGraph::new();

        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.node_ids().count(), 0);
    }

    #[test]
    fn test_create_node_twice_fails() {
        let mut graph = graph_with_nodes(&["node1"]);

        let result = graph.create_node(Id::new("node1"), Point::default());
        assert!(matches!(result, Err(PathweaveError::Host(_))));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_add_edge() {
        let mut graph = graph_with_nodes(&["source", "target"]);
        let edge = Id::new("edge");

        graph
            .create_edge(edge, Id::new("source"), Id::new("target"))
            .unwrap();

        assert!(graph.contains_edge(edge));
        assert_eq!(
            graph.edge_endpoints(edge),
            Some((Id::new("source"), Id::new("target")))
        );
        assert_eq!(graph.outgoing(Id::new("source")), &[edge]);
        assert_eq!(graph.incoming(Id::new("target")), &[edge]);
        assert!(graph.incoming(Id::new("source")).is_empty());
    }

    #[test]
    fn test_add_edge_missing_endpoint() {
        let mut graph = graph_with_nodes(&["source"]);

        let result = graph.create_edge(Id::new("e"), Id::new("source"), Id::new("ghost"));
        assert!(result.is_err());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_self_loop_removed_once() {
        let mut graph = graph_with_nodes(&["node"]);
        let node = Id::new("node");
        graph.create_edge(Id::new("loop"), node, node).unwrap();

        let removed = graph.remove_node(node).unwrap();
        assert_eq!(removed, vec![Id::new("loop")]);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_multiple_edges_between_nodes() {
        let mut graph = graph_with_nodes(&["a", "b"]);
        graph.create_edge(Id::new("e1"), Id::new("a"), Id::new("b")).unwrap();
        graph.create_edge(Id::new("e2"), Id::new("a"), Id::new("b")).unwrap();

        assert_eq!(graph.outgoing(Id::new("a")).len(), 2);

        graph.remove_edge(Id::new("e1")).unwrap();
        assert_eq!(graph.outgoing(Id::new("a")), &[Id::new("e2")]);
    }

    #[test]
    fn test_attributes_and_position() {
        let mut graph = graph_with_nodes(&["n"]);
        let node = Id::new("n");

        graph
            .set_attribute(node, "canonicalName", HostAttribute::visible("ATP"))
            .unwrap();
        graph.set_position(node, Point::new(3.0, 4.0)).unwrap();

        assert_eq!(
            graph.attribute(node, "canonicalName").map(|a| &a.value),
            Some(&HostValue::from("ATP"))
        );
        assert_eq!(graph.position(node), Some(Point::new(3.0, 4.0)));
        assert!(graph
            .set_attribute(Id::new("ghost"), "x", HostAttribute::visible("y"))
            .is_err());
    }

    #[test]
    fn test_serialize_snapshot() {
        let mut graph = graph_with_nodes(&["a", "b"]);
        graph.create_edge(Id::new("e"), Id::new("a"), Id::new("b")).unwrap();

        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(json["edges"]["e"]["source"], "a");
        assert_eq!(json["nodes"]["b"]["position"]["x"], 10.0);
        assert!(json.get("incoming_edges").is_none());
    }
}
