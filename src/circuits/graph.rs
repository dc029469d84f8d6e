//! Undirected node adjacency built from the element list.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use crate::errors::{Error, Result};

use super::component::{Element, NodeId};

/// Mapping from every node to the set of its neighbours.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologyGraph {
    adjacency: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

impl TopologyGraph {
    /// Adds one bidirectional edge per element.
    #[must_use]
    pub fn from_elements(elements: &[Element]) -> Self {
        let mut graph = Self::default();
        for element in elements {
            graph.add_edge(element.terminal_a(), element.terminal_b());
        }
        graph
    }

    fn add_edge(&mut self, a: &NodeId, b: &NodeId) {
        if a == b {
            return;
        }
        self.adjacency.entry(a.clone()).or_default().insert(b.clone());
        self.adjacency.entry(b.clone()).or_default().insert(a.clone());
    }

    /// Nodes in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.adjacency.keys()
    }

    /// Neighbours of `node` in ascending order (empty for unknown nodes).
    pub fn neighbors<'a>(&'a self, node: &NodeId) -> impl Iterator<Item = &'a NodeId> + 'a {
        self.adjacency.get(node).into_iter().flatten()
    }

    /// Number of distinct neighbours.
    #[must_use]
    pub fn degree(&self, node: &NodeId) -> usize {
        self.adjacency.get(node).map_or(0, BTreeSet::len)
    }

    /// True when `node` is part of the graph.
    #[must_use]
    pub fn contains(&self, node: &NodeId) -> bool {
        self.adjacency.contains_key(node)
    }

    /// True when `p` and `q` share an edge.
    #[must_use]
    pub fn adjacent(&self, p: &NodeId, q: &NodeId) -> bool {
        self.adjacency.get(p).is_some_and(|n| n.contains(q))
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of distinct undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Nodes with more than two neighbours, ascending.
    #[must_use]
    pub fn junctions(&self) -> Vec<NodeId> {
        self.adjacency
            .iter()
            .filter(|(_, n)| n.len() > 2)
            .map(|(node, _)| node.clone())
            .collect()
    }

    /// Checks that every node is reachable from `root`.
    ///
    /// # Errors
    /// [`Error::DisconnectedTopology`] naming the first unreachable node, or
    /// `root` itself when it is not in the graph.
    pub fn ensure_connected(&self, root: &NodeId) -> Result<()> {
        if !self.contains(root) {
            return Err(Error::DisconnectedTopology {
                node: root.clone(),
                reason: "root node is not part of the circuit".into(),
            });
        }
        let mut seen = BTreeSet::from([root]);
        let mut queue = VecDeque::from([root]);
        while let Some(node) = queue.pop_front() {
            for next in self.neighbors(node) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        match self.nodes().find(|node| !seen.contains(node)) {
            Some(node) => Err(Error::DisconnectedTopology {
                node: node.clone(),
                reason: format!("not reachable from node {root}"),
            }),
            None => Ok(()),
        }
    }

    /// Every simple path from `from` to `to` whose edges pass `edge_allowed`,
    /// in depth-first order over ascending neighbours.
    pub fn simple_paths<F>(&self, from: &NodeId, to: &NodeId, edge_allowed: F) -> Vec<Vec<NodeId>>
    where
        F: Fn(&NodeId, &NodeId) -> bool,
    {
        let mut paths = Vec::new();
        let mut path = vec![from.clone()];
        let mut visited = BTreeSet::from([from.clone()]);
        self.extend_paths(to, &edge_allowed, &mut path, &mut visited, &mut paths);
        paths
    }

    fn extend_paths<F>(
        &self,
        to: &NodeId,
        edge_allowed: &F,
        path: &mut Vec<NodeId>,
        visited: &mut BTreeSet<NodeId>,
        paths: &mut Vec<Vec<NodeId>>,
    ) where
        F: Fn(&NodeId, &NodeId) -> bool,
    {
        let Some(current) = path.last().cloned() else {
            return;
        };
        if &current == to {
            if path.len() > 1 {
                paths.push(path.clone());
            }
            return;
        }
        for next in self.neighbors(&current) {
            if visited.contains(next) || !edge_allowed(&current, next) {
                continue;
            }
            visited.insert(next.clone());
            path.push(next.clone());
            self.extend_paths(to, edge_allowed, path, visited, paths);
            path.pop();
            visited.remove(next);
        }
    }
}

impl fmt::Display for TopologyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (node, neighbors) in &self.adjacency {
            let list: Vec<String> = neighbors.iter().map(ToString::to_string).collect();
            writeln!(f, "{node}: {}", list.join(", "))?;
        }
        Ok(())
    }
}
