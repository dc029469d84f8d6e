//! Normal spanning tree used to pick the path every KVL rewrite follows.
//!
//! Edges are admitted greedily by kind: lines, then voltage sources,
//! capacitors, resistors, inductors and finally current sources. The
//! unique tree path between two nodes therefore runs through
//! state-holding elements whenever possible.

use std::collections::{BTreeMap, BTreeSet};

use crate::errors::{Error, Result};

use super::component::{Element, ElementKind, NodeId};
use super::graph::TopologyGraph;

/// Disjoint-set forest over node indices.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        self.parent[rb] = ra;
        true
    }
}

/// Which elements are tree edges and which are links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalTree {
    in_tree: Vec<bool>,
}

impl NormalTree {
    /// Builds the tree with Kruskal's algorithm, ranking edges by
    /// [`ElementKind::tree_priority`] and then element order.
    ///
    /// # Errors
    /// [`Error::Topology`] when lines alone close a loop.
    pub fn build(elements: &[Element]) -> Result<Self> {
        let nodes: BTreeSet<&NodeId> = elements
            .iter()
            .flat_map(|e| [e.terminal_a(), e.terminal_b()])
            .collect();
        let index: BTreeMap<&NodeId, usize> = nodes.into_iter().zip(0..).collect();

        let mut order: Vec<usize> = (0..elements.len()).collect();
        order.sort_by_key(|&idx| (elements[idx].kind().tree_priority(), idx));

        let mut forest = UnionFind::new(index.len());
        let mut in_tree = vec![false; elements.len()];
        for idx in order {
            let element = &elements[idx];
            let (a, b) = (index[element.terminal_a()], index[element.terminal_b()]);
            if forest.union(a, b) {
                in_tree[idx] = true;
            } else if element.kind() == ElementKind::Line {
                return Err(Error::Topology(format!(
                    "line {} closes a loop made only of ideal lines",
                    element.name()
                )));
            }
        }
        log::debug!(
            "normal tree: {} tree edge(s), {} link(s)",
            in_tree.iter().filter(|t| **t).count(),
            in_tree.iter().filter(|t| !**t).count()
        );
        Ok(Self { in_tree })
    }

    /// True when `element` is a tree edge.
    #[must_use]
    pub fn is_tree_edge(&self, element: usize) -> bool {
        self.in_tree.get(element).copied().unwrap_or(false)
    }

    /// Elements that are not tree edges, ascending.
    pub fn links(&self) -> impl Iterator<Item = usize> + '_ {
        self.in_tree
            .iter()
            .enumerate()
            .filter(|(_, t)| !**t)
            .map(|(idx, _)| idx)
    }

    /// The unique path from `from` to `to` over tree edges.
    ///
    /// # Errors
    /// [`Error::Topology`] when no tree path exists.
    pub fn path(
        &self,
        graph: &TopologyGraph,
        elements: &[Element],
        from: &NodeId,
        to: &NodeId,
    ) -> Result<Vec<NodeId>> {
        if from == to {
            return Ok(vec![from.clone()]);
        }
        graph
            .simple_paths(from, to, |p, q| {
                elements
                    .iter()
                    .position(|e| e.connects(p, q))
                    .is_some_and(|idx| self.is_tree_edge(idx))
            })
            .into_iter()
            .next()
            .ok_or_else(|| Error::Topology(format!("no tree path from {from} to {to}")))
    }

    /// Nodes on the `terminal_a` side when tree edge `element` is removed.
    #[must_use]
    pub fn cut_side(&self, graph: &TopologyGraph, elements: &[Element], element: usize) -> BTreeSet<NodeId> {
        let start = elements[element].terminal_a().clone();
        let mut side = BTreeSet::from([start.clone()]);
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            for next in graph.neighbors(&node) {
                if side.contains(next) {
                    continue;
                }
                let crosses_tree = elements
                    .iter()
                    .position(|e| e.connects(&node, next))
                    .is_some_and(|idx| idx != element && self.is_tree_edge(idx));
                if crosses_tree {
                    side.insert(next.clone());
                    stack.push(next.clone());
                }
            }
        }
        side
    }
}
