//! Reduction of the node graph to named current paths.
//!
//! With no junctions the circuit is a single loop found by walking from the
//! root. Otherwise every maximal chain of two-neighbour nodes between
//! junctions becomes one branch, so each element belongs to exactly one
//! branch.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::errors::{Error, Result};
use crate::symbolic::Symbol;

use super::component::{Element, NodeId};
use super::graph::TopologyGraph;

/// One element on a branch and whether the traversal runs `a -> b` through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchMember {
    /// Index into the circuit's element list.
    pub element: usize,
    /// True when the branch traverses the element from `terminal_a` to `terminal_b`.
    pub forward: bool,
}

impl BranchMember {
    /// `+1` for forward traversal, `-1` otherwise.
    #[must_use]
    pub const fn sigma(&self) -> f64 {
        if self.forward {
            1.0
        } else {
            -1.0
        }
    }
}

/// A named, ordered node sequence carrying one current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    name: String,
    defining: usize,
    nodes: Vec<NodeId>,
    members: Vec<BranchMember>,
}

impl Branch {
    /// Name of the defining element (and therefore of the branch).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element index of the defining element.
    #[must_use]
    pub const fn defining(&self) -> usize {
        self.defining
    }

    /// Nodes in traversal order.
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Elements in traversal order; `members()[k]` joins `nodes()[k]` and `nodes()[k + 1]`.
    #[must_use]
    pub fn members(&self) -> &[BranchMember] {
        &self.members
    }

    /// `I_<name>`, the current flowing along the traversal direction.
    #[must_use]
    pub fn current_symbol(&self) -> Symbol {
        Symbol::current(&self.name)
    }

    /// Traversal sign of `element` on this branch.
    #[must_use]
    pub fn sigma(&self, element: usize) -> Option<f64> {
        self.members
            .iter()
            .find(|m| m.element == element)
            .map(BranchMember::sigma)
    }

    /// The same branch traversed in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            name: self.name.clone(),
            defining: self.defining,
            nodes: self.nodes.iter().rev().cloned().collect(),
            members: self
                .members
                .iter()
                .rev()
                .map(|m| BranchMember {
                    element: m.element,
                    forward: !m.forward,
                })
                .collect(),
        }
    }

    /// Builds a branch over `nodes`, named after its highest-ranked element
    /// and oriented along that element. Returns `Ok(None)` for a chain made
    /// only of lines.
    fn from_nodes(nodes: Vec<NodeId>, elements: &[Element]) -> Result<Option<Self>> {
        let mut members = Vec::with_capacity(nodes.len().saturating_sub(1));
        for pair in nodes.windows(2) {
            let element = elements
                .iter()
                .position(|e| e.connects(&pair[0], &pair[1]))
                .ok_or_else(|| {
                    Error::Topology(format!("no element joins nodes {} and {}", pair[0], pair[1]))
                })?;
            members.push(BranchMember {
                element,
                forward: elements[element].terminal_a() == &pair[0],
            });
        }

        let mut best: Option<(u8, usize)> = None;
        for (pos, member) in members.iter().enumerate() {
            if let Some(rank) = elements[member.element].kind().naming_rank() {
                if best.map_or(true, |(r, _)| rank > r) {
                    best = Some((rank, pos));
                }
            }
        }
        let Some((_, pos)) = best else {
            return Ok(None);
        };

        let defining = members[pos].element;
        let branch = Self {
            name: elements[defining].name().to_owned(),
            defining,
            nodes,
            members,
        };
        Ok(Some(if branch.members[pos].forward {
            branch
        } else {
            branch.reversed()
        }))
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes: Vec<String> = self.nodes.iter().map(ToString::to_string).collect();
        write!(f, "{}: {}", self.name, nodes.join(" -> "))
    }
}

/// All branches of a circuit plus an element-to-branch index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchSet {
    branches: Vec<Branch>,
    by_element: BTreeMap<usize, usize>,
    single_loop: bool,
}

impl BranchSet {
    /// Enumerates branches of `graph`, walking from `root` when the graph has
    /// no junctions. A `root` that is not in the graph is replaced by the
    /// smallest node.
    ///
    /// # Errors
    /// [`Error::DisconnectedTopology`] when a node is unreachable or an
    /// element end is left dangling; [`Error::Topology`] for a single loop
    /// made only of lines.
    pub fn enumerate(graph: &TopologyGraph, elements: &[Element], root: &NodeId) -> Result<Self> {
        let root = if graph.contains(root) {
            root
        } else {
            let fallback = graph
                .nodes()
                .next()
                .ok_or_else(|| Error::Topology("circuit has no nodes".into()))?;
            log::debug!("ground {root} is not in the circuit, walking from {fallback}");
            fallback
        };
        graph.ensure_connected(root)?;
        if let Some(node) = graph.nodes().find(|n| graph.degree(n) < 2) {
            return Err(Error::DisconnectedTopology {
                node: node.clone(),
                reason: "element end is not connected to anything else".into(),
            });
        }

        let junctions: BTreeSet<NodeId> = graph.junctions().into_iter().collect();
        let single_loop = junctions.is_empty();
        let chains = if single_loop {
            vec![single_path(graph, root)?]
        } else {
            junction_chains(graph, &junctions)?
        };

        let mut branches = Vec::new();
        for chain in chains {
            if let Some(branch) = Branch::from_nodes(chain, elements)? {
                branches.push(branch);
            } else if single_loop {
                return Err(Error::Topology("the only loop is made of ideal lines".into()));
            }
        }

        let mut by_element = BTreeMap::new();
        for (idx, branch) in branches.iter().enumerate() {
            for member in &branch.members {
                by_element.insert(member.element, idx);
            }
        }
        log::debug!(
            "enumerated {} branch(es) over {} junction(s): {}",
            branches.len(),
            junctions.len(),
            branches.iter().map(Branch::name).collect::<Vec<_>>().join(", ")
        );
        Ok(Self {
            branches,
            by_element,
            single_loop,
        })
    }

    /// Branches in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &Branch> {
        self.branches.iter()
    }

    /// Number of branches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    /// True when there are no branches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// True when the circuit is one loop with no junctions.
    #[must_use]
    pub const fn is_single_loop(&self) -> bool {
        self.single_loop
    }

    /// Branch carrying `element`, if it lies on one.
    #[must_use]
    pub fn branch_of(&self, element: usize) -> Option<&Branch> {
        self.by_element.get(&element).map(|&idx| &self.branches[idx])
    }

    /// Branch named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Branch> {
        self.branches.iter().find(|b| b.name == name)
    }
}

impl fmt::Display for BranchSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for branch in &self.branches {
            writeln!(f, "{branch}")?;
        }
        Ok(())
    }
}

/// Walks the single loop from `root`, always stepping to the smallest
/// unvisited neighbour, and closes it back at `root`.
fn single_path(graph: &TopologyGraph, root: &NodeId) -> Result<Vec<NodeId>> {
    let mut path = vec![root.clone()];
    let mut visited = BTreeSet::from([root.clone()]);
    while let Some(current) = path.last() {
        match graph.neighbors(current).find(|n| !visited.contains(*n)) {
            Some(next) => {
                visited.insert(next.clone());
                path.push(next.clone());
            }
            None => break,
        }
    }
    let last = path.last().cloned().unwrap_or_else(|| root.clone());
    if visited.len() < graph.node_count() {
        return Err(Error::DisconnectedTopology {
            node: last,
            reason: "dead end before every node was visited".into(),
        });
    }
    if path.len() < 3 || !graph.adjacent(&last, root) {
        return Err(Error::DisconnectedTopology {
            node: last,
            reason: "path does not close back to the root".into(),
        });
    }
    path.push(root.clone());
    Ok(path)
}

/// Every maximal chain between junctions, each edge covered once.
fn junction_chains(graph: &TopologyGraph, junctions: &BTreeSet<NodeId>) -> Result<Vec<Vec<NodeId>>> {
    let key = |p: &NodeId, q: &NodeId| {
        if p <= q {
            (p.clone(), q.clone())
        } else {
            (q.clone(), p.clone())
        }
    };
    let mut covered = BTreeSet::new();
    let mut chains = Vec::new();
    for start in junctions {
        for first in graph.neighbors(start) {
            if covered.contains(&key(start, first)) {
                continue;
            }
            let mut chain = vec![start.clone(), first.clone()];
            let mut prev = start.clone();
            let mut current = first.clone();
            while !junctions.contains(&current) {
                let next = graph
                    .neighbors(&current)
                    .find(|n| **n != prev)
                    .cloned()
                    .ok_or_else(|| Error::DisconnectedTopology {
                        node: current.clone(),
                        reason: "chain ends without reaching a junction".into(),
                    })?;
                chain.push(next.clone());
                prev = std::mem::replace(&mut current, next);
            }
            for pair in chain.windows(2) {
                covered.insert(key(&pair[0], &pair[1]));
            }
            chains.push(chain);
        }
    }
    Ok(chains)
}
