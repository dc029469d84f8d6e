//! Circuit topology analysis and state-space derivation.
//!
//! Element list -> [`TopologyGraph`] -> [`BranchSet`] -> [`VoltageMap`] ->
//! [`EquationSet`] -> [`StateSpaceModel`].

/// Numeric binding of derived equations.
pub mod binder;
/// Named current paths covering every element once.
pub mod branches;
/// Two-terminal element definitions and node identifiers.
pub mod component;
/// Kirchhoff-law derivation and symbol elimination.
pub mod equations;
/// Node adjacency and simple-path enumeration.
pub mod graph;
/// Immutable analysis context.
pub mod network;
/// Signed voltage labels per element.
pub mod polarity;
/// Normal spanning tree.
pub mod tree;

pub use binder::StateSpaceModel;
pub use branches::{Branch, BranchMember, BranchSet};
pub use component::{Element, ElementKind, NodeId};
pub use equations::{EquationEngine, EquationSet};
pub use graph::TopologyGraph;
pub use network::{CircuitTopology, EngineConfig};
pub use polarity::{Reference, VoltageEntry, VoltageMap};
pub use tree::NormalTree;
