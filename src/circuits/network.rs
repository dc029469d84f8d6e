use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use crate::errors::{Error, Result};
use crate::symbolic::Symbol;

use super::branches::{Branch, BranchSet};
use super::component::{Element, ElementKind, NodeId};
use super::equations::{EquationEngine, EquationSet};
use super::graph::TopologyGraph;
use super::polarity::VoltageMap;
use super::tree::NormalTree;

/// Tuning knobs for the derivation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Upper bound on substitution rounds per eliminated symbol.
    pub max_iterations: usize,
    /// Root of the single-loop walk. When the circuit has no such node the
    /// walk starts from the smallest node instead.
    pub ground: NodeId,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: 64,
            ground: NodeId::ground(),
        }
    }
}

/// Immutable analysis context: the element list together with everything
/// derived from it once (graph, branches, voltage map, normal tree).
#[derive(Debug, Clone)]
pub struct CircuitTopology {
    elements: Vec<Element>,
    by_name: BTreeMap<String, usize>,
    graph: TopologyGraph,
    branches: BranchSet,
    voltages: VoltageMap,
    tree: NormalTree,
    config: EngineConfig,
}

impl CircuitTopology {
    /// Analyses `elements` with the default [`EngineConfig`].
    ///
    /// # Errors
    /// See [`CircuitTopology::with_config`].
    pub fn new(elements: Vec<Element>) -> Result<Self> {
        Self::with_config(elements, EngineConfig::default())
    }

    /// Analyses `elements`.
    ///
    /// # Errors
    /// [`Error::InvalidElement`] for duplicate names, [`Error::Topology`] for
    /// elements sharing a node pair or loops of lines, and
    /// [`Error::DisconnectedTopology`] when the graph is not one connected
    /// set of closed paths.
    pub fn with_config(elements: Vec<Element>, config: EngineConfig) -> Result<Self> {
        let mut by_name = BTreeMap::new();
        for (idx, element) in elements.iter().enumerate() {
            if by_name.insert(element.name().to_owned(), idx).is_some() {
                return Err(Error::InvalidElement {
                    name: element.name().to_owned(),
                    reason: "duplicate element name".into(),
                });
            }
        }
        for (idx, element) in elements.iter().enumerate() {
            if let Some(other) = elements[idx + 1..]
                .iter()
                .find(|e| e.connects(element.terminal_a(), element.terminal_b()))
            {
                return Err(Error::Topology(format!(
                    "{} and {} are both connected between nodes {} and {}",
                    element.name(),
                    other.name(),
                    element.terminal_a(),
                    element.terminal_b()
                )));
            }
        }

        let graph = TopologyGraph::from_elements(&elements);
        let branches = BranchSet::enumerate(&graph, &elements, &config.ground)?;
        let voltages = VoltageMap::resolve(branches.iter(), &elements)?;
        let tree = NormalTree::build(&elements)?;
        let topology = Self {
            elements,
            by_name,
            graph,
            branches,
            voltages,
            tree,
            config,
        };
        log::debug!("{}", topology.summary());
        Ok(topology)
    }

    /// Elements in declaration order.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Index of the element called `name`.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Element called `name`.
    #[must_use]
    pub fn element(&self, name: &str) -> Option<&Element> {
        self.index_of(name).map(|idx| &self.elements[idx])
    }

    /// Node adjacency.
    #[must_use]
    pub const fn graph(&self) -> &TopologyGraph {
        &self.graph
    }

    /// Enumerated branches.
    #[must_use]
    pub const fn branches(&self) -> &BranchSet {
        &self.branches
    }

    /// Voltage labels.
    #[must_use]
    pub const fn voltages(&self) -> &VoltageMap {
        &self.voltages
    }

    /// Normal spanning tree.
    #[must_use]
    pub const fn tree(&self) -> &NormalTree {
        &self.tree
    }

    /// Engine settings.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Branch carrying element `idx`.
    ///
    /// # Errors
    /// [`Error::Topology`] if the element lies on no branch.
    pub fn branch_of(&self, idx: usize) -> Result<&Branch> {
        self.branches.branch_of(idx).ok_or_else(|| {
            Error::Topology(format!("element {} lies on no branch", self.elements[idx].name()))
        })
    }

    fn indices_of(&self, kind: ElementKind) -> impl Iterator<Item = usize> + '_ {
        self.elements
            .iter()
            .enumerate()
            .filter(move |(_, e)| e.kind() == kind)
            .map(|(idx, _)| idx)
    }

    /// Inductor indices in declaration order.
    pub fn inductors(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices_of(ElementKind::Inductor)
    }

    /// Capacitor indices in declaration order.
    pub fn capacitors(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices_of(ElementKind::Capacitor)
    }

    /// State variables: inductor currents, then capacitor voltages.
    #[must_use]
    pub fn state_symbols(&self) -> Vec<Symbol> {
        self.inductors()
            .map(|idx| self.elements[idx].current_symbol())
            .chain(self.capacitors().map(|idx| self.elements[idx].voltage_symbol()))
            .collect()
    }

    /// True when `symbol` may appear in a final expression: parameters,
    /// capacitor and voltage-source voltages, and the currents of branches
    /// defined by an inductor or current source.
    #[must_use]
    pub fn is_allowed(&self, symbol: &Symbol) -> bool {
        let Some(element) = self.element(symbol.element()) else {
            return false;
        };
        match symbol {
            Symbol::Parameter(_) => true,
            Symbol::Voltage(_) => matches!(
                element.kind(),
                ElementKind::Capacitor | ElementKind::VoltageSource
            ),
            Symbol::Current(_) => matches!(
                element.kind(),
                ElementKind::Inductor | ElementKind::CurrentSource
            ),
        }
    }

    fn circuit_symbols(&self) -> BTreeSet<Symbol> {
        let mut symbols = BTreeSet::new();
        for element in &self.elements {
            if element.kind() != ElementKind::Line {
                symbols.insert(element.voltage_symbol());
                symbols.insert(element.parameter_symbol());
            }
        }
        for branch in self.branches.iter() {
            symbols.insert(branch.current_symbol());
        }
        symbols
    }

    /// Every symbol that can appear in a final expression.
    #[must_use]
    pub fn allowed_symbols(&self) -> BTreeSet<Symbol> {
        self.circuit_symbols()
            .into_iter()
            .filter(|s| self.is_allowed(s))
            .collect()
    }

    /// Every circuit symbol that must be eliminated.
    #[must_use]
    pub fn forbidden_symbols(&self) -> BTreeSet<Symbol> {
        self.circuit_symbols()
            .into_iter()
            .filter(|s| !self.is_allowed(s))
            .collect()
    }

    /// Derives capacitor currents and inductor voltages over allowed symbols.
    ///
    /// # Errors
    /// [`Error::UnresolvableExpression`] when a forbidden symbol cannot be
    /// eliminated.
    pub fn derive(&self) -> Result<EquationSet> {
        EquationEngine::new(self).derive()
    }

    /// Multi-line description of elements, connections, branches and voltages.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "elements:");
        for element in &self.elements {
            let _ = writeln!(out, "  {element}");
        }
        let _ = writeln!(out, "connections:");
        for line in self.graph.to_string().lines() {
            let _ = writeln!(out, "  {line}");
        }
        let _ = writeln!(out, "branches:");
        for line in self.branches.to_string().lines() {
            let _ = writeln!(out, "  {line}");
        }
        let _ = writeln!(out, "voltages:");
        for line in self.voltages.to_string().lines() {
            let _ = writeln!(out, "  {line}");
        }
        out
    }
}
