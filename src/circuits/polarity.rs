//! Signed voltage labels for every element relative to branch traversal.

use std::collections::BTreeMap;
use std::fmt;

use crate::errors::{Error, Result};
use crate::symbolic::{Expr, Symbol};

use super::branches::Branch;
use super::component::{Element, ElementKind, NodeId};

/// How the labelled voltage relates to the node pair it is stored against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    /// The label is the drop from `pair[0]` to `pair[1]` (passive elements).
    Drop,
    /// The label is the rise from `pair[0]` to `pair[1]` (sources).
    Rise,
}

/// A signed label `±U_<element>` stored against a node pair in traversal order.
#[derive(Debug, Clone, PartialEq)]
pub struct VoltageEntry {
    element: usize,
    name: String,
    negative: bool,
    pair: [NodeId; 2],
    reference: Reference,
}

impl VoltageEntry {
    /// Index of the labelled element.
    #[must_use]
    pub const fn element(&self) -> usize {
        self.element
    }

    /// True for `-U_<element>`.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.negative
    }

    /// Node pair in branch traversal order.
    #[must_use]
    pub const fn pair(&self) -> &[NodeId; 2] {
        &self.pair
    }

    /// Whether the label reads as a drop or a rise along the pair.
    #[must_use]
    pub const fn reference(&self) -> Reference {
        self.reference
    }

    /// The label as an expression, `U_e` or `-U_e`.
    #[must_use]
    pub fn label(&self) -> Expr {
        let symbol = Expr::symbol(Symbol::voltage(&self.name));
        if self.negative {
            -symbol
        } else {
            symbol
        }
    }

    /// Voltage drop `V(from) - V(to)` across the element, if it joins those nodes.
    #[must_use]
    pub fn drop_between(&self, from: &NodeId, to: &NodeId) -> Option<Expr> {
        let along = if &self.pair[0] == from && &self.pair[1] == to {
            true
        } else if &self.pair[0] == to && &self.pair[1] == from {
            false
        } else {
            return None;
        };
        let positive = along == (self.reference == Reference::Drop);
        Some(if positive { self.label() } else { -self.label() })
    }
}

impl fmt::Display for VoltageEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.negative { "-" } else { "" };
        write!(f, "{sign}U_{} -> [{}, {}]", self.name, self.pair[0], self.pair[1])
    }
}

/// Voltage entries of every non-line element, keyed by element index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VoltageMap {
    entries: BTreeMap<usize, VoltageEntry>,
}

impl VoltageMap {
    /// Labels every non-line element found on `branches`.
    ///
    /// Passive elements read `+U` when traversed `a -> b`; sources use the
    /// reverse rule and a rise reference.
    ///
    /// # Errors
    /// [`Error::Topology`] when a non-line element lies on no branch.
    pub fn resolve<'a, I>(branches: I, elements: &[Element]) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Branch>,
    {
        let mut entries = BTreeMap::new();
        for branch in branches {
            for (member, pair) in branch.members().iter().zip(branch.nodes().windows(2)) {
                let element = &elements[member.element];
                if element.kind() == ElementKind::Line {
                    continue;
                }
                let source = element.kind().is_source();
                entries.entry(member.element).or_insert_with(|| VoltageEntry {
                    element: member.element,
                    name: element.name().to_owned(),
                    negative: member.forward == source,
                    pair: [pair[0].clone(), pair[1].clone()],
                    reference: if source { Reference::Rise } else { Reference::Drop },
                });
            }
        }
        if let Some(missing) = elements
            .iter()
            .enumerate()
            .find(|(idx, e)| e.kind() != ElementKind::Line && !entries.contains_key(idx))
        {
            return Err(Error::Topology(format!(
                "element {} lies on no branch",
                missing.1.name()
            )));
        }
        log::debug!("voltage map holds {} entries", entries.len());
        Ok(Self { entries })
    }

    /// Entry for `element`.
    #[must_use]
    pub fn get(&self, element: usize) -> Option<&VoltageEntry> {
        self.entries.get(&element)
    }

    /// Entries in element order.
    pub fn iter(&self) -> impl Iterator<Item = &VoltageEntry> {
        self.entries.values()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no element is labelled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Signed voltage sum `V(path[0]) - V(path[last])` composed segment by
    /// segment; lines contribute nothing.
    ///
    /// # Errors
    /// [`Error::Topology`] when a segment is not joined by any element.
    pub fn drop_along(&self, path: &[NodeId], elements: &[Element]) -> Result<Expr> {
        let mut terms = Vec::with_capacity(path.len());
        for pair in path.windows(2) {
            let (from, to) = (&pair[0], &pair[1]);
            let idx = elements
                .iter()
                .position(|e| e.connects(from, to))
                .ok_or_else(|| Error::Topology(format!("no element joins nodes {from} and {to}")))?;
            if elements[idx].kind() == ElementKind::Line {
                continue;
            }
            let term = self
                .get(idx)
                .and_then(|entry| entry.drop_between(from, to))
                .ok_or_else(|| {
                    Error::Topology(format!("element {} has no polarity", elements[idx].name()))
                })?;
            terms.push(term);
        }
        Ok(Expr::sum(terms))
    }
}

impl fmt::Display for VoltageMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in self.entries.values() {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}
