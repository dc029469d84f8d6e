use std::fmt;

use crate::errors::{Error, Result};
use crate::math::Scalar;
use crate::symbolic::Symbol;

/// Identifier of a circuit node.
///
/// Numeric indices order before named nodes, so every traversal of node sets
/// is deterministic. `Index(0)` is ground.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeId {
    /// Numbered node (`0` is ground).
    Index(u32),
    /// Named node.
    Name(String),
}

impl NodeId {
    /// The ground node `0`.
    #[must_use]
    pub const fn ground() -> Self {
        Self::Index(0)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::ground()
    }
}

impl From<u32> for NodeId {
    fn from(index: u32) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for NodeId {
    fn from(name: &str) -> Self {
        match name.parse::<u32>() {
            Ok(index) if name.bytes().all(|b| b.is_ascii_digit()) => Self::Index(index),
            _ => Self::Name(name.to_owned()),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

/// Kind of two-terminal element, encoded by the first letter of its name.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementKind {
    /// Ideal voltage source (`V`).
    VoltageSource,
    /// Resistor (`R`).
    Resistor,
    /// Inductor (`L`).
    Inductor,
    /// Capacitor (`C`).
    Capacitor,
    /// Ideal current source (`I`).
    CurrentSource,
    /// Ideal zero-impedance line (`X`).
    Line,
}

impl ElementKind {
    /// Decodes the kind from an element name prefix.
    ///
    /// # Errors
    /// [`Error::UnknownElementKind`] when the prefix is not one of `V R L C I X`.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.chars().next().map(|c| c.to_ascii_uppercase()) {
            Some('V') => Ok(Self::VoltageSource),
            Some('R') => Ok(Self::Resistor),
            Some('L') => Ok(Self::Inductor),
            Some('C') => Ok(Self::Capacitor),
            Some('I') => Ok(Self::CurrentSource),
            Some('X') => Ok(Self::Line),
            _ => Err(Error::UnknownElementKind(name.to_owned())),
        }
    }

    /// Priority used when choosing which element names a branch.
    /// Lines never name a branch.
    #[must_use]
    pub const fn naming_rank(self) -> Option<u8> {
        match self {
            Self::CurrentSource => Some(4),
            Self::Inductor => Some(3),
            Self::Capacitor => Some(2),
            Self::Resistor | Self::VoltageSource => Some(1),
            Self::Line => None,
        }
    }

    /// Preference when building the normal spanning tree (lower first).
    #[must_use]
    pub const fn tree_priority(self) -> u8 {
        match self {
            Self::Line => 0,
            Self::VoltageSource => 1,
            Self::Capacitor => 2,
            Self::Resistor => 3,
            Self::Inductor => 4,
            Self::CurrentSource => 5,
        }
    }

    /// True for independent sources.
    #[must_use]
    pub const fn is_source(self) -> bool {
        matches!(self, Self::VoltageSource | Self::CurrentSource)
    }

    /// True for inductors and capacitors.
    #[must_use]
    pub const fn is_reactive(self) -> bool {
        matches!(self, Self::Inductor | Self::Capacitor)
    }
}

/// A named two-terminal element `(name, terminal_a, terminal_b, parameter)`.
///
/// For sources `terminal_a` is the positive terminal; a current source pushes
/// its current from `terminal_a` through itself to `terminal_b`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: String,
    kind: ElementKind,
    terminal_a: NodeId,
    terminal_b: NodeId,
    parameter: Option<Scalar>,
}

impl Element {
    /// Creates an element, decoding its kind from the name prefix.
    ///
    /// # Errors
    /// [`Error::UnknownElementKind`] for an unrecognised prefix and
    /// [`Error::InvalidElement`] for a self-loop, a missing or non-finite
    /// parameter, or a zero resistance, inductance or capacitance.
    pub fn new(
        name: impl Into<String>,
        terminal_a: impl Into<NodeId>,
        terminal_b: impl Into<NodeId>,
        parameter: Option<Scalar>,
    ) -> Result<Self> {
        let name = name.into();
        let kind = ElementKind::from_name(&name)?;
        let terminal_a = terminal_a.into();
        let terminal_b = terminal_b.into();
        let invalid = |reason: &str| Error::InvalidElement {
            name: name.clone(),
            reason: reason.to_owned(),
        };
        if terminal_a == terminal_b {
            return Err(invalid("both terminals on the same node"));
        }
        let parameter = match (kind, parameter) {
            (ElementKind::Line, _) => None,
            (_, None) => return Err(invalid("missing parameter")),
            (_, Some(value)) if !value.is_finite() => return Err(invalid("non-finite parameter")),
            (ElementKind::Resistor | ElementKind::Inductor | ElementKind::Capacitor, Some(value))
                if value == 0.0 =>
            {
                return Err(invalid("zero-valued passive element"))
            }
            (_, Some(value)) => Some(value),
        };
        Ok(Self {
            name,
            kind,
            terminal_a,
            terminal_b,
            parameter,
        })
    }

    /// Resistor between two nodes.
    ///
    /// # Errors
    /// See [`Element::new`].
    pub fn resistor(
        name: impl Into<String>,
        a: impl Into<NodeId>,
        b: impl Into<NodeId>,
        ohms: Scalar,
    ) -> Result<Self> {
        Self::new(name, a, b, Some(ohms))
    }

    /// Inductor between two nodes.
    ///
    /// # Errors
    /// See [`Element::new`].
    pub fn inductor(
        name: impl Into<String>,
        a: impl Into<NodeId>,
        b: impl Into<NodeId>,
        henries: Scalar,
    ) -> Result<Self> {
        Self::new(name, a, b, Some(henries))
    }

    /// Capacitor between two nodes.
    ///
    /// # Errors
    /// See [`Element::new`].
    pub fn capacitor(
        name: impl Into<String>,
        a: impl Into<NodeId>,
        b: impl Into<NodeId>,
        farads: Scalar,
    ) -> Result<Self> {
        Self::new(name, a, b, Some(farads))
    }

    /// Voltage source with `positive` as its `+` terminal.
    ///
    /// # Errors
    /// See [`Element::new`].
    pub fn voltage_source(
        name: impl Into<String>,
        positive: impl Into<NodeId>,
        negative: impl Into<NodeId>,
        volts: Scalar,
    ) -> Result<Self> {
        Self::new(name, positive, negative, Some(volts))
    }

    /// Current source driving `amperes` from `from` through itself to `to`.
    ///
    /// # Errors
    /// See [`Element::new`].
    pub fn current_source(
        name: impl Into<String>,
        from: impl Into<NodeId>,
        to: impl Into<NodeId>,
        amperes: Scalar,
    ) -> Result<Self> {
        Self::new(name, from, to, Some(amperes))
    }

    /// Ideal line joining two nodes.
    ///
    /// # Errors
    /// See [`Element::new`].
    pub fn line(name: impl Into<String>, a: impl Into<NodeId>, b: impl Into<NodeId>) -> Result<Self> {
        Self::new(name, a, b, None)
    }

    /// Element name (e.g. `R1`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element kind.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        self.kind
    }

    /// First terminal (positive terminal for sources).
    #[must_use]
    pub const fn terminal_a(&self) -> &NodeId {
        &self.terminal_a
    }

    /// Second terminal.
    #[must_use]
    pub const fn terminal_b(&self) -> &NodeId {
        &self.terminal_b
    }

    /// Scalar parameter, `None` for lines.
    #[must_use]
    pub const fn parameter(&self) -> Option<Scalar> {
        self.parameter
    }

    /// True when the element joins `p` and `q` in either order.
    #[must_use]
    pub fn connects(&self, p: &NodeId, q: &NodeId) -> bool {
        (&self.terminal_a == p && &self.terminal_b == q)
            || (&self.terminal_a == q && &self.terminal_b == p)
    }

    /// `U_<name>`.
    #[must_use]
    pub fn voltage_symbol(&self) -> Symbol {
        Symbol::voltage(&self.name)
    }

    /// `I_<name>`.
    #[must_use]
    pub fn current_symbol(&self) -> Symbol {
        Symbol::current(&self.name)
    }

    /// The parameter symbol `<name>`.
    #[must_use]
    pub fn parameter_symbol(&self) -> Symbol {
        Symbol::parameter(&self.name)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} -> {})", self.name, self.terminal_a, self.terminal_b)?;
        if let Some(value) = self.parameter {
            write!(f, " = {value}")?;
        }
        Ok(())
    }
}
