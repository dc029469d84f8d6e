//! Shared error types used across submodules.

use thiserror::Error;

use crate::circuits::NodeId;
use crate::simulation::SimulationError;
use crate::symbolic::Symbol;

/// Convenience alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The graph has nodes unreachable from ground, or a dead-end chain.
    #[error("disconnected topology at node {node}: {reason}")]
    DisconnectedTopology {
        /// Node where the walk or reachability check failed.
        node: NodeId,
        /// Human-readable description of the failure.
        reason: String,
    },
    /// Structural problem the derivation cannot handle (parallel elements,
    /// loops made only of lines).
    #[error("unsupported topology: {0}")]
    Topology(String),
    /// A forbidden symbol could not be rewritten into allowed symbols.
    #[error("cannot eliminate {symbol}: {reason}")]
    UnresolvableExpression {
        /// Symbol left in the system.
        symbol: Symbol,
        /// Why no rewrite applies.
        reason: String,
    },
    /// An initial value for a state variable was not supplied.
    #[error("missing initial condition for {0}")]
    MissingInitialCondition(String),
    /// The element name does not start with a known kind prefix.
    #[error("unknown element kind for {0:?}")]
    UnknownElementKind(String),
    /// The element declaration is malformed.
    #[error("invalid element {name}: {reason}")]
    InvalidElement {
        /// Element name as declared.
        name: String,
        /// What is wrong with it.
        reason: String,
    },
    /// Wraps simulation-related errors.
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}
