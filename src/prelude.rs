//! Convenience re-exports for deriving and simulating circuits.

pub use crate::circuits::{
    CircuitTopology, Element, ElementKind, EngineConfig, EquationSet, NodeId, StateSpaceModel,
};
pub use crate::errors::{Error, Result};
pub use crate::math::{Scalar, StateVector};
pub use crate::simulation::{
    simulate, write_transient_state_csv, InitialConditions, Integrator, SimulationConfig,
    SimulationEngine, SimulationError, TransientEngine, TransientWaveform,
};
pub use crate::symbolic::{Expr, Symbol};
