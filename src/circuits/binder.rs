//! Numeric binding of derived equations into an ODE right-hand side.

use std::collections::BTreeMap;
use std::fmt;

use crate::errors::Result;
use crate::math::{Scalar, StateVector};
use crate::simulation::SimulationError;
use crate::symbolic::{CompiledExpr, Expr, Symbol};

use super::component::ElementKind;
use super::equations::EquationSet;
use super::network::CircuitTopology;

/// `d(state)/dt = f(state)` with every element parameter bound.
///
/// States are ordered inductor currents first, then capacitor voltages, each
/// in element declaration order.
pub struct StateSpaceModel {
    states: Vec<Symbol>,
    derivatives: Vec<Expr>,
    compiled: Vec<CompiledExpr>,
}

impl StateSpaceModel {
    /// Derives and binds `topology` in one go.
    ///
    /// # Errors
    /// Any derivation error, or [`SimulationError::MissingParameter`] when a
    /// symbol is left unbound.
    pub fn from_topology(topology: &CircuitTopology) -> Result<Self> {
        let equations = topology.derive()?;
        Self::bind(topology, &equations)
    }

    /// Substitutes parameters and source levels into `equations` and
    /// compiles one closure per state.
    ///
    /// # Errors
    /// [`SimulationError::MissingParameter`] when an expression still
    /// references a symbol that is neither a parameter nor a state.
    pub fn bind(topology: &CircuitTopology, equations: &EquationSet) -> Result<Self> {
        let mut table = BTreeMap::new();
        for element in topology.elements() {
            let Some(value) = element.parameter() else {
                continue;
            };
            table.insert(element.parameter_symbol(), Expr::Const(value));
            match element.kind() {
                ElementKind::VoltageSource => {
                    table.insert(element.voltage_symbol(), Expr::Const(value));
                }
                ElementKind::CurrentSource => {
                    table.insert(element.current_symbol(), Expr::Const(value));
                }
                _ => {}
            }
        }

        let states = topology.state_symbols();
        let slots: BTreeMap<Symbol, usize> = states.iter().cloned().zip(0..).collect();
        let mut derivatives = Vec::with_capacity(states.len());
        let mut compiled = Vec::with_capacity(states.len());
        for state in &states {
            let symbolic = match state {
                Symbol::Current(name) => {
                    let voltage = lookup(&equations.voltage_expressions, &Symbol::voltage(name))?;
                    voltage.clone() / Expr::symbol(Symbol::parameter(name))
                }
                _ => {
                    let name = state.element();
                    let current = lookup(&equations.current_expressions, &Symbol::current(name))?;
                    current.clone() / Expr::symbol(Symbol::parameter(name))
                }
            };
            let bound = symbolic.substitute_all(&table).simplify();
            let closure = bound.compile(&slots).map_err(|symbol| {
                SimulationError::MissingParameter(format!("{symbol} in d{state}/dt"))
            })?;
            log::debug!("d{state}/dt = {bound}");
            derivatives.push(bound);
            compiled.push(closure);
        }
        Ok(Self {
            states,
            derivatives,
            compiled,
        })
    }

    /// Number of state variables.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.states.len()
    }

    /// State symbols in slot order.
    #[must_use]
    pub fn state_symbols(&self) -> &[Symbol] {
        &self.states
    }

    /// State names (`I_L1`, `U_C1`, ...) in slot order, for labelling output.
    #[must_use]
    pub fn state_names(&self) -> Vec<String> {
        self.states.iter().map(ToString::to_string).collect()
    }

    /// Bound derivative expressions in slot order.
    #[must_use]
    pub fn derivatives(&self) -> &[Expr] {
        &self.derivatives
    }

    /// Printable `d<state>/dt = <expr>` lines.
    #[must_use]
    pub fn equations(&self) -> Vec<String> {
        self.states
            .iter()
            .zip(&self.derivatives)
            .map(|(state, expr)| format!("d{state}/dt = {expr}"))
            .collect()
    }

    /// Writes the derivative at `state` into `out`. The system is autonomous,
    /// so `_t` is accepted only for integrator signatures.
    ///
    /// # Panics
    /// If `state` or `out` is shorter than [`StateSpaceModel::dimension`].
    pub fn rhs_into(&self, _t: Scalar, state: &[Scalar], out: &mut [Scalar]) {
        assert!(
            state.len() >= self.dimension() && out.len() >= self.dimension(),
            "model has {} states, got state of {} and output of {}",
            self.dimension(),
            state.len(),
            out.len()
        );
        for (slot, f) in out.iter_mut().zip(&self.compiled) {
            *slot = f(state);
        }
    }

    /// Derivative vector at `state`.
    ///
    /// # Panics
    /// If `state` is shorter than [`StateSpaceModel::dimension`].
    #[must_use]
    pub fn rhs(&self, t: Scalar, state: &StateVector) -> StateVector {
        let mut out = StateVector::zeros(self.dimension());
        self.rhs_into(t, state.as_slice(), out.as_mut_slice());
        out
    }
}

fn lookup<'e>(map: &'e BTreeMap<Symbol, Expr>, key: &Symbol) -> Result<&'e Expr> {
    map.get(key)
        .ok_or_else(|| SimulationError::MissingParameter(format!("no expression for {key}")).into())
}

impl fmt::Debug for StateSpaceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSpaceModel")
            .field("states", &self.states)
            .field("derivatives", &self.derivatives)
            .finish()
    }
}

impl fmt::Display for StateSpaceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.equations() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
