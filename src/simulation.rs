//! Transient integration of bound state-space models.

use std::collections::BTreeMap;
use std::io;
use std::io::Write;
use std::time::Duration;

use crate::circuits::StateSpaceModel;
use crate::errors::{Error, Result};
use crate::math::{all_finite, scaled_error_norm, Scalar, StateVector};

/// Time-stepping scheme.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Integrator {
    /// Classic fixed-step fourth-order Runge-Kutta.
    #[default]
    Rk4,
    /// Adaptive Dormand-Prince 5(4) with embedded error estimate.
    DormandPrince54,
}

/// Metadata describing a transient run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Human-readable identifier.
    pub name: String,
    /// Integration interval `[0, duration]`.
    pub duration: Duration,
    /// Fixed step for RK4, initial step for adaptive schemes.
    pub time_step: Duration,
    /// Scheme used to advance the state.
    pub integrator: Integrator,
    /// Absolute error tolerance (adaptive only).
    pub abs_tol: Scalar,
    /// Relative error tolerance (adaptive only).
    pub rel_tol: Scalar,
}

impl SimulationConfig {
    /// Fixed-step RK4 configuration.
    #[must_use]
    pub fn fixed(name: impl Into<String>, duration: Duration, time_step: Duration) -> Self {
        Self {
            name: name.into(),
            duration,
            time_step,
            integrator: Integrator::Rk4,
            abs_tol: 1e-8,
            rel_tol: 1e-4,
        }
    }

    /// Adaptive Dormand-Prince configuration starting from `initial_step`.
    #[must_use]
    pub fn adaptive(
        name: impl Into<String>,
        duration: Duration,
        initial_step: Duration,
        abs_tol: Scalar,
        rel_tol: Scalar,
    ) -> Self {
        Self {
            name: name.into(),
            duration,
            time_step: initial_step,
            integrator: Integrator::DormandPrince54,
            abs_tol,
            rel_tol,
        }
    }

    /// Checks step, duration and tolerances.
    ///
    /// # Errors
    /// [`SimulationError::InvalidConfig`] for a zero step or non-positive tolerances.
    pub fn validate(&self) -> std::result::Result<(), SimulationError> {
        if self.time_step.is_zero() {
            return Err(SimulationError::InvalidConfig("time_step must be > 0".into()));
        }
        if self.integrator == Integrator::DormandPrince54
            && !(self.abs_tol > 0.0 && self.rel_tol >= 0.0)
        {
            return Err(SimulationError::InvalidConfig(
                "abs_tol must be > 0 and rel_tol >= 0".into(),
            ));
        }
        Ok(())
    }
}

/// Trait for simulation engines.
pub trait SimulationEngine {
    /// Executes the simulation using the provided configuration.
    fn run(&mut self, config: &SimulationConfig) -> std::result::Result<(), SimulationError>;
}

/// Errors that can occur while configuring or executing simulations.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// Raised when a required parameter or binding is missing.
    #[error("missing parameter: {0}")]
    MissingParameter(String),
    /// Raised when the configuration is internally inconsistent.
    #[error("configuration error: {0}")]
    InvalidConfig(String),
    /// Raised when the state or its derivative stops being finite.
    #[error("non-finite state at t = {time}")]
    NonFinite {
        /// Simulation time of the failure.
        time: Scalar,
    },
    /// Raised when the adaptive step collapses below resolvable size.
    #[error("step size underflow at t = {time}")]
    StepSizeUnderflow {
        /// Simulation time of the failure.
        time: Scalar,
    },
}

/// Initial values keyed by state name (`I_L1`) or element name (`L1`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitialConditions {
    values: BTreeMap<String, Scalar>,
}

impl InitialConditions {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: Scalar) -> Self {
        self.set(name, value);
        self
    }

    /// Sets one value.
    pub fn set(&mut self, name: impl Into<String>, value: Scalar) {
        self.values.insert(name.into(), value);
    }

    /// Orders the values into a state vector for `model`.
    ///
    /// # Errors
    /// [`Error::MissingInitialCondition`] for the first state with no value.
    pub fn resolve(&self, model: &StateSpaceModel) -> Result<StateVector> {
        let mut used = Vec::new();
        let mut state = StateVector::zeros(model.dimension());
        for (slot, symbol) in model.state_symbols().iter().enumerate() {
            let full = symbol.to_string();
            let key = [full.as_str(), symbol.element()]
                .into_iter()
                .find(|key| self.values.contains_key(*key))
                .ok_or_else(|| Error::MissingInitialCondition(full.clone()))?;
            state[slot] = self.values[key];
            used.push(key.to_owned());
        }
        for name in self.values.keys() {
            if !used.contains(name) {
                log::warn!("initial condition {name} does not match any state variable");
            }
        }
        Ok(state)
    }
}

impl<S: Into<String>> FromIterator<(S, Scalar)> for InitialConditions {
    fn from_iter<T: IntoIterator<Item = (S, Scalar)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Sampled state trajectories.
#[derive(Debug, Clone, Default)]
pub struct TransientWaveform {
    /// State names, one per vector component.
    pub labels: Vec<String>,
    /// Sample times.
    pub times: Vec<Scalar>,
    /// State vector per sample.
    pub states: Vec<StateVector>,
}

impl TransientWaveform {
    /// Total captured samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// True if no samples recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Last recorded state.
    #[must_use]
    pub fn final_state(&self) -> Option<&StateVector> {
        self.states.last()
    }

    /// Samples of the state called `label`.
    #[must_use]
    pub fn series(&self, label: &str) -> Option<Vec<Scalar>> {
        let idx = self.labels.iter().position(|l| l == label)?;
        Some(self.states.iter().map(|s| s[idx]).collect())
    }

    fn push(&mut self, time: Scalar, state: StateVector) {
        self.times.push(time);
        self.states.push(state);
    }
}

/// Integrates one [`StateSpaceModel`] from a fixed initial state.
#[derive(Debug)]
pub struct TransientEngine<'m> {
    model: &'m StateSpaceModel,
    initial: StateVector,
    waveform: TransientWaveform,
}

impl<'m> TransientEngine<'m> {
    /// Creates an engine starting at `initial`.
    #[must_use]
    pub fn new(model: &'m StateSpaceModel, initial: StateVector) -> Self {
        Self {
            model,
            initial,
            waveform: TransientWaveform::default(),
        }
    }

    /// Returns a reference to the captured waveform (populated after `run`).
    #[must_use]
    pub const fn waveform(&self) -> &TransientWaveform {
        &self.waveform
    }

    /// Consumes and returns the waveform.
    #[must_use]
    pub fn into_waveform(self) -> TransientWaveform {
        self.waveform
    }

    fn derivative(&self, t: Scalar, x: &StateVector) -> std::result::Result<StateVector, SimulationError> {
        let dx = self.model.rhs(t, x);
        if all_finite(&dx) {
            Ok(dx)
        } else {
            Err(SimulationError::NonFinite { time: t })
        }
    }

    fn rk4_step(&self, t: Scalar, x: &StateVector, h: Scalar) -> std::result::Result<StateVector, SimulationError> {
        let k1 = self.derivative(t, x)?;
        let k2 = self.derivative(t + 0.5 * h, &(x + &k1 * (0.5 * h)))?;
        let k3 = self.derivative(t + 0.5 * h, &(x + &k2 * (0.5 * h)))?;
        let k4 = self.derivative(t + h, &(x + &k3 * h))?;
        Ok(x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0))
    }

    fn run_fixed(&mut self, end: Scalar, h: Scalar) -> std::result::Result<(), SimulationError> {
        let steps = (end / h - 1e-9).ceil().max(0.0) as usize;
        let mut x = self.initial.clone();
        for k in 0..steps {
            let t = k as Scalar * h;
            let step = h.min(end - t);
            x = self.rk4_step(t, &x, step)?;
            self.waveform.push(t + step, x.clone());
        }
        Ok(())
    }

    fn run_adaptive(
        &mut self,
        end: Scalar,
        initial_step: Scalar,
        abs_tol: Scalar,
        rel_tol: Scalar,
    ) -> std::result::Result<(), SimulationError> {
        const C: [Scalar; 7] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];
        #[rustfmt::skip]
        const A: [&[Scalar]; 6] = [
            &[1.0/5.0],
            &[3.0/40.0, 9.0/40.0],
            &[44.0/45.0, -56.0/15.0, 32.0/9.0],
            &[19372.0/6561.0, -25360.0/2187.0, 64448.0/6561.0, -212.0/729.0],
            &[9017.0/3168.0, -355.0/33.0, 46732.0/5247.0, 49.0/176.0, -5103.0/18656.0],
            &[35.0/384.0, 0.0, 500.0/1113.0, 125.0/192.0, -2187.0/6784.0, 11.0/84.0],
        ];
        const TR: [Scalar; 7] = [
            71.0 / 57600.0,
            0.0,
            -71.0 / 16695.0,
            71.0 / 1920.0,
            -17253.0 / 339200.0,
            22.0 / 525.0,
            -1.0 / 40.0,
        ];
        const BETA: Scalar = 0.9;

        let mut t = 0.0;
        let mut h = initial_step;
        let mut x = self.initial.clone();
        let mut rejected = 0usize;
        while t < end {
            h = h.min(end - t);
            if h <= end * Scalar::EPSILON {
                return Err(SimulationError::StepSizeUnderflow { time: t });
            }

            let mut k: Vec<StateVector> = Vec::with_capacity(7);
            k.push(self.derivative(t, &x)?);
            for (stage, row) in A.iter().enumerate() {
                let mut probe = x.clone();
                for (coef, slope) in row.iter().zip(&k) {
                    probe += slope * (coef * h);
                }
                k.push(self.derivative(t + C[stage + 1] * h, &probe)?);
            }
            // Stage 7 was evaluated at the fifth-order solution.
            let mut x5 = x.clone();
            for (coef, slope) in A[5].iter().zip(&k) {
                x5 += slope * (coef * h);
            }
            let mut error = StateVector::zeros(x.len());
            for (coef, slope) in TR.iter().zip(&k) {
                error += slope * (coef * h);
            }

            let error_norm = scaled_error_norm(&error, &x5, abs_tol, rel_tol).max(1e-16);
            let scale = (BETA / error_norm.powf(1.0 / 5.0)).clamp(0.1, 10.0);
            if error_norm <= 1.0 {
                t = if end - (t + h) <= end * Scalar::EPSILON {
                    end
                } else {
                    t + h
                };
                x = x5;
                self.waveform.push(t, x.clone());
            } else {
                rejected += 1;
            }
            h *= scale;
        }
        if rejected > 0 {
            log::debug!("adaptive run rejected {rejected} step(s)");
        }
        Ok(())
    }
}

impl SimulationEngine for TransientEngine<'_> {
    fn run(&mut self, config: &SimulationConfig) -> std::result::Result<(), SimulationError> {
        config.validate()?;
        if self.initial.len() != self.model.dimension() {
            return Err(SimulationError::InvalidConfig(format!(
                "initial state has {} entries, model has {}",
                self.initial.len(),
                self.model.dimension()
            )));
        }
        if !all_finite(&self.initial) {
            return Err(SimulationError::NonFinite { time: 0.0 });
        }
        self.derivative(0.0, &self.initial)?;

        let end = config.duration.as_secs_f64();
        let dt = config.time_step.as_secs_f64();
        self.waveform = TransientWaveform {
            labels: self.model.state_names(),
            ..TransientWaveform::default()
        };
        self.waveform.push(0.0, self.initial.clone());

        log::debug!(
            "running {} ({:?}) over [0, {end}] s, step {dt} s",
            config.name,
            config.integrator
        );
        match config.integrator {
            Integrator::Rk4 => self.run_fixed(end, dt),
            Integrator::DormandPrince54 => self.run_adaptive(end, dt, config.abs_tol, config.rel_tol),
        }
    }
}

/// Resolves `initial` against `model` and integrates it as configured.
///
/// # Errors
/// [`Error::MissingInitialCondition`] or a wrapped [`SimulationError`].
pub fn simulate(
    model: &StateSpaceModel,
    initial: &InitialConditions,
    config: &SimulationConfig,
) -> Result<TransientWaveform> {
    let state = initial.resolve(model)?;
    let mut engine = TransientEngine::new(model, state);
    engine.run(config)?;
    Ok(engine.into_waveform())
}

/// Writes a CSV with one column per state variable.
pub fn write_transient_state_csv<W: Write>(mut w: W, waveform: &TransientWaveform) -> io::Result<()> {
    writeln!(w, "time,{}", waveform.labels.join(","))?;
    for (time, state) in waveform.times.iter().zip(&waveform.states) {
        write!(w, "{time:.16e}")?;
        for value in state.iter() {
            write!(w, ",{value:.16e}")?;
        }
        writeln!(w)?;
    }
    Ok(())
}
