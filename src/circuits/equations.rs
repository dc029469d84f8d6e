//! Kirchhoff-law derivation with forbidden-symbol elimination.
//!
//! Every forbidden symbol has one rewrite rule:
//!
//! * a resistor on the normal tree obeys Ohm's law on its branch current;
//! * a link element's voltage is the drop along the tree path between its
//!   terminals (KVL);
//! * a tree inductor shares `dI/dt` with the link inductor of its branch;
//! * a branch current follows Ohm's law through the branch's link resistor,
//!   or KCL over the fundamental cut-set of its first tree edge when the
//!   branch has no link;
//! * in a single-loop circuit the loop current is the non-resistive drop
//!   divided by the total resistance.
//!
//! Rewrites are substituted until no forbidden symbol is left. A symbol that
//! reappears while it is being resolved is solved for linearly.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::errors::{Error, Result};
use crate::symbolic::{Expr, Symbol};

use super::branches::Branch;
use super::component::ElementKind;
use super::network::CircuitTopology;

fn unresolvable(symbol: &Symbol, reason: impl Into<String>) -> Error {
    Error::UnresolvableExpression {
        symbol: symbol.clone(),
        reason: reason.into(),
    }
}

/// True when a substitution round left at least as many forbidden symbols
/// pending as the round before it.
fn stalled(previous: Option<&BTreeSet<Symbol>>, pending: &BTreeSet<Symbol>) -> bool {
    previous.is_some_and(|prev| pending.len() >= prev.len())
}

/// Solves `symbol = expr` for `symbol` when `expr` mentions it linearly.
fn solve_for(symbol: &Symbol, expr: Expr) -> Result<Expr> {
    if !expr.contains(symbol) {
        return Ok(expr);
    }
    let (coefficient, rest) = expr
        .linear_split(symbol)
        .ok_or_else(|| unresolvable(symbol, "depends on itself non-linearly"))?;
    let denominator = (Expr::one() - coefficient).simplify();
    if denominator.is_zero() {
        return Err(unresolvable(symbol, "depends on itself with unit gain"));
    }
    let solved = (rest / denominator).simplify();
    log::trace!("{symbol} solved to {solved}");
    Ok(solved)
}

/// Derived Kirchhoff relations over allowed symbols only.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EquationSet {
    /// `I_<capacitor>` for every capacitor.
    pub current_expressions: BTreeMap<Symbol, Expr>,
    /// `U_<inductor>` for every inductor.
    pub voltage_expressions: BTreeMap<Symbol, Expr>,
}

impl EquationSet {
    /// True when the circuit has no reactive element.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current_expressions.is_empty() && self.voltage_expressions.is_empty()
    }
}

impl fmt::Display for EquationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (symbol, expr) in self
            .voltage_expressions
            .iter()
            .chain(&self.current_expressions)
        {
            writeln!(f, "{symbol} = {expr}")?;
        }
        Ok(())
    }
}

/// Resolves forbidden symbols against one [`CircuitTopology`].
#[derive(Debug)]
pub struct EquationEngine<'a> {
    topology: &'a CircuitTopology,
    memo: BTreeMap<Symbol, Expr>,
    in_progress: BTreeSet<Symbol>,
}

impl<'a> EquationEngine<'a> {
    /// Creates an engine with an empty cache.
    #[must_use]
    pub fn new(topology: &'a CircuitTopology) -> Self {
        Self {
            topology,
            memo: BTreeMap::new(),
            in_progress: BTreeSet::new(),
        }
    }

    /// Derives the current of every capacitor and the voltage of every inductor.
    ///
    /// # Errors
    /// [`Error::UnresolvableExpression`] if any of them cannot be written over
    /// allowed symbols.
    pub fn derive(mut self) -> Result<EquationSet> {
        let topology = self.topology;
        let elements = topology.elements();
        let mut set = EquationSet::default();

        for idx in topology.inductors() {
            let element = &elements[idx];
            let branch = topology.branch_of(idx)?;
            let symbol = element.voltage_symbol();
            if elements[branch.defining()].kind() == ElementKind::CurrentSource {
                return Err(unresolvable(
                    &symbol,
                    format!("inductor in series with current source {}", branch.name()),
                ));
            }
            let expr = self.resolve(&symbol)?;
            self.ensure_final(&symbol, &expr)?;
            log::debug!("{symbol} = {expr}");
            set.voltage_expressions.insert(symbol, expr);
        }

        for idx in topology.capacitors() {
            let element = &elements[idx];
            let branch = topology.branch_of(idx)?;
            let sigma = branch.sigma(idx).unwrap_or(1.0);
            let symbol = element.current_symbol();
            let expr = (Expr::Const(sigma) * self.resolve(&branch.current_symbol())?).simplify();
            self.ensure_final(&symbol, &expr)?;
            log::debug!("{symbol} = {expr}");
            set.current_expressions.insert(symbol, expr);
        }
        Ok(set)
    }

    fn ensure_final(&self, symbol: &Symbol, expr: &Expr) -> Result<()> {
        match expr.symbols().into_iter().find(|s| !self.topology.is_allowed(s)) {
            Some(left) => Err(unresolvable(symbol, format!("{left} could not be eliminated"))),
            None => Ok(()),
        }
    }

    /// Writes `symbol` over allowed symbols and over symbols that are still
    /// being resolved further up the call stack.
    ///
    /// # Errors
    /// [`Error::UnresolvableExpression`] when no rewrite rule applies, the
    /// symbol depends on itself non-linearly or degenerately, or the
    /// substitution loop stalls.
    pub fn resolve(&mut self, symbol: &Symbol) -> Result<Expr> {
        if self.topology.is_allowed(symbol) {
            return Ok(Expr::symbol(symbol.clone()));
        }
        if let Some(done) = self.memo.get(symbol) {
            return Ok(done.clone());
        }
        if self.in_progress.contains(symbol) {
            return Ok(Expr::symbol(symbol.clone()));
        }

        self.in_progress.insert(symbol.clone());
        let result = self.eliminate(symbol);
        self.in_progress.remove(symbol);
        let expr = result?;

        if expr.symbols().iter().all(|s| self.topology.is_allowed(s)) {
            self.memo.insert(symbol.clone(), expr.clone());
        }
        Ok(expr)
    }

    fn eliminate(&mut self, symbol: &Symbol) -> Result<Expr> {
        let mut expr = self.rewrite(symbol)?.simplify();
        log::trace!("{symbol} -> {expr}");

        let limit = self.topology.config().max_iterations;
        let mut previous: Option<BTreeSet<Symbol>> = None;
        let mut rounds = 0;
        loop {
            let pending: BTreeSet<Symbol> = expr
                .symbols()
                .into_iter()
                .filter(|s| !self.topology.is_allowed(s) && !self.in_progress.contains(s))
                .collect();
            if pending.is_empty() {
                break;
            }
            if stalled(previous.as_ref(), &pending) {
                return Err(unresolvable(symbol, "substitution made no progress"));
            }
            if rounds == limit {
                return Err(unresolvable(symbol, "iteration limit reached"));
            }
            rounds += 1;

            let mut table = BTreeMap::new();
            for s in &pending {
                table.insert(s.clone(), self.resolve(s)?);
            }
            expr = expr.substitute_all(&table).simplify();
            log::trace!("{symbol} -> {expr}");
            previous = Some(pending);
        }
        solve_for(symbol, expr)
    }

    /// One rewrite step for a forbidden symbol.
    fn rewrite(&self, symbol: &Symbol) -> Result<Expr> {
        let topology = self.topology;
        let idx = topology
            .index_of(symbol.element())
            .ok_or_else(|| unresolvable(symbol, "unknown element"))?;
        match symbol {
            Symbol::Voltage(_) => self.rewrite_voltage(symbol, idx),
            Symbol::Current(_) => {
                let branch = topology
                    .branches()
                    .get(symbol.element())
                    .ok_or_else(|| unresolvable(symbol, "not a branch current"))?;
                self.rewrite_current(symbol, branch)
            }
            Symbol::Parameter(_) => Ok(Expr::symbol(symbol.clone())),
        }
    }

    fn rewrite_voltage(&self, symbol: &Symbol, idx: usize) -> Result<Expr> {
        let topology = self.topology;
        let elements = topology.elements();
        let element = &elements[idx];
        let tree = topology.tree();

        if !tree.is_tree_edge(idx) {
            let path = tree.path(
                topology.graph(),
                elements,
                element.terminal_a(),
                element.terminal_b(),
            )?;
            return topology.voltages().drop_along(&path, elements);
        }

        let branch = topology.branch_of(idx)?;
        let sigma = branch.sigma(idx).unwrap_or(1.0);
        match element.kind() {
            ElementKind::Resistor => Ok(Expr::Const(sigma)
                * Expr::symbol(element.parameter_symbol())
                * Expr::symbol(branch.current_symbol())),
            ElementKind::Inductor => {
                let link = branch
                    .members()
                    .iter()
                    .find(|m| {
                        !tree.is_tree_edge(m.element)
                            && elements[m.element].kind() == ElementKind::Inductor
                    })
                    .ok_or_else(|| unresolvable(symbol, "inductor belongs to an inductive cut-set"))?;
                let other = &elements[link.element];
                Ok(Expr::Const(sigma * link.sigma())
                    * (Expr::symbol(element.parameter_symbol())
                        / Expr::symbol(other.parameter_symbol()))
                    * Expr::symbol(other.voltage_symbol()))
            }
            _ => Err(unresolvable(symbol, "no rule for this element on the tree")),
        }
    }

    fn rewrite_current(&self, symbol: &Symbol, branch: &Branch) -> Result<Expr> {
        let topology = self.topology;
        let elements = topology.elements();
        let tree = topology.tree();

        if topology.branches().is_single_loop() {
            return self.loop_current(symbol, branch);
        }

        if let Some(link) = branch.members().iter().find(|m| !tree.is_tree_edge(m.element)) {
            let element = &elements[link.element];
            return match element.kind() {
                ElementKind::Resistor => Ok(Expr::Const(link.sigma())
                    * Expr::symbol(element.voltage_symbol())
                    / Expr::symbol(element.parameter_symbol())),
                _ => Err(unresolvable(
                    symbol,
                    format!("loop closed by {} has no resistance", element.name()),
                )),
            };
        }

        let first = branch
            .members()
            .first()
            .ok_or_else(|| unresolvable(symbol, "empty branch"))?;
        let side = tree.cut_side(topology.graph(), elements, first.element);
        let mut leaving = Vec::new();
        for link in tree.links() {
            let element = &elements[link];
            let a_inside = side.contains(element.terminal_a());
            if a_inside == side.contains(element.terminal_b()) {
                continue;
            }
            let carrier = topology.branch_of(link)?;
            let sigma = carrier.sigma(link).unwrap_or(1.0);
            let direction = if a_inside { sigma } else { -sigma };
            leaving.push(Expr::Const(direction) * Expr::symbol(carrier.current_symbol()));
        }
        Ok(Expr::Const(-first.sigma()) * Expr::sum(leaving))
    }

    fn loop_current(&self, symbol: &Symbol, branch: &Branch) -> Result<Expr> {
        let elements = self.topology.elements();
        let voltages = self.topology.voltages();
        let mut resistance = Vec::new();
        let mut drops = Vec::new();
        for (member, pair) in branch.members().iter().zip(branch.nodes().windows(2)) {
            let element = &elements[member.element];
            match element.kind() {
                ElementKind::Line => {}
                ElementKind::Resistor => resistance.push(Expr::symbol(element.parameter_symbol())),
                _ => {
                    let drop = voltages
                        .get(member.element)
                        .and_then(|entry| entry.drop_between(&pair[0], &pair[1]))
                        .ok_or_else(|| unresolvable(symbol, "element without polarity"))?;
                    drops.push(drop);
                }
            }
        }
        if resistance.is_empty() {
            return Err(unresolvable(symbol, "loop has no resistance"));
        }
        Ok(-Expr::sum(drops) / Expr::sum(resistance))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::circuits::component::{Element, NodeId};
    use crate::circuits::network::EngineConfig;
    use crate::math::Scalar;

    fn lookup<'v>(values: &'v [(&'v str, Scalar)]) -> impl Fn(&Symbol) -> Option<Scalar> + 'v {
        move |s: &Symbol| {
            values
                .iter()
                .find(|(name, _)| *name == s.to_string())
                .map(|(_, v)| *v)
        }
    }

    fn series_rlc_elements() -> Vec<Element> {
        vec![
            Element::voltage_source("V1", 1, 0, 10.0).unwrap(),
            Element::resistor("R1", 1, 2, 5.0).unwrap(),
            Element::inductor("L1", 2, 3, 1e-3).unwrap(),
            Element::capacitor("C1", 3, 0, 1e-6).unwrap(),
        ]
    }

    fn series_rlc() -> CircuitTopology {
        CircuitTopology::new(series_rlc_elements()).unwrap()
    }

    fn with_iterations(elements: Vec<Element>, max_iterations: usize) -> CircuitTopology {
        let config = EngineConfig {
            max_iterations,
            ..EngineConfig::default()
        };
        CircuitTopology::with_config(elements, config).unwrap()
    }

    fn unresolved(result: Result<EquationSet>) -> (Symbol, String) {
        match result {
            Err(Error::UnresolvableExpression { symbol, reason }) => (symbol, reason),
            other => panic!("expected an unresolvable expression, got {other:?}"),
        }
    }

    #[test]
    fn series_rlc_reduces_to_canonical_form() {
        let set = series_rlc().derive().unwrap();
        let u_l = &set.voltage_expressions[&Symbol::voltage("L1")];
        let i_c = &set.current_expressions[&Symbol::current("C1")];
        let values = [("U_V1", 10.0), ("R1", 5.0), ("I_L1", 0.5), ("U_C1", 3.0)];
        assert_relative_eq!(u_l.evaluate(&lookup(&values)).unwrap(), 10.0 - 2.5 - 3.0);
        assert_relative_eq!(i_c.evaluate(&lookup(&values)).unwrap(), 0.5);
        assert_eq!(i_c.to_string(), "I_L1");
    }

    #[test]
    fn resistive_network_has_no_equations() {
        let topology = CircuitTopology::new(vec![
            Element::voltage_source("V1", 1, 0, 10.0).unwrap(),
            Element::resistor("R1", 1, 2, 1.0).unwrap(),
            Element::resistor("R2", 2, 0, 2.0).unwrap(),
            Element::resistor("R3", 2, 3, 3.0).unwrap(),
            Element::resistor("R4", 3, 0, 4.0).unwrap(),
        ])
        .unwrap();
        assert!(topology.derive().unwrap().is_empty());
    }

    #[test]
    fn rc_loop_uses_ohms_law_directly() {
        let topology = CircuitTopology::new(vec![
            Element::voltage_source("V1", 1, 0, 10.0).unwrap(),
            Element::resistor("R1", 1, 2, 2.0).unwrap(),
            Element::capacitor("C1", 2, 0, 1e-3).unwrap(),
        ])
        .unwrap();
        let set = topology.derive().unwrap();
        let i_c = &set.current_expressions[&Symbol::current("C1")];
        let values = [("U_V1", 10.0), ("R1", 2.0), ("U_C1", 4.0)];
        assert_relative_eq!(i_c.evaluate(&lookup(&values)).unwrap(), 3.0);
    }

    #[test]
    fn resistive_cycle_is_solved_linearly() {
        // Thevenin source V1·R2/(R1+R2) behind R1||R2 feeding C1 through R3.
        let topology = CircuitTopology::new(vec![
            Element::voltage_source("V1", 1, 0, 12.0).unwrap(),
            Element::resistor("R1", 1, 2, 4.0).unwrap(),
            Element::resistor("R2", 2, 0, 12.0).unwrap(),
            Element::resistor("R3", 2, 3, 6.0).unwrap(),
            Element::capacitor("C1", 3, 0, 1e-3).unwrap(),
        ])
        .unwrap();
        let set = topology.derive().unwrap();
        let i_c = &set.current_expressions[&Symbol::current("C1")];
        let base = [("U_V1", 12.0), ("R1", 4.0), ("R2", 12.0), ("R3", 6.0)];

        let mut charged = base.to_vec();
        charged.push(("U_C1", 9.0));
        assert_relative_eq!(i_c.evaluate(&lookup(&charged)).unwrap(), 0.0, epsilon = 1e-12);

        let mut empty = base.to_vec();
        empty.push(("U_C1", 0.0));
        assert_relative_eq!(i_c.evaluate(&lookup(&empty)).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn line_bridged_capacitor_matches_hand_derivation() {
        let topology = CircuitTopology::new(vec![
            Element::voltage_source("V1", 1, 0, 100.0).unwrap(),
            Element::resistor("R1", 1, 2, 1.0).unwrap(),
            Element::inductor("L1", 2, 3, 1e-3).unwrap(),
            Element::resistor("R2", 3, 0, 10.0).unwrap(),
            Element::line("X1", 3, 4).unwrap(),
            Element::capacitor("C1", 4, 0, 1e-3).unwrap(),
        ])
        .unwrap();
        let set = topology.derive().unwrap();
        let values = [("U_V1", 100.0), ("R1", 1.0), ("R2", 10.0), ("I_L1", 2.0), ("U_C1", 5.0)];
        let i_c = &set.current_expressions[&Symbol::current("C1")];
        let u_l = &set.voltage_expressions[&Symbol::voltage("L1")];
        assert_relative_eq!(i_c.evaluate(&lookup(&values)).unwrap(), 2.0 - 0.5);
        assert_relative_eq!(u_l.evaluate(&lookup(&values)).unwrap(), 100.0 - 2.0 - 5.0);
    }

    #[test]
    fn series_inductors_share_the_loop_voltage() {
        let topology = CircuitTopology::new(vec![
            Element::voltage_source("V1", 1, 0, 10.0).unwrap(),
            Element::resistor("R1", 1, 2, 1.0).unwrap(),
            Element::inductor("L1", 2, 3, 1.0).unwrap(),
            Element::inductor("L2", 3, 0, 3.0).unwrap(),
        ])
        .unwrap();
        let set = topology.derive().unwrap();
        let values = [("U_V1", 10.0), ("R1", 1.0), ("I_L1", 2.0), ("L1", 1.0), ("L2", 3.0)];
        let u1 = set.voltage_expressions[&Symbol::voltage("L1")]
            .evaluate(&lookup(&values))
            .unwrap();
        let u2 = set.voltage_expressions[&Symbol::voltage("L2")]
            .evaluate(&lookup(&values))
            .unwrap();
        assert_relative_eq!(u1 + u2, 8.0, epsilon = 1e-12);
        assert_relative_eq!(u2, 3.0 * u1, epsilon = 1e-12);
    }

    #[test]
    fn capacitor_across_source_is_unresolvable() {
        let topology = CircuitTopology::new(vec![
            Element::voltage_source("V1", 1, 0, 10.0).unwrap(),
            Element::line("X1", 1, 2).unwrap(),
            Element::capacitor("C1", 2, 0, 1e-6).unwrap(),
            Element::resistor("R1", 1, 3, 1.0).unwrap(),
            Element::capacitor("C2", 3, 0, 1e-6).unwrap(),
        ])
        .unwrap();
        assert!(matches!(
            topology.derive(),
            Err(Error::UnresolvableExpression { .. })
        ));
    }

    #[test]
    fn repeated_derivation_is_byte_identical() {
        let first = series_rlc().derive().unwrap().to_string();
        let second = series_rlc().derive().unwrap().to_string();
        assert_eq!(first, second);
    }

    #[test]
    fn final_rewrite_needs_no_substitution_round() {
        let rc = vec![
            Element::voltage_source("V1", 1, 0, 10.0).unwrap(),
            Element::resistor("R1", 1, 2, 2.0).unwrap(),
            Element::capacitor("C1", 2, 0, 1e-6).unwrap(),
        ];
        let set = with_iterations(rc, 0).derive().unwrap();
        let i_c = &set.current_expressions[&Symbol::current("C1")];
        let values = [("U_V1", 10.0), ("U_C1", 4.0), ("R1", 2.0)];
        assert_relative_eq!(i_c.evaluate(&lookup(&values)).unwrap(), 3.0);
    }

    #[test]
    fn iteration_limit_bounds_substitution_rounds() {
        let (symbol, reason) = unresolved(with_iterations(series_rlc_elements(), 0).derive());
        assert_eq!(symbol, Symbol::voltage("L1"));
        assert_eq!(reason, "iteration limit reached");
        assert!(with_iterations(series_rlc_elements(), 1).derive().is_ok());
    }

    #[test]
    fn rounds_that_do_not_shrink_the_pending_set_stall() {
        let one = BTreeSet::from([Symbol::voltage("R1")]);
        let two = BTreeSet::from([Symbol::voltage("R1"), Symbol::current("R2")]);
        let other = BTreeSet::from([Symbol::voltage("R3")]);
        assert!(!stalled(None, &two));
        assert!(!stalled(Some(&two), &one));
        assert!(stalled(Some(&one), &one));
        assert!(stalled(Some(&one), &other));
        assert!(stalled(Some(&one), &two));
    }

    #[test]
    fn self_dependence_is_solved_linearly() {
        let x = Symbol::current("R1");
        let expr = Expr::Const(0.5) * Expr::symbol(x.clone()) + Expr::Const(3.0);
        let solved = solve_for(&x, expr).unwrap();
        assert_eq!(solved.as_const(), Some(6.0));

        let unit = Expr::symbol(x.clone()) + Expr::symbol(Symbol::voltage("V1"));
        match solve_for(&x, unit) {
            Err(Error::UnresolvableExpression { reason, .. }) => {
                assert_eq!(reason, "depends on itself with unit gain");
            }
            other => panic!("unexpected {other:?}"),
        }

        let square = Expr::symbol(x.clone()) * Expr::symbol(x.clone());
        match solve_for(&x, square) {
            Err(Error::UnresolvableExpression { reason, .. }) => {
                assert_eq!(reason, "depends on itself non-linearly");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn inductor_in_current_source_loop_is_rejected() {
        let topology = CircuitTopology::new(vec![
            Element::current_source("I1", 0, 1, 1.0).unwrap(),
            Element::inductor("L1", 1, 2, 1e-3).unwrap(),
            Element::resistor("R1", 2, 0, 1.0).unwrap(),
        ])
        .unwrap();
        let (symbol, reason) = unresolved(topology.derive());
        assert_eq!(symbol, Symbol::voltage("L1"));
        assert_eq!(reason, "inductor in series with current source I1");
    }

    #[test]
    fn inductive_cut_set_is_rejected() {
        // Node 3 is reached only through inductors.
        let topology = CircuitTopology::new(vec![
            Element::voltage_source("V1", 1, 0, 10.0).unwrap(),
            Element::resistor("R1", 1, 2, 1.0).unwrap(),
            Element::resistor("R2", 2, 0, 1.0).unwrap(),
            Element::inductor("L1", 2, 3, 1e-3).unwrap(),
            Element::inductor("L2", 3, 0, 1e-3).unwrap(),
            Element::inductor("L3", 3, 1, 1e-3).unwrap(),
        ])
        .unwrap();
        let (symbol, reason) = unresolved(topology.derive());
        assert_eq!(symbol, Symbol::voltage("L1"));
        assert_eq!(reason, "inductor belongs to an inductive cut-set");
    }

    #[test]
    fn configured_ground_roots_the_loop_walk() {
        let elements = vec![
            Element::voltage_source("V1", 6, 5, 10.0).unwrap(),
            Element::resistor("R1", 6, 7, 2.0).unwrap(),
            Element::capacitor("C1", 7, 5, 1e-6).unwrap(),
        ];
        let config = EngineConfig {
            ground: NodeId::Index(7),
            ..EngineConfig::default()
        };
        let rooted = CircuitTopology::with_config(elements.clone(), config).unwrap();
        let fallback = CircuitTopology::new(elements).unwrap();

        let nodes = |t: &CircuitTopology| t.branches().get("C1").unwrap().nodes().to_vec();
        assert_eq!(nodes(&rooted), [7, 5, 6, 7].map(NodeId::Index).to_vec());
        assert_eq!(nodes(&fallback), [5, 6, 7, 5].map(NodeId::Index).to_vec());

        let values = [("U_V1", 10.0), ("U_C1", 4.0), ("R1", 2.0)];
        for topology in [&rooted, &fallback] {
            let set = topology.derive().unwrap();
            let i_c = &set.current_expressions[&Symbol::current("C1")];
            assert_relative_eq!(i_c.evaluate(&lookup(&values)).unwrap(), 3.0);
        }
    }
}
