//! Typed symbolic expressions over element parameters and circuit quantities.
//!
//! Formulas are trees of constants, symbols, sums, products and quotients.
//! Symbols are typed (`U_x`, `I_x`, parameter `x`) so substitution never
//! matches part of another name.

mod normal;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::math::Scalar;

pub(crate) use normal::Poly;

/// A named quantity appearing in circuit formulas.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    /// Voltage across an element, `U_<name>` = V(terminal_a) - V(terminal_b).
    Voltage(String),
    /// Current through an element from terminal_a to terminal_b, `I_<name>`.
    Current(String),
    /// The element's scalar parameter (resistance, inductance, capacitance, level).
    Parameter(String),
}

impl Symbol {
    /// Voltage symbol for `element`.
    #[must_use]
    pub fn voltage(element: impl Into<String>) -> Self {
        Self::Voltage(element.into())
    }

    /// Current symbol for `element`.
    #[must_use]
    pub fn current(element: impl Into<String>) -> Self {
        Self::Current(element.into())
    }

    /// Parameter symbol for `element`.
    #[must_use]
    pub fn parameter(element: impl Into<String>) -> Self {
        Self::Parameter(element.into())
    }

    /// Name of the element this symbol refers to.
    #[must_use]
    pub fn element(&self) -> &str {
        match self {
            Self::Voltage(name) | Self::Current(name) | Self::Parameter(name) => name,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Voltage(name) => write!(f, "U_{name}"),
            Self::Current(name) => write!(f, "I_{name}"),
            Self::Parameter(name) => write!(f, "{name}"),
        }
    }
}

/// Closure produced by [`Expr::compile`]; evaluates against a state slice.
pub type CompiledExpr = Box<dyn Fn(&[Scalar]) -> Scalar + Send + Sync>;

/// Symbolic expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric constant.
    Const(Scalar),
    /// Named quantity.
    Symbol(Symbol),
    /// Sum of all operands.
    Sum(Vec<Expr>),
    /// Product of all operands.
    Product(Vec<Expr>),
    /// Numerator over denominator.
    Quotient(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// The constant zero.
    #[must_use]
    pub fn zero() -> Self {
        Self::Const(0.0)
    }

    /// The constant one.
    #[must_use]
    pub fn one() -> Self {
        Self::Const(1.0)
    }

    /// Wraps a symbol.
    #[must_use]
    pub fn symbol(symbol: Symbol) -> Self {
        Self::Symbol(symbol)
    }

    /// Builds a sum, collapsing the empty and single-operand cases.
    #[must_use]
    pub fn sum(mut operands: Vec<Expr>) -> Self {
        match operands.len() {
            0 => Self::zero(),
            1 => operands.remove(0),
            _ => Self::Sum(operands),
        }
    }

    /// Builds a product, collapsing the empty and single-operand cases.
    #[must_use]
    pub fn product(mut operands: Vec<Expr>) -> Self {
        match operands.len() {
            0 => Self::one(),
            1 => operands.remove(0),
            _ => Self::Product(operands),
        }
    }

    /// Builds `numerator / denominator`.
    #[must_use]
    pub fn quotient(numerator: Expr, denominator: Expr) -> Self {
        Self::Quotient(Box::new(numerator), Box::new(denominator))
    }

    /// Returns the value when the expression is a bare constant.
    #[must_use]
    pub fn as_const(&self) -> Option<Scalar> {
        match self {
            Self::Const(value) => Some(*value),
            _ => None,
        }
    }

    /// True when the expression simplifies to the constant zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        Poly::from_expr(self).is_zero()
    }

    /// Collects every symbol referenced by the expression.
    #[must_use]
    pub fn symbols(&self) -> BTreeSet<Symbol> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<Symbol>) {
        match self {
            Self::Const(_) => {}
            Self::Symbol(symbol) => {
                out.insert(symbol.clone());
            }
            Self::Sum(items) | Self::Product(items) => {
                for item in items {
                    item.collect_symbols(out);
                }
            }
            Self::Quotient(numerator, denominator) => {
                numerator.collect_symbols(out);
                denominator.collect_symbols(out);
            }
        }
    }

    /// True if `symbol` occurs anywhere in the tree.
    #[must_use]
    pub fn contains(&self, symbol: &Symbol) -> bool {
        match self {
            Self::Const(_) => false,
            Self::Symbol(s) => s == symbol,
            Self::Sum(items) | Self::Product(items) => items.iter().any(|i| i.contains(symbol)),
            Self::Quotient(n, d) => n.contains(symbol) || d.contains(symbol),
        }
    }

    /// Replaces every occurrence of `symbol` with `replacement`.
    #[must_use]
    pub fn substitute(&self, symbol: &Symbol, replacement: &Expr) -> Expr {
        match self {
            Self::Symbol(s) if s == symbol => replacement.clone(),
            Self::Const(_) | Self::Symbol(_) => self.clone(),
            Self::Sum(items) => {
                Self::Sum(items.iter().map(|i| i.substitute(symbol, replacement)).collect())
            }
            Self::Product(items) => {
                Self::Product(items.iter().map(|i| i.substitute(symbol, replacement)).collect())
            }
            Self::Quotient(n, d) => Self::quotient(
                n.substitute(symbol, replacement),
                d.substitute(symbol, replacement),
            ),
        }
    }

    /// Replaces every symbol found in `table` in a single pass.
    #[must_use]
    pub fn substitute_all(&self, table: &BTreeMap<Symbol, Expr>) -> Expr {
        match self {
            Self::Symbol(s) => table.get(s).cloned().unwrap_or_else(|| self.clone()),
            Self::Const(_) => self.clone(),
            Self::Sum(items) => Self::Sum(items.iter().map(|i| i.substitute_all(table)).collect()),
            Self::Product(items) => {
                Self::Product(items.iter().map(|i| i.substitute_all(table)).collect())
            }
            Self::Quotient(n, d) => Self::quotient(n.substitute_all(table), d.substitute_all(table)),
        }
    }

    /// Rewrites the expression into canonical rational form: like terms are
    /// combined, constants folded, nested quotients flattened and terms over
    /// the same denominator grouped.
    #[must_use]
    pub fn simplify(&self) -> Expr {
        Poly::from_expr(self).to_expr()
    }

    /// Splits an expression that is linear in `symbol` into
    /// `(coefficient, remainder)` with `self = coefficient * symbol + remainder`.
    ///
    /// Returns `None` when `symbol` appears non-linearly (squared, or inside a
    /// denominator).
    #[must_use]
    pub fn linear_split(&self, symbol: &Symbol) -> Option<(Expr, Expr)> {
        let (coefficient, remainder) = Poly::from_expr(self).linear_split(symbol)?;
        Some((coefficient.to_expr(), remainder.to_expr()))
    }

    /// Evaluates the expression, resolving symbols through `lookup`.
    ///
    /// Returns `None` if a symbol cannot be resolved.
    pub fn evaluate<F>(&self, lookup: &F) -> Option<Scalar>
    where
        F: Fn(&Symbol) -> Option<Scalar>,
    {
        match self {
            Self::Const(value) => Some(*value),
            Self::Symbol(symbol) => lookup(symbol),
            Self::Sum(items) => items.iter().map(|i| i.evaluate(lookup)).sum(),
            Self::Product(items) => items.iter().map(|i| i.evaluate(lookup)).product(),
            Self::Quotient(n, d) => Some(n.evaluate(lookup)? / d.evaluate(lookup)?),
        }
    }

    /// Compiles the tree once into a closure reading symbols from slice
    /// positions given by `slots`.
    ///
    /// # Errors
    /// Returns the first symbol that has no slot.
    pub fn compile(&self, slots: &BTreeMap<Symbol, usize>) -> Result<CompiledExpr, Symbol> {
        let compiled: CompiledExpr = match self {
            Self::Const(value) => {
                let value = *value;
                Box::new(move |_: &[Scalar]| value)
            }
            Self::Symbol(symbol) => {
                let idx = *slots.get(symbol).ok_or_else(|| symbol.clone())?;
                Box::new(move |x: &[Scalar]| x[idx])
            }
            Self::Sum(items) => {
                let parts = items
                    .iter()
                    .map(|i| i.compile(slots))
                    .collect::<Result<Vec<_>, _>>()?;
                Box::new(move |x: &[Scalar]| parts.iter().map(|p| p(x)).sum())
            }
            Self::Product(items) => {
                let parts = items
                    .iter()
                    .map(|i| i.compile(slots))
                    .collect::<Result<Vec<_>, _>>()?;
                Box::new(move |x: &[Scalar]| parts.iter().map(|p| p(x)).product())
            }
            Self::Quotient(n, d) => {
                let n = n.compile(slots)?;
                let d = d.compile(slots)?;
                Box::new(move |x: &[Scalar]| n(x) / d(x))
            }
        };
        Ok(compiled)
    }

    /// Splits a leading negative sign off for printing.
    fn negated(&self) -> Option<Expr> {
        match self {
            Self::Const(value) if *value < 0.0 => Some(Self::Const(-value)),
            Self::Product(items) => match items.first() {
                Some(Self::Const(c)) if *c < 0.0 => {
                    let mut rest = items.clone();
                    if *c == -1.0 {
                        rest.remove(0);
                    } else {
                        rest[0] = Self::Const(-c);
                    }
                    Some(Self::product(rest))
                }
                _ => None,
            },
            Self::Quotient(n, d) => n.negated().map(|n| Self::quotient(n, (**d).clone())),
            _ => None,
        }
    }
}

impl From<Symbol> for Expr {
    fn from(symbol: Symbol) -> Self {
        Self::Symbol(symbol)
    }
}

impl From<Scalar> for Expr {
    fn from(value: Scalar) -> Self {
        Self::Const(value)
    }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::Sum(vec![self, rhs])
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        Expr::Sum(vec![self, -rhs])
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        Expr::Product(vec![self, rhs])
    }
}

impl Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        Expr::quotient(self, rhs)
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        match self {
            Expr::Const(value) => Expr::Const(-value),
            other => Expr::Product(vec![Expr::Const(-1.0), other]),
        }
    }
}

fn write_factor(f: &mut fmt::Formatter<'_>, expr: &Expr) -> fmt::Result {
    match expr {
        Expr::Sum(_) | Expr::Quotient(..) => write!(f, "({expr})"),
        Expr::Const(value) if *value < 0.0 => write!(f, "({expr})"),
        _ => write!(f, "{expr}"),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(value) => write!(f, "{value}"),
            Self::Symbol(symbol) => write!(f, "{symbol}"),
            Self::Sum(items) => {
                if items.is_empty() {
                    return write!(f, "0");
                }
                for (idx, item) in items.iter().enumerate() {
                    let (negative, shown) = match item.negated() {
                        Some(positive) => (true, positive),
                        None => (false, item.clone()),
                    };
                    match (idx, negative) {
                        (0, true) => write!(f, "-")?,
                        (0, false) => {}
                        (_, true) => write!(f, " - ")?,
                        (_, false) => write!(f, " + ")?,
                    }
                    if matches!(shown, Expr::Sum(_)) {
                        write!(f, "({shown})")?;
                    } else {
                        write!(f, "{shown}")?;
                    }
                }
                Ok(())
            }
            Self::Product(items) => {
                if items.is_empty() {
                    return write!(f, "1");
                }
                if let Some(positive) = self.negated() {
                    write!(f, "-")?;
                    return write_factor(f, &positive);
                }
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, "*")?;
                    }
                    write_factor(f, item)?;
                }
                Ok(())
            }
            Self::Quotient(n, d) => {
                match **n {
                    Expr::Sum(_) | Expr::Quotient(..) => write!(f, "({n})")?,
                    _ => write!(f, "{n}")?,
                }
                write!(f, "/")?;
                match **d {
                    Expr::Symbol(_) => write!(f, "{d}"),
                    Expr::Const(value) if value >= 0.0 => write!(f, "{d}"),
                    _ => write!(f, "({d})"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn sym(name: &str) -> Expr {
        Expr::symbol(Symbol::parameter(name))
    }

    #[test]
    fn typed_symbols_do_not_collide() {
        let expr = Expr::symbol(Symbol::voltage("C12")) + sym("C1");
        let replaced = expr.substitute(&Symbol::parameter("C1"), &Expr::Const(2.0));
        assert!(replaced.contains(&Symbol::voltage("C12")));
        assert!(!replaced.contains(&Symbol::parameter("C1")));
    }

    #[test]
    fn display_uses_signs_between_terms() {
        let expr = Expr::Sum(vec![
            Expr::symbol(Symbol::voltage("V1")),
            -(sym("R1") * Expr::symbol(Symbol::current("L1"))),
        ]);
        assert_eq!(expr.to_string(), "U_V1 - R1*I_L1");
    }

    #[test]
    fn evaluate_resolves_symbols() {
        let expr = (sym("a") + Expr::Const(2.0)) / sym("b");
        let value = expr
            .evaluate(&|s: &Symbol| match s.element() {
                "a" => Some(4.0),
                "b" => Some(3.0),
                _ => None,
            })
            .expect("all symbols bound");
        assert_relative_eq!(value, 2.0);
    }

    #[test]
    fn compile_reports_unbound_symbol() {
        let expr = sym("a") * sym("b");
        let slots = BTreeMap::from([(Symbol::parameter("a"), 0)]);
        let err = expr.compile(&slots).err().expect("b has no slot");
        assert_eq!(err, Symbol::parameter("b"));
    }

    #[test]
    fn compiled_closure_matches_evaluate() {
        let expr = (sym("x") - Expr::Const(1.0)) * sym("y") / Expr::Const(4.0);
        let slots = BTreeMap::from([(Symbol::parameter("x"), 0), (Symbol::parameter("y"), 1)]);
        let compiled = expr.compile(&slots).expect("compiles");
        assert_relative_eq!(compiled(&[3.0, 2.0]), 1.0);
    }

    #[test]
    fn linear_split_extracts_coefficient() {
        let x = Symbol::current("R2");
        let expr = Expr::symbol(Symbol::voltage("C1")) / sym("R1")
            - sym("R2") / sym("R1") * Expr::symbol(x.clone());
        let (coefficient, rest) = expr.linear_split(&x).expect("linear");
        let lookup = |s: &Symbol| match s.element() {
            "R1" => Some(2.0),
            "R2" => Some(6.0),
            "C1" => Some(10.0),
            _ => None,
        };
        assert_relative_eq!(coefficient.evaluate(&lookup).unwrap(), -3.0);
        assert_relative_eq!(rest.evaluate(&lookup).unwrap(), 5.0);
    }

    #[test]
    fn linear_split_rejects_symbol_in_denominator() {
        let x = Symbol::parameter("x");
        let expr = Expr::one() / (sym("x") + Expr::one());
        assert!(expr.linear_split(&x).is_none());
    }
}
