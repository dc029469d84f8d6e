//! Canonical rational normal form used by simplification and linear solving.
//!
//! A [`Poly`] is a sum of monomials with real coefficients. Monomials carry
//! integer exponents, so single-term denominators are stored as negative
//! powers. A denominator with several terms becomes an opaque group atom
//! with exponent -1; the group keeps its own polynomial so it can be printed
//! and expanded again when multiplied back in.

use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use super::{Expr, Symbol};
use crate::math::Scalar;

/// Relative size below which a sum of two coefficients is treated as zero.
const CANCEL_TOLERANCE: Scalar = 1e-12;

type Monomial = BTreeMap<Atom, i32>;
type Terms = BTreeMap<Monomial, Scalar>;

/// Multi-term denominator, identified by its printed canonical form.
#[derive(Debug, Clone)]
struct Group {
    key: String,
    terms: Rc<Terms>,
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Group {}

impl PartialOrd for Group {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Group {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Atom {
    Symbol(Symbol),
    Group(Group),
}

impl Atom {
    const fn is_parameter(&self) -> bool {
        matches!(self, Self::Symbol(Symbol::Parameter(_)))
    }

    fn to_expr(&self) -> Expr {
        match self {
            Self::Symbol(symbol) => Expr::Symbol(symbol.clone()),
            Self::Group(group) => Poly::from_terms((*group.terms).clone()).to_expr(),
        }
    }

    fn mentions(&self, symbol: &Symbol) -> bool {
        match self {
            Self::Symbol(s) => s == symbol,
            Self::Group(group) => group
                .terms
                .keys()
                .any(|m| m.keys().any(|atom| atom.mentions(symbol))),
        }
    }
}

fn accumulate(terms: &mut Terms, monomial: Monomial, coeff: Scalar) {
    if coeff == 0.0 {
        return;
    }
    match terms.entry(monomial) {
        Entry::Vacant(slot) => {
            slot.insert(coeff);
        }
        Entry::Occupied(mut slot) => {
            let prev = *slot.get();
            let next = prev + coeff;
            if next == 0.0 || next.abs() <= CANCEL_TOLERANCE * prev.abs().max(coeff.abs()) {
                slot.remove();
            } else {
                *slot.get_mut() = next;
            }
        }
    }
}

fn mul_monomials(a: &Monomial, b: &Monomial) -> Monomial {
    let mut out = a.clone();
    for (atom, exp) in b {
        let next = out.get(atom).copied().unwrap_or(0) + exp;
        if next == 0 {
            out.remove(atom);
        } else {
            out.insert(atom.clone(), next);
        }
    }
    out
}

fn invert_monomial(m: &Monomial) -> Monomial {
    m.iter().map(|(atom, exp)| (atom.clone(), -exp)).collect()
}

/// Smallest exponent of every atom across all terms (absent counts as 0).
fn min_exponents(terms: &Terms) -> Monomial {
    let atoms: BTreeSet<&Atom> = terms.keys().flat_map(BTreeMap::keys).collect();
    atoms
        .into_iter()
        .filter_map(|atom| {
            let min = terms
                .keys()
                .map(|m| m.get(atom).copied().unwrap_or(0))
                .min()
                .unwrap_or(0);
            (min != 0).then(|| (atom.clone(), min))
        })
        .collect()
}

fn term_expr(coeff: Scalar, monomial: &Monomial) -> Expr {
    let mut factors = Vec::new();
    let ordered = monomial
        .iter()
        .filter(|(atom, _)| atom.is_parameter())
        .chain(monomial.iter().filter(|(atom, _)| !atom.is_parameter()));
    for (atom, exp) in ordered {
        for _ in 0..*exp {
            factors.push(atom.to_expr());
        }
    }
    if factors.is_empty() {
        return Expr::Const(coeff);
    }
    if coeff != 1.0 {
        factors.insert(0, Expr::Const(coeff));
    }
    Expr::product(factors)
}

/// Polynomial over symbol and group atoms with integer exponents.
#[derive(Debug, Clone, Default)]
pub(crate) struct Poly {
    terms: Terms,
}

impl Poly {
    fn from_terms(terms: Terms) -> Self {
        Self { terms }
    }

    fn monomial(monomial: Monomial, coeff: Scalar) -> Self {
        let mut terms = Terms::new();
        accumulate(&mut terms, monomial, coeff);
        Self { terms }
    }

    pub(crate) fn constant(value: Scalar) -> Self {
        Self::monomial(Monomial::new(), value)
    }

    pub(crate) fn symbol(symbol: Symbol) -> Self {
        Self::monomial(Monomial::from([(Atom::Symbol(symbol), 1)]), 1.0)
    }

    pub(crate) fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Converts an expression tree into normal form.
    pub(crate) fn from_expr(expr: &Expr) -> Self {
        match expr {
            Expr::Const(value) => Self::constant(*value),
            Expr::Symbol(symbol) => Self::symbol(symbol.clone()),
            Expr::Sum(items) => items
                .iter()
                .fold(Self::constant(0.0), |acc, item| acc.add(&Self::from_expr(item))),
            Expr::Product(items) => items
                .iter()
                .fold(Self::constant(1.0), |acc, item| acc.mul(&Self::from_expr(item))),
            Expr::Quotient(n, d) => Self::from_expr(n).div(&Self::from_expr(d)),
        }
    }

    pub(crate) fn add(&self, other: &Self) -> Self {
        let mut out = self.clone();
        for (m, c) in &other.terms {
            accumulate(&mut out.terms, m.clone(), *c);
        }
        out
    }

    pub(crate) fn scale(&self, factor: Scalar) -> Self {
        let mut out = Self::default();
        for (m, c) in &self.terms {
            accumulate(&mut out.terms, m.clone(), c * factor);
        }
        out
    }

    fn mul_raw(&self, other: &Self) -> Self {
        let mut out = Self::default();
        for (ma, ca) in &self.terms {
            for (mb, cb) in &other.terms {
                accumulate(&mut out.terms, mul_monomials(ma, mb), ca * cb);
            }
        }
        out
    }

    pub(crate) fn mul(&self, other: &Self) -> Self {
        self.mul_raw(other).expand_groups()
    }

    /// Multiplies out every group raised to a positive power.
    fn expand_groups(self) -> Self {
        let has_positive = self
            .terms
            .keys()
            .any(|m| m.iter().any(|(atom, exp)| matches!(atom, Atom::Group(_)) && *exp > 0));
        if !has_positive {
            return self;
        }
        let mut out = Self::default();
        for (m, c) in &self.terms {
            let mut rest = Monomial::new();
            let mut expansions = Vec::new();
            for (atom, exp) in m {
                match atom {
                    Atom::Group(group) if *exp > 0 => expansions.push((group, *exp)),
                    _ => {
                        rest.insert(atom.clone(), *exp);
                    }
                }
            }
            let mut piece = Self::monomial(rest, *c);
            for (group, exp) in expansions {
                let inner = Self::from_terms((*group.terms).clone());
                for _ in 0..exp {
                    piece = piece.mul_raw(&inner);
                }
            }
            out = out.add(&piece);
        }
        out
    }

    /// Divides by `den`. Division by the zero polynomial yields NaN.
    pub(crate) fn div(&self, den: &Self) -> Self {
        match den.terms.len() {
            0 => Self::constant(Scalar::NAN),
            1 => match den.terms.iter().next() {
                Some((m, c)) => self.mul(&Self::monomial(invert_monomial(m), 1.0 / c)),
                None => Self::constant(Scalar::NAN),
            },
            _ => self.div_polynomial(den),
        }
    }

    fn div_polynomial(&self, den: &Self) -> Self {
        let mut num = self.clone();
        let mut den = den.clone();

        let clear: Monomial = min_exponents(&den.terms)
            .into_iter()
            .filter(|(_, exp)| *exp < 0)
            .map(|(atom, exp)| (atom, -exp))
            .collect();
        if !clear.is_empty() {
            let factor = Self::monomial(clear, 1.0);
            num = num.mul(&factor);
            den = den.mul(&factor);
        }

        let common: Monomial = min_exponents(&den.terms)
            .into_iter()
            .filter(|(_, exp)| *exp > 0)
            .map(|(atom, exp)| (atom, -exp))
            .collect();
        if !common.is_empty() {
            let factor = Self::monomial(common, 1.0);
            num = num.mul(&factor);
            den = den.mul(&factor);
        }

        if den.terms.len() < 2 {
            return num.div(&den);
        }

        if let Some(lead) = den.terms.values().next().copied() {
            num = num.scale(1.0 / lead);
            den = den.scale(1.0 / lead);
        }

        if let Some(ratio) = num.ratio_to(&den) {
            return ratio;
        }

        let key = den.to_expr().to_string();
        let group = Group {
            key,
            terms: Rc::new(den.terms),
        };
        num.mul(&Self::monomial(Monomial::from([(Atom::Group(group), -1)]), 1.0))
    }

    /// Returns `q` when `self == q * den` for a single monomial `q`.
    fn ratio_to(&self, den: &Self) -> Option<Self> {
        if self.terms.len() != den.terms.len() {
            return None;
        }
        let (nm, nc) = self.terms.iter().next()?;
        den.terms.iter().find_map(|(dm, dc)| {
            let q = Self::monomial(mul_monomials(nm, &invert_monomial(dm)), nc / dc);
            self.add(&den.mul(&q).scale(-1.0)).is_zero().then_some(q)
        })
    }

    /// Splits into `(coefficient, remainder)` around a symbol that appears
    /// with exponent 0 or 1 and never inside a group.
    pub(crate) fn linear_split(&self, symbol: &Symbol) -> Option<(Self, Self)> {
        let atom = Atom::Symbol(symbol.clone());
        let mut coefficient = Self::default();
        let mut rest = Self::default();
        for (m, c) in &self.terms {
            if m
                .keys()
                .any(|a| matches!(a, Atom::Group(_)) && a.mentions(symbol))
            {
                return None;
            }
            match m.get(&atom).copied().unwrap_or(0) {
                0 => accumulate(&mut rest.terms, m.clone(), *c),
                1 => {
                    let mut m = m.clone();
                    m.remove(&atom);
                    accumulate(&mut coefficient.terms, m, *c);
                }
                _ => return None,
            }
        }
        Some((coefficient, rest))
    }

    /// Rebuilds an expression tree, grouping terms over a shared denominator.
    pub(crate) fn to_expr(&self) -> Expr {
        let mut by_denominator: BTreeMap<Monomial, Vec<Expr>> = BTreeMap::new();
        for (m, c) in &self.terms {
            let mut numerator = Monomial::new();
            let mut denominator = Monomial::new();
            for (atom, exp) in m {
                if *exp > 0 {
                    numerator.insert(atom.clone(), *exp);
                } else {
                    denominator.insert(atom.clone(), -exp);
                }
            }
            by_denominator
                .entry(denominator)
                .or_default()
                .push(term_expr(*c, &numerator));
        }

        let mut parts = Vec::new();
        for (denominator, numerators) in by_denominator {
            if denominator.is_empty() {
                parts.extend(numerators);
            } else {
                parts.push(Expr::quotient(
                    Expr::sum(numerators),
                    term_expr(1.0, &denominator),
                ));
            }
        }
        Expr::sum(parts)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn p(name: &str) -> Expr {
        Expr::Symbol(Symbol::parameter(name))
    }

    fn eval(expr: &Expr, values: &[(&str, Scalar)]) -> Scalar {
        expr.evaluate(&|s: &Symbol| {
            values
                .iter()
                .find(|(name, _)| *name == s.element())
                .map(|(_, v)| *v)
        })
        .expect("bound")
    }

    #[test]
    fn like_terms_cancel() {
        let expr = p("a") * p("b") - p("b") * p("a");
        assert!(Poly::from_expr(&expr).is_zero());
    }

    #[test]
    fn nested_quotients_flatten() {
        let expr = Expr::one() / (Expr::one() / p("a") + Expr::one() / p("b"));
        let simplified = expr.simplify();
        let values = [("a", 2.0), ("b", 3.0)];
        assert_relative_eq!(eval(&simplified, &values), 1.2, epsilon = 1e-12);
        assert_eq!(simplified.to_string(), "a*b/(a + b)");
    }

    #[test]
    fn proportional_quotient_folds_to_monomial() {
        let expr = (p("a") * p("c") + p("b") * p("c")) / (p("a") + p("b"));
        assert_eq!(expr.simplify().to_string(), "c");
    }

    #[test]
    fn group_multiplied_back_expands() {
        let den = p("a") + p("b");
        let expr = p("x") / den.clone() * den;
        let simplified = expr.simplify();
        let values = [("a", 2.0), ("b", 3.0), ("x", 7.0)];
        assert_relative_eq!(eval(&simplified, &values), 7.0, epsilon = 1e-12);
    }

    #[test]
    fn simplify_is_idempotent() {
        let expr = (p("x") - p("y") * p("z")) / (p("r") + p("s")) + p("y") / p("r");
        let once = expr.simplify();
        let twice = once.simplify();
        assert_eq!(once.to_string(), twice.to_string());
    }

    #[test]
    fn relative_cancellation_tolerance() {
        let expr = Expr::Const(0.1) + Expr::Const(0.2) - Expr::Const(0.3);
        assert!(expr.is_zero());
    }
}
