//! The constraint vocabulary: variables, linear expressions, and the
//! identity-keyed constraints the solver consumes.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::strength;

static VARIABLE_TICK: AtomicU64 = AtomicU64::new(0);
static CONSTRAINT_TICK: AtomicU64 = AtomicU64::new(0);

/// An opaque, user-visible solver variable.
///
/// Two variables compare equal exactly when they came from the same
/// `Variable::new` call. Ids are allocated from a process-wide counter so
/// variables stay distinct across solvers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable(u64);

impl Variable {
    pub fn new() -> Self {
        Self(VARIABLE_TICK.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for Variable {
    fn default() -> Self {
        Self::new()
    }
}

/// A single `coefficient · variable` product.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Term {
    pub variable: Variable,
    pub coefficient: f64,
}

impl Term {
    pub fn new(variable: Variable, coefficient: f64) -> Self {
        Self {
            variable,
            coefficient,
        }
    }
}

/// A linear expression `Σ cᵢ·vᵢ + k`. Term order carries no meaning.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Expression {
    pub terms: Vec<Term>,
    pub constant: f64,
}

impl Expression {
    pub fn new(terms: Vec<Term>, constant: f64) -> Self {
        Self { terms, constant }
    }

    pub fn from_constant(constant: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant,
        }
    }

    pub fn from_term(term: Term) -> Self {
        Self {
            terms: vec![term],
            constant: 0.0,
        }
    }

    pub fn negate(&mut self) {
        self.constant = -self.constant;
        for term in &mut self.terms {
            term.coefficient = -term.coefficient;
        }
    }
}

impl From<f64> for Expression {
    fn from(constant: f64) -> Self {
        Self::from_constant(constant)
    }
}

impl From<Variable> for Expression {
    fn from(variable: Variable) -> Self {
        Self::from_term(Term::new(variable, 1.0))
    }
}

impl From<Term> for Expression {
    fn from(term: Term) -> Self {
        Self::from_term(term)
    }
}

/// How an expression relates to zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationalOperator {
    LessOrEqual,
    Equal,
    GreaterOrEqual,
}

impl fmt::Display for RelationalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LessOrEqual => write!(f, "<="),
            Self::Equal => write!(f, "=="),
            Self::GreaterOrEqual => write!(f, ">="),
        }
    }
}

#[derive(Debug)]
struct ConstraintData {
    id: u64,
    expression: Expression,
    op: RelationalOperator,
    strength: f64,
}

/// A registered relation `expression op 0` with a strength.
///
/// A constraint is a handle: clones share one identity, while two
/// constraints built from identical parts remain distinct. Equality and
/// hashing use the identity only, so a constraint can key solver maps no
/// matter what its payload holds.
#[derive(Clone, Debug)]
pub struct Constraint(Arc<ConstraintData>);

impl Constraint {
    /// Build a constraint, clipping the strength to the legal range.
    pub fn new(expression: Expression, op: RelationalOperator, strength: f64) -> Self {
        Self(Arc::new(ConstraintData {
            id: CONSTRAINT_TICK.fetch_add(1, Ordering::Relaxed),
            expression,
            op,
            strength: strength::clip(strength),
        }))
    }

    #[inline(always)]
    pub fn expression(&self) -> &Expression {
        &self.0.expression
    }

    #[inline(always)]
    pub fn op(&self) -> RelationalOperator {
        self.0.op
    }

    #[inline(always)]
    pub fn strength(&self) -> f64 {
        self.0.strength
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Constraint {}

impl Hash for Constraint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}
