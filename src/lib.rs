//! Incremental linear constraint solving.
//!
//! `taut` implements the Cassowary solving algorithm: a simplex tableau over
//! priority-weighted linear constraints. Required constraints always hold,
//! weaker ones are violated as little as their strength allows. Constraints
//! can be added and removed one at a time, edit variables accept suggested
//! values interactively, and the solver reports which variables moved since
//! the last read.

pub mod error;
pub mod kit;
mod num;
pub mod prelude;
mod row;
pub mod solver;
pub mod strength;
mod symbol;
pub mod types;

pub use kit::WeightedRelation;
pub use solver::Solver;
pub use types::{Constraint, Expression, RelationalOperator, Term, Variable};
