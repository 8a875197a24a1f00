pub use crate::error::{
    AddConstraintError, AddEditVariableError, InternalSolverError, RemoveConstraintError,
    RemoveEditVariableError, SuggestValueError,
};
pub use crate::kit::{PartialConstraint, WeightedRelation};
pub use crate::solver::Solver;
pub use crate::strength;
pub use crate::types::{Constraint, Expression, RelationalOperator, Term, Variable};
