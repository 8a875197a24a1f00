use thiserror::Error;

/// Failures that indicate a bug in the solver rather than bad input.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InternalSolverError {
    #[error("the objective is unbounded")]
    ObjectiveUnbounded,

    #[error("dual optimize failed to find an entering symbol")]
    DualOptimizeFailed,

    #[error("failed to find a leaving row for a marker")]
    FailedToFindLeavingRow,

    #[error("edit constraint not present in the system")]
    EditConstraintNotInSystem,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AddConstraintError {
    #[error("constraint is already present in the solver")]
    DuplicateConstraint,

    #[error("constraint cannot be satisfied alongside the required constraints")]
    UnsatisfiableConstraint,

    #[error(transparent)]
    Internal(#[from] InternalSolverError),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RemoveConstraintError {
    #[error("constraint is not present in the solver")]
    UnknownConstraint,

    #[error(transparent)]
    Internal(#[from] InternalSolverError),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AddEditVariableError {
    #[error("variable is already registered for editing")]
    DuplicateEditVariable,

    #[error("edit variables cannot use the required strength")]
    BadRequiredStrength,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RemoveEditVariableError {
    #[error("variable is not registered for editing")]
    UnknownEditVariable,

    #[error(transparent)]
    Internal(#[from] InternalSolverError),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SuggestValueError {
    #[error("variable is not registered for editing")]
    UnknownEditVariable,

    #[error(transparent)]
    Internal(#[from] InternalSolverError),
}
