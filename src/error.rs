//! Error types for request validation, solver output decoding and solving.

use thiserror::Error;

/// An optimize request that cannot be turned into an [`Instance`](crate::domain::Instance).
///
/// Raised at the request boundary, before any solver process is spawned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The form body could not be read or lacks the `data` field.
    #[error("malformed request: {0}")]
    Form(String),
    /// The `data` field is not valid JSON or does not match the request shape.
    #[error("malformed request: {0}")]
    Json(String),
    /// The matrix has no rows.
    #[error("malformed request: matrix is empty")]
    EmptyMatrix,
    /// A matrix row length differs from the row count.
    #[error("malformed request: matrix row {row} has {len} cells, expected {expected}")]
    NotSquare {
        row: usize,
        len: usize,
        expected: usize,
    },
    /// A matrix cell has no weight component.
    #[error("malformed request: matrix cell ({row}, {col}) is empty")]
    EmptyCell { row: usize, col: usize },
    /// `time_window` is not aligned with the matrix rows.
    #[error("malformed request: {len} time windows for {nodes} nodes")]
    TimeWindowCount { len: usize, nodes: usize },
    /// A window entry does not have two or three elements.
    #[error("malformed request: {field}[{index}] has {len} elements, expected 2 or 3")]
    WindowArity {
        field: &'static str,
        index: usize,
        len: usize,
    },
}

/// Solver output that does not follow the decoder's grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed solver output: {0}")]
    Json(String),
    #[error("malformed solver output: missing `tour` array")]
    MissingTour,
    #[error("malformed solver output: tour does not contain the depot")]
    MissingDepot,
    #[error("malformed solver output: node id {id} outside 1..={size}")]
    NodeOutOfRange { id: u64, size: usize },
    #[error("malformed solver output: line {line}: `{token}` is not an integer")]
    NotAnInteger { line: usize, token: String },
}

/// Errors raised while solving an instance.
///
/// A solver that exits with a failure status is not an error; it yields
/// [`SolveOutcome::NoResult`](crate::solver::SolveOutcome::NoResult).
#[derive(Debug, Error)]
pub enum SolveError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// Temp file handling or process spawning failed.
    #[error("solver I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The blocking solve task panicked or was cancelled.
    #[error("solve task failed: {0}")]
    Task(String),
}
