use thiserror::Error;

/// Errors surfaced by the solver core.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid move: {0}")]
    InvalidMove(String),

    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
