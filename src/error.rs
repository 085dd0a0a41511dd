use thiserror::Error;




/**
 * Error to represent a violated contract on a box array, or a failure to
 * read or write one.
 */
#[derive(Debug, Error)]
pub enum Error {
    #[error("box array is not defined")]
    NotDefined,

    #[error("box array is already defined (clear it first)")]
    Redefinition,

    #[error("index {index} out of range for box array of length {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("{0} requested on a box array with no boxes")]
    EmptyCollection(&'static str),

    #[error("index type mismatch: expected {expected}, found {found}")]
    InconsistentIndexType { expected: String, found: String },

    #[error("box array is not coarsenable by {ratio}")]
    NotCoarsenable { ratio: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("cbor error: {0}")]
    Cbor(String),
}




pub type Result<T> = std::result::Result<T, Error>;
