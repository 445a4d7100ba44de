use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
    /// An append violated the property's monotonicity direction; ingest
    /// aborts for this document but earlier appends are retained.
    OutOfOrder,
    /// `pool_count` cap reached on append; the property is now read-only.
    PoolsExhausted,
    /// `open` detected a bad magic, version, capacity mismatch, or a
    /// truncated file.
    CorruptIndex,
    /// `search` named a property not present in the configuration.
    UnknownProperty,
    /// A `search` call observed its cancellation token set.
    Canceled,
    /// The injected tokenizer returned an error.
    TokenizerFailure,
    Io,
    Internal,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: impl Into<String>) -> Self {
        Error {
            kind,
            context: context.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            context: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
