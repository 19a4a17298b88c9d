use std::fmt;

use napi::Error as NapiError;
use rusqlite::{ffi, Error as SqliteError};

use crate::db::{SqliteType, TransactionState};

/// Errors raised by the facade.
///
/// Statement execution does not go through this type directly; see [`Status`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot open database '{path}': {message}")]
    Connection { path: String, message: String },

    #[error("database is closed")]
    Closed,

    #[error("SQLite error {code}: {message}")]
    Execution { code: i32, message: String },

    #[error("index {index} out of range for {len} entries")]
    Index { index: usize, len: usize },

    #[error("no such column: {0}")]
    Lookup(String),

    #[error("cannot convert {found} field to {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: SqliteType,
    },

    #[error("cannot {operation} a transaction that is {state}")]
    State {
        operation: &'static str,
        state: TransactionState,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Engine result code for this error, `SQLITE_MISUSE` for facade-level misuse.
    pub fn code(&self) -> i32 {
        match self {
            Error::Execution { code, .. } => *code,
            Error::Connection { .. } => ffi::SQLITE_CANTOPEN,
            Error::Index { .. } => ffi::SQLITE_RANGE,
            _ => ffi::SQLITE_MISUSE,
        }
    }
}

impl From<SqliteError> for Error {
    fn from(err: SqliteError) -> Self {
        Error::Execution {
            code: result_code(&err),
            message: err.to_string(),
        }
    }
}

/// Map a rusqlite error onto the engine's (extended) result code.
pub(crate) fn result_code(err: &SqliteError) -> i32 {
    match err {
        SqliteError::SqliteFailure(inner, _) => inner.extended_code,
        SqliteError::InvalidParameterName(_) | SqliteError::InvalidParameterCount(..) => {
            ffi::SQLITE_RANGE
        }
        SqliteError::MultipleStatement => ffi::SQLITE_MISUSE,
        _ => ffi::SQLITE_ERROR,
    }
}

/// Outcome of executing a statement: the engine result code plus its message.
///
/// `exec` reports failures through this value instead of returning `Err`,
/// so callers must inspect it. Use [`Status::into_result`] to bridge into `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Status {
    code: i32,
    message: Option<String>,
}

impl Status {
    pub const OK: Status = Status {
        code: ffi::SQLITE_OK,
        message: None,
    };

    pub(crate) fn from_error(err: &Error) -> Self {
        Status {
            code: err.code(),
            message: Some(err.to_string()),
        }
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn is_ok(&self) -> bool {
        self.code == ffi::SQLITE_OK
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn into_result(self) -> Result<()> {
        if self.is_ok() {
            return Ok(());
        }
        Err(Error::Execution {
            code: self.code,
            message: self.message.unwrap_or_default(),
        })
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::OK
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{} ({})", self.code, message),
            None => write!(f, "{}", self.code),
        }
    }
}

pub fn to_napi_error(err: SqliteError) -> NapiError {
    NapiError::from_reason(format!("SQLite Error: {}", err))
}

impl From<Error> for NapiError {
    fn from(err: Error) -> Self {
        NapiError::from_reason(format!("SQLite Error: {}", err))
    }
}
