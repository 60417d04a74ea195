use std::fmt::{self, Display};

use thiserror::Error;

#[derive(Debug)]
pub struct QueryError {
    info: String,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self { info }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Database(e) => Self::new(format!("{e}")),
            sqlx::Error::RowNotFound => Self::new(format!("RowNotFound")),
            sqlx::Error::TypeNotFound { type_name } => {
                Self::new(format!("Type not found: {type_name}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                Self::new(format!("Column index out of bounds {index} ({len})"))
            }
            sqlx::Error::ColumnDecode { index, source } => {
                Self::new(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::PoolTimedOut => Self::new(format!("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(format!("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(format!("Worker crashed")),
            e => Self::new(format!("{e}")),
        }
    }
}

impl Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.info)
    }
}

impl std::error::Error for QueryError {}

/// Malformed query parameter or form value.
#[derive(Debug)]
pub struct TypeError {
    info: String,
}

impl TypeError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }
}

impl Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.info)
    }
}

impl std::error::Error for TypeError {}

#[derive(Error, Debug)]
pub enum FoodgramError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidOperation(String),

    #[error("Authentication credentials were not provided or are invalid")]
    Unauthorized,

    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Store error: {0}")]
    Store(#[from] QueryError),
}

impl FoodgramError {
    pub fn validation(info: &str) -> Self {
        Self::Validation(info.to_owned())
    }

    pub fn not_found(info: &str) -> Self {
        Self::NotFound(info.to_owned())
    }

    pub fn conflict(info: &str) -> Self {
        Self::Conflict(info.to_owned())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::Conflict(_) | Self::InvalidOperation(_) => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound(_) => 404,
            Self::ConstraintViolation(_) | Self::Store(_) => 500,
        }
    }
}

impl From<sqlx::Error> for FoodgramError {
    fn from(value: sqlx::Error) -> Self {
        if let sqlx::Error::Database(e) = &value {
            if e.is_unique_violation() {
                return Self::ConstraintViolation(e.constraint().unwrap_or("unique").to_owned());
            }
            if e.is_foreign_key_violation() {
                return Self::not_found("Referenced object does not exist");
            }
            if e.is_check_violation() {
                return Self::validation("Value has to be greater than 0");
            }
        }

        log::error!("Query failed: {value}");
        Self::Store(QueryError::from(value))
    }
}

impl From<TypeError> for FoodgramError {
    fn from(value: TypeError) -> Self {
        Self::Validation(value.info)
    }
}
