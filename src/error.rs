use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlxModelError {
    /// Comparator is not in the allowed operator set
    #[error("Invalid comparison operator: {0}")]
    InvalidComparator(String),
    /// Joiner keyword is not WHERE/AND/OR/IN/NOT IN
    #[error("Invalid conditional type passed to where statement: {0}")]
    InvalidClause(String),
    /// A value was supplied for a comparator that takes none
    #[error("Value should not be passed for comparator: {0}")]
    UnexpectedValue(String),
    /// Column and value lists differ in length
    #[error("Mismatch of values in {0} statement")]
    LengthMismatch(&'static str),
    /// Unconditional UPDATE / soft delete refused
    #[error("Refusing to run {0} without a WHERE clause")]
    MissingWhereClause(&'static str),
    /// A free-form fragment matched the denylist; kept distinct from
    /// validation errors because it signals a potential attack
    #[error("Fragment rejected by security check: {0}")]
    GuardRejected(String),
    /// A rendered placeholder has no registered bound value
    #[error("No bound value registered for placeholder: {0}")]
    MissingParameter(String),
    #[error("Unsupported database URL: {0}")]
    UnsupportedDatabase(String),
    #[error("No connection pool available for driver")]
    NoPoolAvailable,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, SqlxModelError>;
