use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

/// The store-level rule a write ran into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    UniqueEmail,
    GradeRange,
    EmailLength,
    NotNull,
    Other(String),
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constraint::UniqueEmail => write!(f, "unique-email"),
            Constraint::GradeRange => write!(f, "grade_between_1_and_12"),
            Constraint::EmailLength => write!(f, "email_at_most_55_chars"),
            Constraint::NotNull => write!(f, "not-null"),
            Constraint::Other(name) => write!(f, "{}", name),
        }
    }
}

impl Constraint {
    /// Maps a SQLite constraint failure onto one of the `students` table rules.
    ///
    /// SQLite reports unique failures by column (`UNIQUE constraint failed:
    /// students.email`) and check failures by constraint name (`CHECK
    /// constraint failed: grade_between_1_and_12`).
    pub fn classify(kind: &DatabaseErrorKind, message: &str) -> Option<Constraint> {
        let detail = message
            .split_once("constraint failed:")
            .map(|(_, rest)| rest.trim());
        match (kind, detail) {
            (DatabaseErrorKind::UniqueViolation, Some("students.email")) => {
                Some(Constraint::UniqueEmail)
            }
            (DatabaseErrorKind::NotNullViolation, _) => Some(Constraint::NotNull),
            (_, Some("students.email")) if message.starts_with("UNIQUE") => {
                Some(Constraint::UniqueEmail)
            }
            (_, Some(name)) if name.starts_with("grade_between_1_and_12") => {
                Some(Constraint::GradeRange)
            }
            (_, Some(name)) if name.starts_with("email_at_most_55_chars") => {
                Some(Constraint::EmailLength)
            }
            (
                DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::CheckViolation,
                Some(name),
            ) => Some(Constraint::Other(name.to_string())),
            (DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::CheckViolation, None) => {
                Some(Constraint::Other(message.to_string()))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("constraint {constraint} violated: {message}")]
    ConstraintViolation {
        constraint: Constraint,
        message: String,
    },

    #[error("database error: {0}")]
    Database(#[source] DieselError),

    #[error("cannot open store: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("failed running migrations: {0}")]
    Migration(String),

    #[error("cannot parse date {input:?}: {reason}")]
    InvalidDate { input: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RepositoryError {
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, RepositoryError::ConstraintViolation { .. })
    }

    pub fn constraint(&self) -> Option<&Constraint> {
        match self {
            RepositoryError::ConstraintViolation { constraint, .. } => Some(constraint),
            _ => None,
        }
    }
}

impl From<DieselError> for RepositoryError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(kind, info) => {
                let constraint = Constraint::classify(&kind, info.message());
                match constraint {
                    Some(constraint) => RepositoryError::ConstraintViolation {
                        constraint,
                        message: info.message().to_string(),
                    },
                    None => RepositoryError::Database(DieselError::DatabaseError(kind, info)),
                }
            }
            other => RepositoryError::Database(other),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
