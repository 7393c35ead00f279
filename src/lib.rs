pub mod config;
pub mod connection;
pub mod errors;
pub mod models;
pub mod predicate;
pub mod query;
pub mod repository;
pub mod schema;
pub mod test_utils;

pub use config::RepositoryConfig;
pub use errors::{Constraint, RepositoryError};
pub use models::{GradeChange, NewStudent, Student, StudentChanges};
pub use predicate::Predicate;
pub use query::{StudentField, StudentQuery};
pub use repository::StudentRepository;
