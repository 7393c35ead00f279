use diesel::debug_query;
use diesel::prelude::*;
use diesel::query_builder::QueryFragment;
use diesel::sqlite::Sqlite;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::RepositoryResult;
use crate::models::Student;
use crate::predicate::Predicate;
use crate::schema::students;

/// Logs the SQL and binds of `statement` at debug level when `enabled`.
pub(crate) fn log_statement<T: QueryFragment<Sqlite>>(enabled: bool, statement: &T) {
    if enabled {
        debug!("{}", debug_query::<Sqlite, _>(statement));
    }
}

/// Columns a query can be ordered by.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentField {
    Id,
    Name,
    Email,
    Grade,
    Birthday,
    EnrolledDate,
}

/// A lazily built `SELECT` over `students`.
///
/// Filters are AND-combined. Orderings accumulate: the first `order_by` is the
/// primary sort key. Nothing touches the store until a terminal method
/// (`all`, `first`, `count`, `names`, `names_and_grades`) runs.
pub struct StudentQuery<'r> {
    connection: &'r mut SqliteConnection,
    predicate: Option<Predicate>,
    ordering: Vec<(StudentField, bool)>,
    limit: Option<i64>,
    offset: Option<i64>,
    log_statements: bool,
}

impl<'r> StudentQuery<'r> {
    pub(crate) fn new(connection: &'r mut SqliteConnection, log_statements: bool) -> Self {
        StudentQuery {
            connection,
            predicate: None,
            ordering: Vec::new(),
            limit: None,
            offset: None,
            log_statements,
        }
    }

    pub fn logs_statements(&self) -> bool {
        self.log_statements
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn order_by(mut self, field: StudentField, descending: bool) -> Self {
        self.ordering.push((field, descending));
        self
    }

    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n.max(0));
        self
    }

    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n.max(0));
        self
    }

    fn filtered(&self) -> students::BoxedQuery<'static, Sqlite> {
        let mut query: students::BoxedQuery<'static, Sqlite> = students::table.into_boxed();
        if let Some(predicate) = &self.predicate {
            query = query.filter(predicate.to_expression());
        }
        query
    }

    fn shaped(&self) -> students::BoxedQuery<'static, Sqlite> {
        let mut query = self.filtered();
        for (field, descending) in &self.ordering {
            query = match (*field, *descending) {
                (StudentField::Id, false) => query.then_order_by(students::id.asc()),
                (StudentField::Id, true) => query.then_order_by(students::id.desc()),
                (StudentField::Name, false) => query.then_order_by(students::name.asc()),
                (StudentField::Name, true) => query.then_order_by(students::name.desc()),
                (StudentField::Email, false) => query.then_order_by(students::email.asc()),
                (StudentField::Email, true) => query.then_order_by(students::email.desc()),
                (StudentField::Grade, false) => query.then_order_by(students::grade.asc()),
                (StudentField::Grade, true) => query.then_order_by(students::grade.desc()),
                (StudentField::Birthday, false) => query.then_order_by(students::birthday.asc()),
                (StudentField::Birthday, true) => query.then_order_by(students::birthday.desc()),
                (StudentField::EnrolledDate, false) => {
                    query.then_order_by(students::enrolled_date.asc())
                }
                (StudentField::EnrolledDate, true) => {
                    query.then_order_by(students::enrolled_date.desc())
                }
            };
        }
        // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded.
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => query.limit(limit).offset(offset),
            (Some(limit), None) => query.limit(limit),
            (None, Some(offset)) => query.limit(-1).offset(offset),
            (None, None) => query,
        }
    }

    pub fn all(self) -> RepositoryResult<Vec<Student>> {
        let query = self.shaped().select(Student::as_select());
        log_statement(self.log_statements, &query);
        Ok(query.load(self.connection)?)
    }

    /// First row in the current order, `None` when nothing matches.
    pub fn first(self) -> RepositoryResult<Option<Student>> {
        if self.limit == Some(0) {
            return Ok(None);
        }
        let query = self.shaped().select(Student::as_select()).limit(1);
        log_statement(self.log_statements, &query);
        Ok(query.get_result(self.connection).optional()?)
    }

    /// Number of matching rows, as limited by `offset` and `limit`.
    pub fn count(self) -> RepositoryResult<i64> {
        let query = self.filtered().count();
        log_statement(self.log_statements, &query);
        let matching: i64 = query.get_result(self.connection)?;
        let remaining = (matching - self.offset.unwrap_or(0)).max(0);
        Ok(match self.limit {
            Some(limit) => remaining.min(limit),
            None => remaining,
        })
    }

    pub fn names(self) -> RepositoryResult<Vec<String>> {
        let query = self.shaped().select(students::name);
        log_statement(self.log_statements, &query);
        Ok(query.load(self.connection)?)
    }

    pub fn names_and_grades(self) -> RepositoryResult<Vec<(String, i32)>> {
        let query = self.shaped().select((students::name, students::grade));
        log_statement(self.log_statements, &query);
        Ok(query.load(self.connection)?)
    }
}
