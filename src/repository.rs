use diesel::prelude::*;
use log::{debug, info, warn};

use crate::config::RepositoryConfig;
use crate::connection::{establish_connection, run_migrations};
use crate::errors::{RepositoryError, RepositoryResult};
use crate::models::{GradeChange, NewStudent, Student, StudentChanges};
use crate::predicate::Predicate;
use crate::query::{StudentQuery, log_statement};
use crate::schema::students;

/// Owns the connection to a student store and the students staged for the
/// next `commit`.
///
/// Staged students only reach the store on `commit`. Updates and deletes run
/// immediately, each in its own transaction.
pub struct StudentRepository {
    connection: SqliteConnection,
    pending: Vec<NewStudent>,
    config: RepositoryConfig,
}

impl StudentRepository {
    pub fn open(config: RepositoryConfig) -> RepositoryResult<Self> {
        let connection = establish_connection(&config)?;
        let mut repo = StudentRepository {
            connection,
            pending: Vec::new(),
            config,
        };
        if repo.config.create_schema {
            repo.create_schema()?;
        }
        Ok(repo)
    }

    /// A fresh in-memory store with the schema in place.
    pub fn in_memory() -> RepositoryResult<Self> {
        Self::open(RepositoryConfig::in_memory())
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Creates `students`, its constraints and the `name` index. Calling it on
    /// a store that already has them changes nothing.
    pub fn create_schema(&mut self) -> RepositoryResult<()> {
        let applied = run_migrations(&mut self.connection)?;
        if applied == 0 {
            debug!("Schema already up to date");
        }
        Ok(())
    }

    pub fn add(&mut self, student: NewStudent) {
        debug!("Staging student {} <{}>", student.name, student.email);
        self.pending.push(student);
    }

    pub fn add_all<I: IntoIterator<Item = NewStudent>>(&mut self, students: I) {
        students.into_iter().for_each(|s| self.add(s));
    }

    pub fn pending(&self) -> &[NewStudent] {
        &self.pending
    }

    /// Drops everything staged since the last commit.
    pub fn rollback(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        if dropped > 0 {
            info!(dropped = dropped; "Discarded staged students");
        }
        dropped
    }

    /// Inserts every staged student in one transaction and returns the stored
    /// rows, ids included, in staging order.
    ///
    /// A violated constraint rolls back the whole batch. The staging area is
    /// emptied either way.
    pub fn commit(&mut self) -> RepositoryResult<Vec<Student>> {
        let staged = std::mem::take(&mut self.pending);
        if staged.is_empty() {
            return Ok(Vec::new());
        }
        let log_statements = self.config.log_statements;
        let result = self
            .connection
            .transaction::<_, RepositoryError, _>(|conn| {
                staged
                    .iter()
                    .map(|student| {
                        let insert = diesel::insert_into(students::table)
                            .values(student)
                            .returning(Student::as_returning());
                        log_statement(log_statements, &insert);
                        insert.get_result::<Student>(conn).map_err(RepositoryError::from)
                    })
                    .collect::<RepositoryResult<Vec<Student>>>()
            });
        match &result {
            Ok(stored) => info!(inserted = stored.len(); "Committed staged students"),
            Err(e) => warn!(staged = staged.len(); "Commit rolled back: {}", e),
        }
        result
    }

    pub fn query(&mut self) -> StudentQuery<'_> {
        StudentQuery::new(&mut self.connection, self.config.log_statements)
    }

    pub fn query_all(&mut self) -> RepositoryResult<Vec<Student>> {
        self.query().all()
    }

    pub fn query_filtered(&mut self, predicate: Predicate) -> RepositoryResult<Vec<Student>> {
        self.query().filter(predicate).all()
    }

    pub fn count(&mut self) -> RepositoryResult<i64> {
        self.query().count()
    }

    pub fn find(&mut self, id: i32) -> RepositoryResult<Option<Student>> {
        Ok(students::table
            .find(id)
            .select(Student::as_select())
            .first(&mut self.connection)
            .optional()?)
    }

    /// Writes back every column of `student` except `id`. Returns `None` when
    /// the row no longer exists.
    pub fn save(&mut self, student: &Student) -> RepositoryResult<Option<Student>> {
        let update = diesel::update(student)
            .set(student)
            .returning(Student::as_returning());
        log_statement(self.config.log_statements, &update);
        let stored = self
            .connection
            .transaction::<_, RepositoryError, _>(|conn| {
                Ok(update.get_result::<Student>(conn).optional()?)
            })?;
        if stored.is_some() {
            info!(id = student.id(); "Saved student");
        }
        Ok(stored)
    }

    /// Applies `changes` to every row matching `predicate` in one statement
    /// and returns the number of rows touched. Any violation leaves every row
    /// as it was.
    pub fn update_where(
        &mut self,
        predicate: &Predicate,
        changes: &StudentChanges,
    ) -> RepositoryResult<usize> {
        if changes.is_empty() {
            return Ok(0);
        }
        let log_statements = self.config.log_statements;
        let updated = self
            .connection
            .transaction::<_, RepositoryError, _>(|conn| {
                let target = diesel::update(students::table).filter(predicate.to_expression());
                let columns = changes.columns();
                let count = match changes.grade {
                    None => {
                        let update = target.set(columns);
                        log_statement(log_statements, &update);
                        update.execute(conn)?
                    }
                    Some(GradeChange::Set(grade)) => {
                        let update = target.set((columns, students::grade.eq(grade)));
                        log_statement(log_statements, &update);
                        update.execute(conn)?
                    }
                    Some(GradeChange::Shift(delta)) => {
                        let update =
                            target.set((columns, students::grade.eq(students::grade + delta)));
                        log_statement(log_statements, &update);
                        update.execute(conn)?
                    }
                };
                Ok(count)
            })?;
        info!(updated = updated; "Updated students");
        Ok(updated)
    }

    /// Removes the student's row. Returns whether a row was removed.
    pub fn delete(&mut self, student: &Student) -> RepositoryResult<bool> {
        let delete = diesel::delete(student);
        log_statement(self.config.log_statements, &delete);
        let removed = delete.execute(&mut self.connection)?;
        if removed > 0 {
            info!(id = student.id(); "Deleted student");
        }
        Ok(removed > 0)
    }

    pub fn delete_where(&mut self, predicate: &Predicate) -> RepositoryResult<usize> {
        let delete = diesel::delete(students::table).filter(predicate.to_expression());
        log_statement(self.config.log_statements, &delete);
        let removed = delete.execute(&mut self.connection)?;
        info!(removed = removed; "Deleted students");
        Ok(removed)
    }
}
