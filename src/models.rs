use chrono::{NaiveDateTime, NaiveTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use serde::{Deserialize, Serialize};

use crate::errors::{RepositoryError, RepositoryResult};
use crate::schema::students;

/// A row of the `students` table.
///
/// `id` is assigned by the store and has no setter; every other field may be
/// mutated in place and written back with `StudentRepository::save`.
/// Rows only come from the store, so a `Student` serializes to JSON but is
/// never built from it.
#[derive(Queryable, Selectable, Identifiable, AsChangeset, Serialize, Debug, PartialEq, Clone)]
#[diesel(table_name = students)]
#[diesel(check_for_backend(Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct Student {
    id: i32,
    pub name: String,
    pub email: String,
    pub grade: i32,
    pub birthday: Option<NaiveDateTime>,
    pub enrolled_date: NaiveDateTime,
}

impl Student {
    pub fn id(&self) -> i32 {
        self.id
    }
}

impl std::fmt::Display for Student {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Student {}: {}, Grade {}", self.id, self.name, self.grade)
    }
}

/// A student that has not been persisted yet.
#[derive(Insertable, Serialize, Deserialize, Debug, PartialEq, Clone)]
#[diesel(table_name = students)]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    pub grade: i32,
    pub birthday: Option<NaiveDateTime>,
    pub enrolled_date: NaiveDateTime,
}

impl NewStudent {
    /// `enrolled_date` is the current UTC time, matching the UTC midnight
    /// used for parsed birthdays.
    pub fn new(name: &str, email: &str, grade: i32) -> Self {
        NewStudent {
            name: name.to_string(),
            email: email.to_string(),
            grade,
            birthday: None,
            enrolled_date: Utc::now().naive_utc(),
        }
    }

    pub fn with_birthday(mut self, birthday: NaiveDateTime) -> Self {
        self.birthday = Some(birthday);
        self
    }

    /// Parses free-form dates such as `1879-03-14` or `March 14, 1879`.
    /// A missing time of day means midnight UTC.
    pub fn with_birthday_str(self, birthday: &str) -> RepositoryResult<Self> {
        let parsed = dateparser::parse_with(birthday, &Utc, NaiveTime::default()).map_err(|e| {
            RepositoryError::InvalidDate {
                input: birthday.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(self.with_birthday(parsed.naive_utc()))
    }

    pub fn enrolled_at(mut self, enrolled_date: NaiveDateTime) -> Self {
        self.enrolled_date = enrolled_date;
        self
    }
}

/// How an update touches `grade`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeChange {
    Set(i32),
    Shift(i32),
}

/// Column assignments for `StudentRepository::update_where`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub grade: Option<GradeChange>,
    pub birthday: Option<Option<NaiveDateTime>>,
}

impl StudentChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn grade(mut self, grade: i32) -> Self {
        self.grade = Some(GradeChange::Set(grade));
        self
    }

    pub fn shift_grade(mut self, delta: i32) -> Self {
        self.grade = Some(GradeChange::Shift(delta));
        self
    }

    pub fn birthday(mut self, birthday: Option<NaiveDateTime>) -> Self {
        self.birthday = Some(birthday);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.grade.is_none() && self.birthday.is_none()
    }

    pub(crate) fn columns(&self) -> ColumnChanges<'_> {
        ColumnChanges {
            name: self.name.as_deref(),
            email: self.email.as_deref(),
            birthday: self.birthday,
        }
    }
}

/// The plain column assignments of a `StudentChanges`; `grade` is applied
/// separately since a shift is an expression rather than a value.
#[derive(AsChangeset)]
#[diesel(table_name = students)]
pub(crate) struct ColumnChanges<'a> {
    name: Option<&'a str>,
    email: Option<&'a str>,
    birthday: Option<Option<NaiveDateTime>>,
}
