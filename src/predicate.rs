use chrono::NaiveDateTime;
use diesel::dsl::not;
use diesel::prelude::*;
use diesel::sql_types::Bool;
use diesel::sqlite::Sqlite;

use crate::schema::students;

pub type BoxedPredicate = Box<dyn BoxableExpression<students::table, Sqlite, SqlType = Bool>>;

/// A filter over `students`, combined with `and`/`or`/`not`.
///
/// Name patterns use SQLite `LIKE`, which ignores ASCII case. A NULL
/// birthday never satisfies a birthday comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    IdEq(i32),
    NameEq(String),
    NameLike(String),
    NameContains(String),
    EmailEq(String),
    GradeEq(i32),
    GradeBetween(i32, i32),
    GradeAtLeast(i32),
    GradeAtMost(i32),
    BornBefore(NaiveDateTime),
    BornAfter(NaiveDateTime),
    EnrolledBefore(NaiveDateTime),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn id_eq(id: i32) -> Self {
        Predicate::IdEq(id)
    }

    pub fn name_eq(name: &str) -> Self {
        Predicate::NameEq(name.to_string())
    }

    pub fn name_like(pattern: &str) -> Self {
        Predicate::NameLike(pattern.to_string())
    }

    pub fn name_contains(fragment: &str) -> Self {
        Predicate::NameContains(fragment.to_string())
    }

    pub fn email_eq(email: &str) -> Self {
        Predicate::EmailEq(email.to_string())
    }

    pub fn grade_eq(grade: i32) -> Self {
        Predicate::GradeEq(grade)
    }

    pub fn grade_between(low: i32, high: i32) -> Self {
        Predicate::GradeBetween(low, high)
    }

    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Builds the diesel expression for this predicate. Each call produces a
    /// fresh box, so a predicate can drive several statements.
    pub fn to_expression(&self) -> BoxedPredicate {
        match self {
            Predicate::IdEq(id) => Box::new(students::id.eq(*id)),
            Predicate::NameEq(name) => Box::new(students::name.eq(name.clone())),
            Predicate::NameLike(pattern) => Box::new(students::name.like(pattern.clone())),
            Predicate::NameContains(fragment) => Box::new(
                students::name
                    .like(format!("%{}%", escape_like(fragment)))
                    .escape('\\'),
            ),
            Predicate::EmailEq(email) => Box::new(students::email.eq(email.clone())),
            Predicate::GradeEq(grade) => Box::new(students::grade.eq(*grade)),
            Predicate::GradeBetween(low, high) => {
                Box::new(students::grade.between(*low, *high))
            }
            Predicate::GradeAtLeast(grade) => Box::new(students::grade.ge(*grade)),
            Predicate::GradeAtMost(grade) => Box::new(students::grade.le(*grade)),
            Predicate::BornBefore(at) => {
                Box::new(students::birthday.assume_not_null().lt(*at))
            }
            Predicate::BornAfter(at) => Box::new(students::birthday.assume_not_null().gt(*at)),
            Predicate::EnrolledBefore(at) => Box::new(students::enrolled_date.lt(*at)),
            Predicate::And(left, right) => {
                Box::new(left.to_expression().and(right.to_expression()))
            }
            Predicate::Or(left, right) => Box::new(left.to_expression().or(right.to_expression())),
            Predicate::Not(inner) => Box::new(not(inner.to_expression())),
        }
    }
}

fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
