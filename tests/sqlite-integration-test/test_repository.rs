use crate::test_utils::*;
use chrono::NaiveDate;
use log::info;
use rosterdiesel::{
    NewStudent, Predicate, RepositoryConfig, RepositoryError, StudentChanges, StudentField,
    StudentRepository,
};

#[test]
fn commit_assigns_ids() {
    let mut repo = fresh_repo();
    repo.add(albert_einstein());
    assert_eq!(repo.pending().len(), 1);

    let stored = repo.commit().expect("Error committing student");
    assert_eq!(stored.len(), 1);
    assert!(stored[0].id() > 0);
    assert!(repo.pending().is_empty());

    let found = repo.find(stored[0].id()).unwrap().expect("student not stored");
    assert_eq!(found, stored[0]);
    info!("Stored {}", found);
}

#[test]
fn commit_keeps_staging_order() {
    let mut repo = fresh_repo();
    let stored = fill_students_table(&mut repo);
    assert_eq!(stored[0].name, "Albert Einstein");
    assert_eq!(stored[1].name, "Alan Turing");
    assert!(stored[0].id() < stored[1].id());
}

#[test]
fn stored_fields_round_trip() {
    let mut repo = fresh_repo();
    let enrolled = date_from_string("2024-09-01");
    repo.add(
        NewStudent::new("Alan Turing", "alan.turing@sherborne.edu", 11)
            .with_birthday_str("1912-06-23")
            .unwrap()
            .enrolled_at(enrolled),
    );
    let stored = repo.commit().unwrap().remove(0);
    let found = repo.find(stored.id()).unwrap().unwrap();
    assert_eq!(found.email, "alan.turing@sherborne.edu");
    assert_eq!(found.grade, 11);
    assert_eq!(found.enrolled_date, enrolled);
    assert_eq!(
        found.birthday.map(|b| b.date()),
        NaiveDate::from_ymd_opt(1912, 6, 23)
    );
}

#[test]
fn example_scenario() {
    let mut repo = fresh_repo();
    repo.add(NewStudent::new("Student A", "a@x.edu", 6));
    repo.add(NewStudent::new("Student B", "b@x.edu", 11));
    let stored = repo.commit().unwrap();
    assert_eq!(repo.count().unwrap(), 2);

    let top = repo
        .query()
        .order_by(StudentField::Grade, true)
        .limit(1)
        .all()
        .unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].email, "b@x.edu");

    assert!(repo.delete(&stored[0]).unwrap());
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn deleted_student_is_gone() {
    let mut repo = fresh_repo();
    let stored = fill_students_table(&mut repo);
    let albert = repo
        .query()
        .filter(Predicate::name_eq("Albert Einstein"))
        .first()
        .unwrap()
        .expect("Albert should exist");

    assert!(repo.delete(&albert).unwrap());
    assert_eq!(repo.find(albert.id()).unwrap(), None);
    assert_eq!(
        repo.query()
            .filter(Predicate::name_eq("Albert Einstein"))
            .first()
            .unwrap(),
        None
    );
    // A second delete finds nothing to remove.
    assert!(!repo.delete(&albert).unwrap());
    assert_eq!(repo.find(stored[1].id()).unwrap().unwrap().name, "Alan Turing");
}

#[test]
fn ids_are_not_reused() {
    let mut repo = fresh_repo();
    let stored = fill_students_table(&mut repo);
    let last = stored.last().unwrap();
    repo.delete(last).unwrap();

    repo.add(NewStudent::new("Grace Hopper", "grace.hopper@yale.edu", 12));
    let grace = repo.commit().unwrap().remove(0);
    assert!(grace.id() > last.id());
}

#[test]
fn update_where_shifts_every_grade() {
    let mut repo = fresh_repo();
    fill_students_table(&mut repo);

    let touched = repo
        .update_where(
            &Predicate::grade_between(1, 12),
            &StudentChanges::new().shift_grade(1),
        )
        .unwrap();
    assert_eq!(touched, 2);

    let grades = repo
        .query()
        .order_by(StudentField::Id, false)
        .names_and_grades()
        .unwrap();
    assert_eq!(
        grades,
        vec![
            ("Albert Einstein".to_string(), 7),
            ("Alan Turing".to_string(), 12)
        ]
    );
}

#[test]
fn update_where_sets_columns_on_matches_only() {
    let mut repo = fresh_repo();
    let stored = fill_students_table(&mut repo);

    let touched = repo
        .update_where(
            &Predicate::name_like("%Alan%"),
            &StudentChanges::new()
                .name("Alan Mathison Turing")
                .grade(10)
                .birthday(None),
        )
        .unwrap();
    assert_eq!(touched, 1);

    let alan = repo.find(stored[1].id()).unwrap().unwrap();
    assert_eq!(alan.name, "Alan Mathison Turing");
    assert_eq!(alan.grade, 10);
    assert_eq!(alan.birthday, None);

    let albert = repo.find(stored[0].id()).unwrap().unwrap();
    assert_eq!(albert, stored[0]);
}

#[test]
fn save_writes_in_place_changes() {
    let mut repo = fresh_repo();
    let mut albert = fill_students_table(&mut repo).remove(0);
    albert.grade = 8;
    albert.email = "einstein@ias.edu".to_string();

    let saved = repo.save(&albert).unwrap().expect("row should exist");
    assert_eq!(saved, albert);
    assert_eq!(repo.find(albert.id()).unwrap().unwrap().email, "einstein@ias.edu");
}

#[test]
fn save_of_deleted_student_returns_none() {
    let mut repo = fresh_repo();
    let albert = fill_students_table(&mut repo).remove(0);
    repo.delete(&albert).unwrap();
    assert_eq!(repo.save(&albert).unwrap(), None);
}

#[test]
fn delete_where_removes_matches() {
    let mut repo = fresh_repo();
    fill_students_table(&mut repo);
    let removed = repo.delete_where(&Predicate::GradeAtLeast(10)).unwrap();
    assert_eq!(removed, 1);
    assert_eq!(repo.query().names().unwrap(), vec!["Albert Einstein".to_string()]);
}

#[test]
fn queries_before_schema_fail() {
    let mut repo = StudentRepository::open(RepositoryConfig::default()).unwrap();
    let err = repo.query_all().unwrap_err();
    assert!(matches!(err, RepositoryError::Database(_)), "{:?}", err);

    repo.create_schema().unwrap();
    assert!(repo.query_all().unwrap().is_empty());
}
