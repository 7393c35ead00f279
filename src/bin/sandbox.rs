use dotenvy::dotenv;
use itertools::Itertools;
use log::info;
use rosterdiesel::{
    NewStudent, Predicate, RepositoryConfig, RepositoryError, StudentChanges, StudentField,
    StudentRepository,
};

fn main() -> Result<(), RepositoryError> {
    dotenv().ok();
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = RepositoryConfig {
        create_schema: true,
        ..RepositoryConfig::from_env()
    };
    let mut repo = StudentRepository::open(config)?;

    repo.add(
        NewStudent::new("Albert Einstein", "albert.einstein@zurich.edu", 6)
            .with_birthday_str("1879-03-14")?,
    );
    let albert = repo.commit()?;
    repo.add(
        NewStudent::new("Alan Turing", "alan.turing@sherborne.edu", 11)
            .with_birthday_str("1912-06-23")?,
    );
    let alan = repo.commit()?;
    for student in albert.iter().chain(alan.iter()) {
        println!("New student ID is {}.", student.id());
    }

    let everyone = repo.query_all()?;
    println!("[{}]", everyone.iter().join(", "));

    println!("{:?}", repo.query().names()?);
    println!(
        "{:?}",
        repo.query().order_by(StudentField::Name, false).names()?
    );
    println!(
        "{:?}",
        repo.query()
            .order_by(StudentField::Grade, true)
            .names_and_grades()?
    );

    let top = repo.query().order_by(StudentField::Grade, true).first()?;
    if let Some(student) = &top {
        println!(
            "[({:?}, {:?})]",
            student.name,
            student.birthday.map(|b| b.to_string())
        );
    }

    println!("({},)", repo.count()?);

    let alans = repo.query_filtered(Predicate::name_like("%Alan%").and(Predicate::grade_eq(11)))?;
    println!("{}", alans.iter().map(|s| s.name.as_str()).join(", "));

    let all = Predicate::grade_between(1, 12);
    repo.update_where(&all, &StudentChanges::new().shift_grade(1))?;
    println!("{:?}", repo.query().order_by(StudentField::Id, false).names_and_grades()?);

    let einstein = repo
        .query()
        .filter(Predicate::name_eq("Albert Einstein"))
        .first()?;
    if let Some(student) = einstein {
        repo.delete(&student)?;
        info!("Deleted {}", student);
    }
    let gone = repo
        .query()
        .filter(Predicate::name_eq("Albert Einstein"))
        .first()?;
    println!("{:?}", gone.map(|s| s.to_string()));

    Ok(())
}
