#![cfg(feature = "sqlite")]

mod common;

use sql_portable::prelude::*;

use common::{init_tracing, sqlite_config};

async fn count(db: &mut Database) -> Result<usize, SqlPortableError> {
    Ok(db
        .execute_audited("SELECT `a`, `b` FROM `*PREFIX*pairs`", &[])
        .await?
        .num_rows())
}

#[tokio::test]
async fn test2_second_insert_is_a_no_op() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let mut db = Database::new(sqlite_config(dir.path()));
    db.execute_audited("CREATE TABLE `*PREFIX*pairs` (`a` INTEGER, `b` INTEGER)", &[])
        .await?;

    let fields = [("a", RowValues::Int(1)), ("b", RowValues::Int(2))];
    assert!(db.insert_if_not_exist("*PREFIX*pairs", &fields).await?);
    assert!(db.insert_if_not_exist("*PREFIX*pairs", &fields).await?);
    assert_eq!(count(&mut db).await?, 1);

    let rs = db
        .execute_audited("SELECT `a`, `b` FROM `*PREFIX*pairs`", &[])
        .await?;
    assert_eq!(rs.results[0].get("a"), Some(&RowValues::Int(1)));
    assert_eq!(rs.results[0].get("b"), Some(&RowValues::Int(2)));

    // Same columns in another order still match the stored row.
    let reordered = [("b", RowValues::Int(2)), ("a", RowValues::Int(1))];
    assert!(db.insert_if_not_exist("*PREFIX*pairs", &reordered).await?);
    assert_eq!(count(&mut db).await?, 1);

    let other = [("a", RowValues::Int(1)), ("b", RowValues::Int(3))];
    assert!(db.insert_if_not_exist("*PREFIX*pairs", &other).await?);
    assert_eq!(count(&mut db).await?, 2);
    Ok(())
}

#[tokio::test]
async fn test2_empty_fields_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut db = Database::new(sqlite_config(dir.path()));
    let err = db.insert_if_not_exist("*PREFIX*pairs", &[]).await.unwrap_err();
    assert!(matches!(
        err,
        SqlPortableError::Validation(ValidationError::EmptyFields)
    ));
    Ok(())
}

#[tokio::test]
async fn test2_missing_table_is_a_database_error() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut db = Database::new(sqlite_config(dir.path()));
    let err = db
        .insert_if_not_exist("*PREFIX*nope", &[("a", RowValues::Int(1))])
        .await
        .unwrap_err();
    assert!(matches!(err, SqlPortableError::Database(_)));
    Ok(())
}
