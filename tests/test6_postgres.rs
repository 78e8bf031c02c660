#![cfg(feature = "test-utils")]

mod common;

use sql_portable::prelude::*;
use sql_portable::test_utils::{setup_postgres_embedded, stop_postgres_embedded};

use common::{init_tracing, names};

async fn create_items_table(db: &mut Database) -> Result<(), SqlPortableError> {
    db.execute_audited(
        "CREATE TABLE `*PREFIX*items` (`id` BIGSERIAL PRIMARY KEY, `name` TEXT NOT NULL UNIQUE, `qty` INTEGER)",
        &[],
    )
    .await?;
    for (name, qty) in [("a", 1), ("b", 2), ("c", 3), ("d", 4), ("e", 5)] {
        db.execute_audited(
            "INSERT INTO `*PREFIX*items` (`name`, `qty`) VALUES (?, ?)",
            &[RowValues::Text(name.into()), RowValues::Int(qty)],
        )
        .await?;
    }
    Ok(())
}

#[tokio::test]
async fn test6_postgres_limit_and_offset() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let pg = setup_postgres_embedded("test6_paging").await?;
    let mut db = Database::new(pg.config.clone());
    create_items_table(&mut db).await?;

    let base = "SELECT `name` FROM `*PREFIX*items` ORDER BY `id`";
    let page = db
        .execute_audited(AuditedStatementSpec::new(base).with_limit(2).with_offset(1), &[])
        .await?;
    assert_eq!(names(&page), ["b", "c"]);

    let tail = db
        .execute_audited(AuditedStatementSpec::new(base).with_offset(3), &[])
        .await?;
    assert_eq!(names(&tail), ["d", "e"]);

    let empty = db
        .execute_audited(AuditedStatementSpec::new(base).with_limit(0), &[])
        .await?;
    assert_eq!(empty.num_rows(), 0);

    let err = db
        .execute_audited("SELECT `name` FROM `*PREFIX*items` OFFSET 1", &[])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SqlPortableError::Validation(ValidationError::InlineLimit)
    ));

    // Handles bind parameters on every run.
    let handle = db
        .prepare("SELECT `name` FROM `*PREFIX*items` WHERE `qty` > ? ORDER BY `id`", Some(1), None)
        .await?;
    assert_eq!(handle.sql(), "SELECT \"name\" FROM \"oc_items\" WHERE \"qty\" > $1 ORDER BY \"id\" LIMIT 1");
    assert_eq!(names(&db.execute_audited(&handle, &[RowValues::Int(3)]).await?), ["d"]);
    assert_eq!(names(&db.execute_audited(&handle, &[RowValues::Int(0)]).await?), ["a"]);

    assert!(db.disconnect().await);
    stop_postgres_embedded(pg).await;
    Ok(())
}

#[tokio::test]
async fn test6_postgres_insert_if_not_exist() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let pg = setup_postgres_embedded("test6_upsert").await?;
    let mut db = Database::new(pg.config.clone());
    db.execute_audited("CREATE TABLE `*PREFIX*pairs` (`a` INTEGER, `b` TEXT)", &[])
        .await?;

    let fields = [("a", RowValues::Int(1)), ("b", RowValues::Text("x".into()))];
    assert!(db.insert_if_not_exist("*PREFIX*pairs", &fields).await?);
    assert!(db.insert_if_not_exist("*PREFIX*pairs", &fields).await?);

    let select = "SELECT `a`, `b` FROM `*PREFIX*pairs`";
    let rs = db.execute_audited(select, &[]).await?;
    assert_eq!(rs.num_rows(), 1);
    assert_eq!(rs.results[0].get("a"), Some(&RowValues::Int(1)));
    assert_eq!(rs.results[0].get("b"), Some(&RowValues::Text("x".into())));

    let other = [("a", RowValues::Int(1)), ("b", RowValues::Text("y".into()))];
    assert!(db.insert_if_not_exist("*PREFIX*pairs", &other).await?);
    assert_eq!(db.execute_audited(select, &[]).await?.num_rows(), 2);

    assert!(db.disconnect().await);
    stop_postgres_embedded(pg).await;
    Ok(())
}

#[tokio::test]
async fn test6_postgres_transactions() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let pg = setup_postgres_embedded("test6_tx").await?;
    let mut db = Database::new(pg.config.clone());
    db.execute_audited("CREATE TABLE `*PREFIX*log` (`msg` TEXT)", &[])
        .await?;

    assert!(!db.commit().await?);
    assert!(db.begin_transaction().await?);
    assert!(db.in_transaction());
    db.execute_audited(
        "INSERT INTO `*PREFIX*log` (`msg`) VALUES (?)",
        &[RowValues::Text("inside".into())],
    )
    .await?;
    assert!(db.commit().await?);
    assert!(!db.in_transaction());

    // Committed rows are visible from a fresh connection.
    assert!(db.disconnect().await);
    let rs = db
        .execute_audited("SELECT `msg` FROM `*PREFIX*log`", &[])
        .await?;
    assert_eq!(rs.num_rows(), 1);

    assert!(db.disconnect().await);
    stop_postgres_embedded(pg).await;
    Ok(())
}

#[tokio::test]
async fn test6_postgres_insert_id_and_caching() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let pg = setup_postgres_embedded("test6_insert_id").await?;
    let mut db = Database::new(pg.config.clone());
    create_items_table(&mut db).await?;
    assert_eq!(db.insert_id(Some("*PREFIX*items")).await?, 5);

    db.enable_caching(false).await?;
    db.execute_audited(
        "INSERT INTO `*PREFIX*items` (`name`, `qty`) VALUES (?, ?)",
        &[RowValues::Text("f".into()), RowValues::Int(6)],
    )
    .await?;
    assert_eq!(db.insert_id(Some("*PREFIX*items")).await?, 6);

    db.enable_caching(true).await?;
    let rs = db
        .execute_audited("SELECT `name` FROM `*PREFIX*items` WHERE `qty` = ?", &[RowValues::Int(6)])
        .await?;
    assert_eq!(names(&rs), ["f"]);

    assert!(db.disconnect().await);
    stop_postgres_embedded(pg).await;
    Ok(())
}
