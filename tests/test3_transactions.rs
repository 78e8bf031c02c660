#![cfg(feature = "sqlite")]

mod common;

use sql_portable::prelude::*;

use common::{init_tracing, sqlite_config};

#[tokio::test]
async fn test3_begin_then_commit() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let mut db = Database::new(sqlite_config(dir.path()));
    db.execute_audited("CREATE TABLE `*PREFIX*log` (`msg` TEXT)", &[])
        .await?;

    assert!(db.begin_transaction().await?);
    assert!(db.in_transaction());
    db.execute_audited(
        "INSERT INTO `*PREFIX*log` (`msg`) VALUES (?)",
        &[RowValues::Text("inside".into())],
    )
    .await?;
    assert!(db.commit().await?);
    assert!(!db.in_transaction());

    // Committed data survives a reconnect.
    assert!(db.disconnect().await);
    let rs = db
        .execute_audited("SELECT `msg` FROM `*PREFIX*log`", &[])
        .await?;
    assert_eq!(rs.num_rows(), 1);
    Ok(())
}

#[tokio::test]
async fn test3_bare_commit_returns_false() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut db = Database::new(sqlite_config(dir.path()));
    assert!(!db.commit().await?);

    // A backend COMMIT outside a transaction would fail; the flag keeps it away.
    assert!(db.begin_transaction().await?);
    assert!(db.commit().await?);
    assert!(!db.commit().await?);
    Ok(())
}
