#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use sql_portable::prelude::*;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Config for an on-disk SQLite database under `dir`.
pub fn sqlite_config(dir: &Path) -> DbConfig {
    DbConfig::builder(Dialect::Sqlite)
        .name("portable")
        .data_directory(dir)
        .table_prefix("oc_")
        .finish()
}

/// Request scope that records the fatal-connect calls instead of exiting.
#[derive(Clone, Default)]
pub struct RecordingScope {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl RecordingScope {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl RequestScope for RecordingScope {
    fn invalidate_identity(&self) {
        self.events.lock().unwrap().push("invalidate_identity".into());
    }

    fn service_unavailable(&self, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("service_unavailable: {message}"));
    }

    fn terminate(&self) {
        self.events.lock().unwrap().push("terminate".into());
    }
}

pub async fn create_items_table(db: &mut Database) -> Result<(), SqlPortableError> {
    db.execute_audited(
        "CREATE TABLE `*PREFIX*items` (`id` INTEGER PRIMARY KEY AUTOINCREMENT, `name` TEXT NOT NULL UNIQUE, `qty` INTEGER)",
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

pub fn names(rs: &ResultSet) -> Vec<String> {
    rs.iter()
        .map(|row| row.get("name").and_then(RowValues::as_text).unwrap_or_default().to_string())
        .collect()
}
