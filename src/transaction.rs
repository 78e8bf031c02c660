use crate::database::Database;
use crate::error::{DatabaseError, SqlPortableError};

impl Database {
    /// Issue the dialect's BEGIN and set the transaction flag.
    ///
    /// Transactions do not nest: calling this again while a transaction is
    /// open re-issues BEGIN, and serializing transactional sections is up to
    /// the caller.
    ///
    /// # Errors
    /// Returns `Database` if the backend rejects BEGIN, or `Unavailable`
    /// after a failed connect.
    pub async fn begin_transaction(&mut self) -> Result<bool, SqlPortableError> {
        let profile = self.ensure_connected().await?;
        let conn = self.live_connection()?;
        conn.begin(profile).await.map_err(|e| {
            DatabaseError::new(e.to_string()).with_query(profile.begin_sql())
        })?;
        tracing::debug!("transaction started");
        self.in_transaction = true;
        Ok(true)
    }

    /// Commit the open transaction.
    ///
    /// Returns `Ok(false)` without contacting the backend when no
    /// transaction is open.
    ///
    /// # Errors
    /// Returns `Database` if the backend rejects COMMIT, or `Unavailable`
    /// after a failed connect.
    pub async fn commit(&mut self) -> Result<bool, SqlPortableError> {
        let profile = self.ensure_connected().await?;
        if !self.in_transaction {
            return Ok(false);
        }
        let conn = self.live_connection()?;
        conn.commit(profile).await.map_err(|e| {
            DatabaseError::new(e.to_string()).with_query(profile.commit_sql())
        })?;
        tracing::debug!("transaction committed");
        self.in_transaction = false;
        Ok(true)
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }
}
