//! Audited execution: every statement goes through one normalization,
//! validation and prepare/execute pipeline.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::database::Database;
use crate::error::{SqlPortableError, ValidationError};
use crate::results::ResultSet;
use crate::statement::StatementHandle;
use crate::translation::contains_paging_token;
use crate::translator;
use crate::types::RowValues;

/// SQL plus structural limit/offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditedStatementSpec {
    pub sql: String,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
}

impl AuditedStatementSpec {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            limit: None,
            offset: None,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// The accepted input shapes of [`Database::execute_audited`].
#[derive(Debug, Clone)]
pub enum AuditedStatement<'a> {
    /// Raw SQL; must not carry an inline `LIMIT` or `OFFSET`.
    Sql(Cow<'a, str>),
    /// SQL with structural limit/offset.
    Spec(AuditedStatementSpec),
    /// A statement prepared earlier, run as is.
    Handle(&'a StatementHandle),
}

impl<'a> From<&'a str> for AuditedStatement<'a> {
    fn from(sql: &'a str) -> Self {
        AuditedStatement::Sql(Cow::Borrowed(sql))
    }
}

impl From<String> for AuditedStatement<'_> {
    fn from(sql: String) -> Self {
        AuditedStatement::Sql(Cow::Owned(sql))
    }
}

impl From<AuditedStatementSpec> for AuditedStatement<'_> {
    fn from(spec: AuditedStatementSpec) -> Self {
        AuditedStatement::Spec(spec)
    }
}

impl<'a> From<&'a StatementHandle> for AuditedStatement<'a> {
    fn from(handle: &'a StatementHandle) -> Self {
        AuditedStatement::Handle(handle)
    }
}

/// Dynamic input: a JSON string is raw SQL, a JSON object is a descriptor
/// that must carry `sql`.
impl TryFrom<JsonValue> for AuditedStatement<'_> {
    type Error = ValidationError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::String(sql) => Ok(AuditedStatement::Sql(Cow::Owned(sql))),
            JsonValue::Object(map) => {
                let Some(sql) = map.get("sql").and_then(JsonValue::as_str) else {
                    return Err(ValidationError::MissingSql);
                };
                let number = |key: &str| -> Result<Option<u64>, ValidationError> {
                    match map.get(key) {
                        None | Some(JsonValue::Null) => Ok(None),
                        Some(v) => v.as_u64().map(Some).ok_or_else(|| {
                            ValidationError::UnexpectedShape(format!("{key} = {v}"))
                        }),
                    }
                };
                Ok(AuditedStatement::Spec(AuditedStatementSpec {
                    sql: sql.to_string(),
                    limit: number("limit")?,
                    offset: number("offset")?,
                }))
            }
            other => Err(ValidationError::UnexpectedShape(other.to_string())),
        }
    }
}

enum Normalized<'a> {
    Spec(AuditedStatementSpec),
    Handle(&'a StatementHandle),
}

impl<'a> AuditedStatement<'a> {
    /// Resolve to a spec or a handle, rejecting inline paging in raw SQL.
    fn normalize(self) -> Result<Normalized<'a>, ValidationError> {
        match self {
            AuditedStatement::Sql(sql) => {
                if contains_paging_token(&sql) {
                    return Err(ValidationError::InlineLimit);
                }
                Ok(Normalized::Spec(AuditedStatementSpec::new(sql.into_owned())))
            }
            AuditedStatement::Spec(spec) => Ok(Normalized::Spec(spec)),
            AuditedStatement::Handle(handle) => Ok(Normalized::Handle(handle)),
        }
    }
}

impl Database {
    /// Normalize, prepare and execute a statement with positional `params`.
    ///
    /// Raw SQL containing `LIMIT` or `OFFSET` is rejected before the backend
    /// is touched; pass an [`AuditedStatementSpec`] with `limit`/`offset`
    /// instead.
    ///
    /// # Errors
    /// Returns `Validation` for a rejected input, `Database` if preparing or
    /// executing fails, and `Unavailable` after a failed connect.
    pub async fn execute_audited<'a>(
        &mut self,
        statement: impl Into<AuditedStatement<'a>>,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlPortableError> {
        let normalized = statement.into().normalize().inspect_err(|e| {
            tracing::warn!(error = %e, "statement rejected");
        })?;

        match normalized {
            Normalized::Spec(spec) => {
                let handle = self.prepare(&spec.sql, spec.limit, spec.offset).await?;
                self.execute(&handle, params).await
            }
            Normalized::Handle(handle) => self.execute(handle, params).await,
        }
    }

    /// Execute a prepared statement with positional `params`.
    ///
    /// # Errors
    /// Returns `Validation` if the handle belongs to another dialect, and
    /// `Database` with the decoded backend detail if execution fails.
    pub async fn execute(
        &mut self,
        handle: &StatementHandle,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlPortableError> {
        let profile = self.ensure_connected().await?;
        if handle.dialect() != profile.dialect() {
            return Err(ValidationError::ForeignStatement {
                expected: profile.dialect(),
                found: handle.dialect(),
            }
            .into());
        }

        let conn = self.live_connection()?;
        conn.run(handle, params).await.map_err(|e| {
            translator::execute_failure("Could not execute statement", &e, handle.sql()).into()
        })
    }
}
