use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dialect::DialectProfile;
use crate::error::SqlPortableError;
use crate::types::Dialect;

/// Read-only source of configuration values, keyed by the names used in
/// [`DbConfig`] (`dbtype`, `dbhost`, ...).
pub trait ConfigProvider {
    fn get_value(&self, key: &str) -> Option<String>;
}

impl ConfigProvider for HashMap<String, String> {
    fn get_value(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Database settings as supplied by the hosting application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Raw database type; parsed into a [`Dialect`] at connect time.
    pub dbtype: String,
    /// `host` or `host:port`.
    pub dbhost: String,
    pub dbname: String,
    pub dbuser: String,
    pub dbpassword: String,
    pub dbtableprefix: String,
    /// Directory holding the embedded database file.
    pub datadirectory: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            dbtype: "sqlite".to_string(),
            dbhost: String::new(),
            dbname: "owncloud".to_string(),
            dbuser: String::new(),
            dbpassword: String::new(),
            dbtableprefix: "oc_".to_string(),
            datadirectory: PathBuf::from("data"),
        }
    }
}

impl DbConfig {
    #[must_use]
    pub fn builder(dialect: Dialect) -> DbConfigBuilder {
        DbConfigBuilder::new(dialect)
    }

    /// Read every key from `provider`, falling back to the defaults.
    pub fn from_provider(provider: &impl ConfigProvider) -> Self {
        let defaults = Self::default();
        let value = |key: &str, default: String| provider.get_value(key).unwrap_or(default);
        Self {
            dbtype: value("dbtype", defaults.dbtype),
            dbhost: value("dbhost", defaults.dbhost),
            dbname: value("dbname", defaults.dbname),
            dbuser: value("dbuser", defaults.dbuser),
            dbpassword: value("dbpassword", defaults.dbpassword),
            dbtableprefix: value("dbtableprefix", defaults.dbtableprefix),
            datadirectory: provider
                .get_value("datadirectory")
                .map_or(defaults.datadirectory, PathBuf::from),
        }
    }

    /// Parse a JSON object; missing keys take their defaults.
    ///
    /// # Errors
    /// Returns `SqlPortableError::Config` if the JSON is malformed.
    pub fn from_json_str(json: &str) -> Result<Self, SqlPortableError> {
        serde_json::from_str(json)
            .map_err(|e| SqlPortableError::Config(format!("invalid database config: {e}")))
    }
}

/// Fluent builder for [`DbConfig`].
#[derive(Debug, Clone)]
pub struct DbConfigBuilder {
    config: DbConfig,
}

impl DbConfigBuilder {
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self {
            config: DbConfig {
                dbtype: dialect.as_str().to_string(),
                ..DbConfig::default()
            },
        }
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.dbhost = host.into();
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.dbname = name.into();
        self
    }

    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.config.dbuser = user.into();
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.dbpassword = password.into();
        self
    }

    #[must_use]
    pub fn table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.dbtableprefix = prefix.into();
        self
    }

    #[must_use]
    pub fn data_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.datadirectory = dir.into();
        self
    }

    #[must_use]
    pub fn finish(self) -> DbConfig {
        self.config
    }
}

/// Everything a driver needs to open a connection, derived from [`DbConfig`].
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParameters {
    pub dialect: Dialect,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub charset: Option<&'static str>,
    /// Database file, embedded dialect only.
    pub path: Option<PathBuf>,
    pub identifier_quotes: (char, char),
    pub table_prefix: String,
}

impl std::fmt::Debug for ConnectionParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionParameters")
            .field("dialect", &self.dialect)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("charset", &self.charset)
            .field("path", &self.path)
            .field("table_prefix", &self.table_prefix)
            .finish_non_exhaustive()
    }
}

impl ConnectionParameters {
    /// Derive the parameters for `profile`'s dialect.
    ///
    /// # Errors
    /// Returns `SqlPortableError::Config` if the port in `dbhost` is not a number.
    pub fn build(
        config: &DbConfig,
        profile: &dyn DialectProfile,
    ) -> Result<Self, SqlPortableError> {
        let dialect = profile.dialect();
        let (host, port) = split_host_port(&config.dbhost)?;

        let (host, port, path) = match dialect {
            Dialect::Sqlite => (
                None,
                None,
                Some(config.datadirectory.join(format!("{}.db", config.dbname))),
            ),
            // Oracle only passes an explicit port through.
            Dialect::Oracle => (Some(host), port, None),
            Dialect::Mysql | Dialect::Postgres | Dialect::Mssql => {
                (Some(host), port.or(profile.default_port()), None)
            }
        };

        Ok(Self {
            dialect,
            host,
            port,
            dbname: config.dbname.clone(),
            user: config.dbuser.clone(),
            password: config.dbpassword.clone(),
            charset: profile.charset(),
            path,
            identifier_quotes: profile.identifier_quotes(),
            table_prefix: config.dbtableprefix.clone(),
        })
    }

    /// Host name, or `localhost` when none was configured.
    #[must_use]
    pub fn host_or_default(&self) -> &str {
        match self.host.as_deref() {
            Some(host) if !host.is_empty() => host,
            _ => "localhost",
        }
    }
}

// A colon at position 0 is not a separator.
fn split_host_port(dbhost: &str) -> Result<(String, Option<u16>), SqlPortableError> {
    match dbhost.split_once(':') {
        Some((host, port)) if !host.is_empty() => {
            let port = port.parse::<u16>().map_err(|e| {
                SqlPortableError::Config(format!("invalid port '{port}' in dbhost: {e}"))
            })?;
            Ok((host.to_string(), Some(port)))
        }
        _ => Ok((dbhost.to_string(), None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::profile_for;

    #[test]
    fn sqlite_parameters_point_at_data_directory() {
        let config = DbConfig::builder(Dialect::Sqlite)
            .name("cloud")
            .data_directory("/srv/data")
            .finish();
        let params = ConnectionParameters::build(&config, profile_for(Dialect::Sqlite)).unwrap();
        assert_eq!(params.path, Some(PathBuf::from("/srv/data/cloud.db")));
        assert_eq!(params.host, None);
        assert_eq!(params.charset, None);
        assert_eq!(params.table_prefix, "oc_");
    }

    #[test]
    fn host_port_is_split() {
        let config = DbConfig::builder(Dialect::Mysql).host("db.local:3307").finish();
        let params = ConnectionParameters::build(&config, profile_for(Dialect::Mysql)).unwrap();
        assert_eq!(params.host.as_deref(), Some("db.local"));
        assert_eq!(params.port, Some(3307));
        assert_eq!(params.charset, Some("UTF8"));
        assert_eq!(params.identifier_quotes, ('`', '`'));
    }

    #[test]
    fn default_ports_per_dialect() {
        let config = DbConfig::builder(Dialect::Postgres).host("pg").finish();
        let pg = ConnectionParameters::build(&config, profile_for(Dialect::Postgres)).unwrap();
        assert_eq!(pg.port, Some(5432));
        assert_eq!(pg.charset, None);

        let oci = ConnectionParameters::build(&config, profile_for(Dialect::Oracle)).unwrap();
        assert_eq!(oci.port, None);
        assert_eq!(oci.charset, Some("AL32UTF8"));
    }

    #[test]
    fn bad_port_is_a_config_error() {
        let config = DbConfig::builder(Dialect::Mssql).host("sql:abc").finish();
        assert!(matches!(
            ConnectionParameters::build(&config, profile_for(Dialect::Mssql)),
            Err(SqlPortableError::Config(_))
        ));
    }

    #[test]
    fn provider_and_json_fill_defaults() {
        let mut values = HashMap::new();
        values.insert("dbtype".to_string(), "pgsql".to_string());
        values.insert("dbuser".to_string(), "cloud".to_string());
        let config = DbConfig::from_provider(&values);
        assert_eq!(config.dbtype, "pgsql");
        assert_eq!(config.dbuser, "cloud");
        assert_eq!(config.dbname, "owncloud");
        assert_eq!(config.dbtableprefix, "oc_");

        let json = DbConfig::from_json_str(r#"{"dbtype":"mysql","dbtableprefix":"x_"}"#).unwrap();
        assert_eq!(json.dbtype, "mysql");
        assert_eq!(json.dbtableprefix, "x_");
        assert_eq!(json.datadirectory, PathBuf::from("data"));
        assert!(DbConfig::from_json_str("{").is_err());
    }

    #[test]
    fn debug_hides_password() {
        let config = DbConfig::builder(Dialect::Postgres).password("hunter2").finish();
        let params = ConnectionParameters::build(&config, profile_for(Dialect::Postgres)).unwrap();
        assert!(!format!("{params:?}").contains("hunter2"));
    }
}
