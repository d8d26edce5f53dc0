use std::fmt::Write as _;
use std::time::Duration;

use tokio_postgres::NoTls;
use tokio_postgres::error::SqlState;
use tracing::{info, warn};

use crate::error::DataSourceError;

use super::poll::PollPolicy;
use super::session::PgSession;

pub const DEFAULT_PORT: u16 = 5432;

/// Connection settings for a [`PgDataSource`](super::PgDataSource).
///
/// `host` is either `host` or `host:port`; IPv6 addresses with a port are written
/// `[::1]:5433`. A host starting with `/` is a Unix socket directory, optionally followed by
/// `:port` to pick the socket file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceConfig {
    pub dbname: String,
    pub host: String,
    pub user: String,
    pub password: String,
    pub connect_timeout: Option<Duration>,
    pub poll: PollPolicy,
}

impl DataSourceConfig {
    pub fn new(
        dbname: impl Into<String>,
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            dbname: dbname.into(),
            host: host.into(),
            user: user.into(),
            password: password.into(),
            connect_timeout: None,
            poll: PollPolicy::default(),
        }
    }

    /// Read `PGDATABASE`, `PGHOST`, `PGPORT`, `PGUSER` and `PGPASSWORD`.
    ///
    /// `PGHOST` defaults to `localhost` and `PGPASSWORD` to empty.
    ///
    /// # Errors
    /// Returns `DataSourceError::Config` if `PGDATABASE` or `PGUSER` is unset.
    pub fn from_env() -> Result<Self, DataSourceError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_vars<F>(lookup: F) -> Result<Self, DataSourceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| DataSourceError::Config(format!("{key} is not set")))
        };
        let dbname = required("PGDATABASE")?;
        let user = required("PGUSER")?;
        let mut host = lookup("PGHOST")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "localhost".to_string());
        if let Some(port) = lookup("PGPORT").filter(|v| !v.is_empty()) {
            // socket directories take a trailing `:port` too, see `host_and_port`
            host = if host.contains(':') && !host.starts_with('[') && !host.starts_with('/') {
                format!("[{host}]:{port}")
            } else {
                format!("{host}:{port}")
            };
        }
        let password = lookup("PGPASSWORD").unwrap_or_default();
        Ok(Self::new(dbname, host, user, password))
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Split `host` into host name and port.
    ///
    /// # Errors
    /// Returns `DataSourceError::InvalidHost` for an empty host, an unterminated `[`, or a
    /// port that is not a number in `1..=65535`.
    pub fn host_and_port(&self) -> Result<(String, u16), DataSourceError> {
        let text = self.host.trim();
        let invalid = || DataSourceError::InvalidHost(self.host.clone());
        if text.is_empty() {
            return Err(invalid());
        }

        let (host, port) = if let Some(rest) = text.strip_prefix('[') {
            let (host, after) = rest.split_once(']').ok_or_else(invalid)?;
            match after {
                "" => (host, None),
                _ => (host, Some(after.strip_prefix(':').ok_or_else(invalid)?)),
            }
        } else if text.starts_with('/') {
            match text.rsplit_once(':') {
                Some((dir, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
                    (dir, Some(port))
                }
                _ => (text, None),
            }
        } else {
            match text.matches(':').count() {
                0 => (text, None),
                1 => text
                    .split_once(':')
                    .map(|(host, port)| (host, Some(port)))
                    .ok_or_else(invalid)?,
                // bare IPv6 address
                _ => (text, None),
            }
        };

        if host.is_empty() {
            return Err(invalid());
        }
        let port = match port {
            None => DEFAULT_PORT,
            Some(port) => port
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(invalid)?,
        };
        Ok((host.to_string(), port))
    }

    /// Check that every field needed to connect is present and well formed.
    ///
    /// # Errors
    /// Returns `DataSourceError::Config` for a missing database or user name and
    /// `DataSourceError::InvalidHost` for a malformed host.
    pub fn validate(&self) -> Result<(), DataSourceError> {
        if self.dbname.trim().is_empty() {
            return Err(DataSourceError::Config("dbname is required".to_string()));
        }
        if self.user.trim().is_empty() {
            return Err(DataSourceError::Config("user is required".to_string()));
        }
        self.host_and_port().map(|_| ())
    }

    /// libpq key/value connection string with every value quoted.
    ///
    /// # Errors
    /// See [`DataSourceConfig::validate`].
    pub fn connection_string(&self) -> Result<String, DataSourceError> {
        self.validate()?;
        let (host, port) = self.host_and_port()?;
        let mut out = format!(
            "host={} port={port} dbname={} user={} password={}",
            quote_conninfo(&host),
            quote_conninfo(&self.dbname),
            quote_conninfo(&self.user),
            quote_conninfo(&self.password),
        );
        if let Some(timeout) = self.connect_timeout {
            let _ = write!(out, " connect_timeout={}", timeout.as_secs().max(1));
        }
        Ok(out)
    }

    /// # Errors
    /// See [`DataSourceConfig::validate`]; `Config` if the driver rejects the settings.
    pub fn to_tokio_config(&self) -> Result<tokio_postgres::Config, DataSourceError> {
        self.connection_string()?
            .parse()
            .map_err(|e| DataSourceError::Config(format!("invalid connection settings: {e}")))
    }
}

fn quote_conninfo(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        if ch == '\'' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}

/// Open one session to the configured server.
///
/// # Errors
/// `UnknownHost` when the host name does not resolve, `Auth` for rejected credentials,
/// `UnknownSchema` for a missing database, `Connection` for anything else.
pub(crate) async fn connect_session(config: &DataSourceConfig) -> Result<PgSession, DataSourceError> {
    let pg_config = config.to_tokio_config()?;
    let (host, port) = config.host_and_port()?;

    if !host.starts_with('/') {
        let resolved = tokio::net::lookup_host((host.as_str(), port))
            .await
            .map_err(|e| DataSourceError::UnknownHost(format!("{host}: {e}")))?
            .next()
            .is_some();
        if !resolved {
            return Err(DataSourceError::UnknownHost(host));
        }
    }

    let (client, connection) = pg_config
        .connect(NoTls)
        .await
        .map_err(classify_connect_error)?;
    let connection_task = tokio::spawn(async move {
        if let Err(e) = connection.await {
            warn!(error = %e, "postgres connection closed with error");
        }
    });

    info!(%host, port, dbname = %config.dbname, "connected to postgres");
    Ok(PgSession::new(client, connection_task))
}

fn classify_connect_error(err: tokio_postgres::Error) -> DataSourceError {
    let Some(db) = err.as_db_error() else {
        return DataSourceError::Connection(err.to_string());
    };
    let message = db.message().to_string();
    let code = db.code();
    if *code == SqlState::INVALID_PASSWORD || *code == SqlState::INVALID_AUTHORIZATION_SPECIFICATION {
        DataSourceError::Auth(message)
    } else if *code == SqlState::INVALID_CATALOG_NAME {
        DataSourceError::UnknownSchema(message)
    } else {
        DataSourceError::Connection(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn with_host(host: &str) -> DataSourceConfig {
        DataSourceConfig::new("app", host, "alice", "secret")
    }

    #[test]
    fn host_defaults_to_standard_port() {
        assert_eq!(
            with_host("db.internal").host_and_port().unwrap(),
            ("db.internal".to_string(), 5432)
        );
        assert_eq!(
            with_host("db.internal:6543").host_and_port().unwrap(),
            ("db.internal".to_string(), 6543)
        );
    }

    #[test]
    fn ipv6_hosts() {
        assert_eq!(
            with_host("::1").host_and_port().unwrap(),
            ("::1".to_string(), 5432)
        );
        assert_eq!(
            with_host("[::1]:5433").host_and_port().unwrap(),
            ("::1".to_string(), 5433)
        );
        assert_eq!(
            with_host("[fe80::1]").host_and_port().unwrap(),
            ("fe80::1".to_string(), 5432)
        );
    }

    #[test]
    fn socket_directories_keep_their_path() {
        assert_eq!(
            with_host("/var/run/postgresql").host_and_port().unwrap(),
            ("/var/run/postgresql".to_string(), 5432)
        );
        assert_eq!(
            with_host("/var/run/postgresql:5433").host_and_port().unwrap(),
            ("/var/run/postgresql".to_string(), 5433)
        );
        assert_eq!(
            with_host("/tmp/a:b").host_and_port().unwrap(),
            ("/tmp/a:b".to_string(), 5432)
        );
    }

    #[test]
    fn socket_directory_from_env_keeps_its_port() {
        let cfg = DataSourceConfig::from_vars(|key| match key {
            "PGDATABASE" => Some("app".into()),
            "PGUSER" => Some("alice".into()),
            "PGHOST" => Some("/var/run/postgresql".into()),
            "PGPORT" => Some("5433".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(
            cfg.host_and_port().unwrap(),
            ("/var/run/postgresql".to_string(), 5433)
        );
        let parsed = cfg.to_tokio_config().unwrap();
        assert_eq!(parsed.get_ports(), &[5433]);
    }

    #[test]
    fn malformed_hosts_are_rejected() {
        for bad in ["", "  ", ":5432", "db:", "db:port", "db:0", "db:70000", "[::1", "[::1]5432"] {
            assert!(
                matches!(with_host(bad).host_and_port(), Err(DataSourceError::InvalidHost(_))),
                "host {bad:?}"
            );
        }
    }

    #[test]
    fn missing_names_are_config_errors() {
        let cfg = DataSourceConfig::new("", "localhost", "alice", "");
        assert!(matches!(cfg.validate(), Err(DataSourceError::Config(_))));
        let cfg = DataSourceConfig::new("app", "localhost", "", "");
        assert!(matches!(cfg.validate(), Err(DataSourceError::Config(_))));
    }

    #[test]
    fn connection_string_quotes_every_value() {
        let cfg = DataSourceConfig::new("my db", "localhost:5433", "o'neil", r"p\w d")
            .with_connect_timeout(Duration::from_secs(3));
        assert_eq!(
            cfg.connection_string().unwrap(),
            r"host='localhost' port=5433 dbname='my db' user='o\'neil' password='p\\w d' connect_timeout=3"
        );
        let parsed = cfg.to_tokio_config().unwrap();
        assert_eq!(parsed.get_user(), Some("o'neil"));
        assert_eq!(parsed.get_dbname(), Some("my db"));
        assert_eq!(parsed.get_ports(), &[5433]);
    }

    #[test]
    fn environment_lookup() {
        let vars: HashMap<&str, &str> = [
            ("PGDATABASE", "app"),
            ("PGUSER", "alice"),
            ("PGHOST", "db"),
            ("PGPORT", "6000"),
        ]
        .into_iter()
        .collect();
        let cfg =
            DataSourceConfig::from_vars(|key| vars.get(key).map(ToString::to_string)).unwrap();
        assert_eq!(cfg.host, "db:6000");
        assert_eq!(cfg.password, "");

        let err = DataSourceConfig::from_vars(|_| None).unwrap_err();
        assert!(matches!(err, DataSourceError::Config(msg) if msg.contains("PGDATABASE")));
    }

    #[test]
    fn default_host_is_localhost() {
        let cfg = DataSourceConfig::from_vars(|key| match key {
            "PGDATABASE" => Some("app".into()),
            "PGUSER" => Some("alice".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.host, "localhost");
        assert_eq!(cfg.poll, PollPolicy::default());
    }
}
