use super::super::SHARED_RUNTIME;
use crate::postgres::{DataSourceConfig, PgDataSource};

use postgresql_embedded::PostgreSQL;

/// Represents a running embedded `PostgreSQL` instance.
pub struct EmbeddedPostgres {
    pub postgresql: PostgreSQL,
    pub port: u16,
    /// Working connection settings for the created database
    pub config: DataSourceConfig,
}

/// Set up an embedded `PostgreSQL` instance with a fresh database named `dbname`.
///
/// Blocks on the shared test runtime, so call it from synchronous test code.
///
/// # Errors
/// Returns an error if the embedded server cannot be set up or started, if the database cannot
/// be created, or if the post-start connectivity check fails.
pub fn setup_postgres_embedded(
    dbname: &str,
) -> Result<EmbeddedPostgres, Box<dyn std::error::Error>> {
    SHARED_RUNTIME.block_on(async {
        let mut postgresql = PostgreSQL::default();

        // Bundled binaries, so no download on setup
        postgresql.setup().await?;
        postgresql.start().await?;

        let settings = postgresql.settings();
        let port = settings.port;
        let config = DataSourceConfig::new(
            dbname,
            format!("{}:{port}", settings.host),
            settings.username.clone(),
            settings.password.clone(),
        );

        postgresql.create_database(dbname).await?;

        // Quick connection test
        let mut source = PgDataSource::connect(&config).await?;
        source.query("SELECT 1", &[]).await?;
        source.close();
        println!("PostgreSQL started on port {port}, database {dbname}");

        Ok(EmbeddedPostgres {
            postgresql,
            port,
            config,
        })
    })
}

/// Stop a previously started embedded `PostgreSQL` instance.
pub fn stop_postgres_embedded(postgres: EmbeddedPostgres) {
    let EmbeddedPostgres { postgresql, .. } = postgres;
    SHARED_RUNTIME.block_on(async move {
        let _ = postgresql.stop().await;
    });
}
