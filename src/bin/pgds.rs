use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use pg_datasource::prelude::*;
use tracing::Level;

#[derive(Debug, Parser)]
#[command(author, version, about = "Run SQL against PostgreSQL through pg-datasource")]
struct Args {
    #[arg(long, env = "PGDATABASE")]
    dbname: String,
    /// `host` or `host:port`
    #[arg(long, env = "PGHOST", default_value = "localhost")]
    host: String,
    #[arg(long, env = "PGUSER")]
    user: String,
    #[arg(long, env = "PGPASSWORD", default_value = "", hide_env_values = true)]
    password: String,
    /// Busy-poll interval in milliseconds
    #[arg(long, default_value_t = 10)]
    poll_ms: u64,
    /// Give up on a statement after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a statement and print its rows as JSON lines
    Query {
        sql: String,
        /// Positional parameter; `null`, `true`, `false` and numbers are typed, anything else is text
        #[arg(long = "param")]
        params: Vec<String>,
    },
    /// Run a statement and print the number of affected rows
    Execute {
        sql: String,
        #[arg(long = "param")]
        params: Vec<String>,
    },
}

fn parse_param(raw: &str) -> Value {
    match raw {
        "null" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        // `NaN`, `inf` and friends stay text
        _ if !raw.bytes().any(|b| b.is_ascii_digit()) => Value::Text(raw.to_string()),
        _ => raw
            .parse::<i64>()
            .map(Value::Int)
            .or_else(|_| raw.parse::<f64>().map(Value::Float))
            .unwrap_or_else(|_| Value::Text(raw.to_string())),
    }
}

fn config_from_args(args: &Args) -> DataSourceConfig {
    let mut poll = PollPolicy::default().with_interval(Duration::from_millis(args.poll_ms));
    if let Some(ms) = args.timeout_ms {
        poll = poll.with_deadline(Duration::from_millis(ms));
    }
    DataSourceConfig::new(&args.dbname, &args.host, &args.user, &args.password)
        .with_poll_policy(poll)
}

async fn run(args: Args) -> Result<(), DataSourceError> {
    let config = config_from_args(&args);
    let mut source = PgDataSource::connect(&config).await?;

    match args.command {
        Command::Query { sql, params } => {
            let params: Vec<Value> = params.iter().map(|p| parse_param(p)).collect();
            let rows = source.statement(&sql).params(&params).query().await?;
            for row in &rows {
                let line = serde_json::to_string(row)
                    .map_err(|e| DataSourceError::Data(format!("cannot print row: {e}")))?;
                println!("{line}");
            }
        }
        Command::Execute { sql, params } => {
            let params: Vec<Value> = params.iter().map(|p| parse_param(p)).collect();
            let affected = source.statement(&sql).params(&params).execute().await?;
            println!("{affected}");
        }
    }

    source.close();
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("pgds: {err}");
            ExitCode::FAILURE
        }
    }
}
