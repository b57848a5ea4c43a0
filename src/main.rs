//! Path matcher command-line tool.
//!
//! ```text
//! path-matcher check --config routes.toml
//! path-matcher match --config routes.toml GET '/v1/shelves/1/books/2?view=full'
//! path-matcher watch --config routes.toml < requests.txt
//! ```
//!
//! `watch` hot-reloads the route file and answers one `METHOD PATH` line
//! from stdin at a time, printing one JSON object per line.

use std::path::PathBuf;
use std::sync::Arc;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};

use path_matcher::config::loader::load_config;
use path_matcher::config::watcher::ConfigWatcher;
use path_matcher::observability::logging::init_logging;
use path_matcher::routing::{RouteTable, SharedRouteTable};

#[derive(Parser)]
#[command(name = "path-matcher")]
#[command(about = "Compile API path templates and match requests against them", long_about = None)]
struct Cli {
    /// Route file (TOML).
    #[arg(short, long, global = true, default_value = "routes.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the route file and compile every template
    Check,
    /// Match one request
    Match {
        /// HTTP method
        method: String,
        /// Request path, optionally with a query string
        path: String,
    },
    /// Watch the route file and match requests read from stdin
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    init_logging(&config.observability.log_level);
    let table = RouteTable::from_config(&config)?;

    match cli.command {
        Commands::Check => {
            println!("{}: {} route(s) OK", cli.config.display(), table.len());
        }
        Commands::Match { method, path } => {
            println!("{}", serde_json::to_string_pretty(&match_json(&table, &method, &path))?);
        }
        Commands::Watch => watch(cli.config, table).await?,
    }

    Ok(())
}

async fn watch(path: PathBuf, table: RouteTable) -> Result<(), Box<dyn std::error::Error>> {
    let shared = Arc::new(SharedRouteTable::new(table));

    let (watcher, mut updates) = ConfigWatcher::new(&path);
    let _watcher = watcher.run()?;

    let reload = shared.clone();
    tokio::spawn(async move {
        while let Some(config) = updates.recv().await {
            // Errors are logged by reload_from; the old table stays active.
            let _ = reload.reload_from(&config);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((method, request)) = line.split_once(char::is_whitespace) else {
            eprintln!("expected `METHOD PATH`, got `{}`", line);
            continue;
        };
        let snapshot = shared.load();
        println!("{}", match_json(&snapshot, method, request.trim()));
    }

    tracing::info!("stdin closed, stopping watcher");
    Ok(())
}

fn match_json(table: &RouteTable, method: &str, path: &str) -> Value {
    match table.lookup(method, path) {
        Some(found) => json!({
            "method": method,
            "path": path,
            "operation": found.operation,
            "bindings": found.bindings,
            "query_parameters": found.query_parameters(),
            "body": found.body_field_path,
        }),
        None => json!({
            "method": method,
            "path": path,
            "operation": Value::Null,
        }),
    }
}
