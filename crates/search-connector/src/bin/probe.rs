//! Search connector probe.
//!
//! Checks cluster connectivity and resolves physical index names.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SEARCH_CONNECTOR_URL` | http://localhost:9200 | Cluster url |
//! | `SEARCH_CONNECTOR_DATABASE` | default | Database name for the index prefix |
//! | `SEARCH_CONNECTOR_LOG_LEVEL` | info | Log level |

use clap::{Parser, Subcommand};
use helios_search_connector::client::SearchEngineClient;
use helios_search_connector::config::{ClusterConfig, ConnectorConfig, ElasticsearchAuth};
use helios_search_connector::naming::IndexNaming;
use helios_search_connector::{ElasticsearchClient, IndexBackend};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "search-connector-probe")]
#[command(about = "Probe an Elasticsearch cluster used by the search connector")]
struct ProbeArgs {
    /// Cluster url.
    #[arg(long, env = "SEARCH_CONNECTOR_URL", default_value = "http://localhost:9200")]
    url: String,

    /// Database name used in the default index prefix.
    #[arg(long, env = "SEARCH_CONNECTOR_DATABASE", default_value = "default")]
    database: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "SEARCH_CONNECTOR_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Request timeout in seconds.
    #[arg(long, default_value = "3")]
    timeout: u64,

    /// Basic auth username.
    #[arg(long, requires = "password")]
    username: Option<String>,

    /// Basic auth password.
    #[arg(long, env = "SEARCH_CONNECTOR_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check availability and print the engine version.
    Ping,
    /// Print the physical index name of a logical index id.
    IndexName {
        /// Logical index id.
        id: String,
    },
}

impl ProbeArgs {
    fn connector_config(&self) -> ConnectorConfig {
        let auth = match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(ElasticsearchAuth::Basic {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        };

        ConnectorConfig {
            cluster: ClusterConfig {
                url: self.url.clone(),
                timeout_secs: self.timeout,
                auth,
                ..Default::default()
            },
            database: self.database.clone(),
            ..Default::default()
        }
    }
}

fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "helios_search_connector={},search_connector_probe={}",
            level, level
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ProbeArgs::parse();
    init_logging(&args.log_level);

    let config = args.connector_config();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    match &args.command {
        Command::Ping => {
            let client = Arc::new(ElasticsearchClient::new(&config.cluster)?);
            let backend = IndexBackend::new(client.clone(), config)?;

            if !backend.is_available().await {
                anyhow::bail!("cluster at {} is not available", client.url());
            }
            let version = client.version().await?;
            info!(url = %client.url(), version = %version, "Cluster is available");
            println!("{}", version);
        }
        Command::IndexName { id } => {
            println!("{}", IndexNaming::from_config(&config).physical_name(id));
        }
    }

    Ok(())
}
