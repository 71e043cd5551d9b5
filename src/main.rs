//! `kullect` - prices Kubernetes resource usage for a host stream pipeline
//!
//! The host launches this binary as a stream agent and talks to it over
//! stdin/stdout. Each usage point it sends comes back carrying
//! `cpu_cost` and `memory_cost`.

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use tokio::io::BufReader;

use crate::cli::Cli;
use kullect_core::logger::{self, AgentLogger};
use kullect_core::{serve, CostAgent, JsonLinesSink, JsonLinesSource, PumpConfig};

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut agent_logger = AgentLogger::new(cli.log_level.into());
    if let Some(path) = &cli.log_file {
        agent_logger = agent_logger
            .with_file(path)
            .context("Failed to open log file")?;
    }
    logger::init(agent_logger).context("Failed to install logger")?;

    info!("Starting agent v{}", env!("CARGO_PKG_VERSION"));

    let source = JsonLinesSource::new(BufReader::new(tokio::io::stdin()));
    let sink = JsonLinesSink::new(tokio::io::stdout());
    let config = PumpConfig {
        queue_capacity: cli.queue_capacity,
    };

    let mut agent = CostAgent::new();
    let result = serve(source, sink, &mut agent, config).await;

    let outcome = match result {
        Ok(summary) => {
            info!(
                "Agent exited ({:?}) after {} points",
                summary.exit,
                agent.points_processed()
            );
            Ok(())
        }
        Err(err) => {
            if err.is_disconnect() {
                warn!("Host hung up: {}", err);
            } else {
                error!("Agent terminated: {}", err);
            }
            Err(err).context("Host channel failed")
        }
    };
    log::logger().flush();
    outcome
}
