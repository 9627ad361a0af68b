//! Serve command - run the HTTP API
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: configure_server(), start_server()
//! - Level 3: (delegated to league-server crate)

use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use league_server::{run_server, ServerConfig, ServerState};

use crate::config::Context;

#[derive(Args)]
pub struct ServerArgs {
    /// Port number to listen on (default from config, else 8080)
    #[arg(long)]
    pub port: Option<u16>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

pub fn run(ctx: &Context, args: ServerArgs) -> Result<()> {
    let config = configure_server(ctx, &args);
    let state = ServerState::new(ctx.open_store()?)
        .with_alpharank(ctx.config.alpharank.clone())
        .with_scheduler(&ctx.config.scheduler);

    tracing::info!(
        "Serving {} on port {}",
        ctx.config.database.display(),
        config.port
    );

    start_server(config, state)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn configure_server(ctx: &Context, args: &ServerArgs) -> ServerConfig {
    let config = ctx.config.server.clone();
    match args.port {
        Some(port) => config.with_port(port),
        None => config,
    }
}

/// Start the server (blocking)
fn start_server(config: ServerConfig, state: ServerState) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async { run_server(config, Arc::new(state)).await })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileConfig;

    #[test]
    fn test_configure_server_port_flag() {
        let mut file = FileConfig::default();
        file.server.port = 9000;
        let ctx = Context::new(file);

        let config = configure_server(&ctx, &ServerArgs { port: None });
        assert_eq!(config.port, 9000);

        let config = configure_server(&ctx, &ServerArgs { port: Some(8123) });
        assert_eq!(config.port, 8123);
        assert_eq!(config.host, [127, 0, 0, 1]);
    }
}
