//! Command line startup: option parsing, logging, seeding, serving.

use std::io::IsTerminal;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::axum_factory;
use crate::configuration::Configuration;
use crate::services::ExecutionService;
use crate::storage::MemoryStore;
use crate::storage::seed;

/// Options for the router
#[derive(Parser, Debug)]
#[command(name = "folio-router", about = "Folio GraphQL router")]
struct Opt {
    /// Log level (off|error|warn|info|debug|trace).
    #[arg(long = "log", default_value = "info", env = "FOLIO_LOG")]
    log_level: String,

    /// Configuration file location.
    #[arg(short, long = "config", env = "FOLIO_CONFIG_PATH")]
    configuration_path: Option<PathBuf>,

    /// Credential signing secret; overrides the configuration file.
    #[arg(long = "jwt-secret", env = "FOLIO_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// The socket address and port to listen on; overrides the configuration file.
    #[arg(long, env = "FOLIO_LISTEN")]
    listen: Option<SocketAddr>,
}

/// Process entry point, exposed as `folio_router::main`.
pub fn main() -> anyhow::Result<()> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(nb) = std::env::var("FOLIO_NUM_CORES")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
    {
        builder.worker_threads(nb);
    }
    let runtime = builder.build()?;
    runtime.block_on(rt_main())
}

async fn rt_main() -> anyhow::Result<()> {
    let opt = Opt::parse();

    let env_filter = std::env::var("RUST_LOG").ok().unwrap_or(opt.log_level);
    let builder = tracing_subscriber::fmt::fmt()
        .with_env_filter(EnvFilter::try_new(&env_filter).context("could not parse log configuration")?);
    if std::io::stdout().is_terminal() {
        builder.init();
    } else {
        builder.json().init();
    }

    let mut configuration = match &opt.configuration_path {
        Some(path) => Configuration::from_file(path)?,
        None => Configuration::default(),
    };
    if let Some(secret) = opt.jwt_secret {
        configuration.auth.secret = Some(secret);
    }
    if let Some(listen) = opt.listen {
        configuration.server.listen = listen;
    }

    let store = Arc::new(MemoryStore::new());
    // clear existing data, then seed
    seed::reset_and_seed(store.as_ref()).await?;

    let listen = configuration.server.listen;
    let service = ExecutionService::new(Arc::new(configuration), store)?;
    axum_factory::serve(listen, service).await?;
    Ok(())
}
