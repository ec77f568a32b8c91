use std::path::PathBuf;

use clap::Parser;
use tracing::{info, info_span, Instrument};

use user_service::cluster::Supervisor;
use user_service::infrastructure::{config::Config, logger::Logger, server};
use user_service::AppState;

/// In-memory user CRUD service.
#[derive(Parser, Debug)]
#[command(name = "user-service", version)]
struct Cli {
    /// Listening port; in cluster mode, the port of worker 0.
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Bind address.
    #[arg(long)]
    bind: Option<String>,

    /// Run one independent worker process per CPU (or per `--workers`).
    #[arg(long, default_value_t = false)]
    cluster: bool,

    /// Number of workers in cluster mode.
    #[arg(long)]
    workers: Option<usize>,

    /// Config file; defaults to `config.toml` or `config/config.toml` when present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Set by the supervisor when it starts a worker.
    #[arg(long, hide = true)]
    worker: Option<usize>,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(bind) = &self.bind {
            config.server.bind_address = bind.clone();
        }
        if self.cluster {
            config.cluster.enabled = true;
        }
        if let Some(workers) = self.workers {
            config.cluster.workers = workers;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.worker.is_some() {
            config.cluster.enabled = false;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;

    Logger::init(&config.logging.level)?;

    if config.cluster.enabled {
        return Supervisor::new(&config)?.run().await;
    }

    let state = AppState::default();
    match cli.worker {
        Some(index) => {
            let span = info_span!("worker", index, pid = std::process::id());
            async {
                info!("Worker started");
                server::serve(&config.server.bind_address, config.server.port, state).await
            }
            .instrument(span)
            .await
        }
        None => server::serve(&config.server.bind_address, config.server.port, state).await,
    }
}
