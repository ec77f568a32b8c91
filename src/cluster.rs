//! 多进程集群
//!
//! The supervisor re-runs the current executable once per worker. Each worker
//! owns its own `UserStore`: a user created through one worker's port is not
//! visible through any other. There is no cross-worker consistency.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use anyhow::Context;
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::infrastructure::config::Config;

// Only for a worker that could not be started at all; exits respawn at once.
const SPAWN_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Everything a worker process needs on its command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSpec {
    pub index: usize,
    pub port: u16,
    pub bind_address: String,
    pub log_level: String,
}

impl WorkerSpec {
    pub fn args(&self) -> Vec<String> {
        vec![
            "--worker".to_string(),
            self.index.to_string(),
            "--port".to_string(),
            self.port.to_string(),
            "--bind".to_string(),
            self.bind_address.clone(),
            "--log-level".to_string(),
            self.log_level.clone(),
        ]
    }
}

/// One spec per worker, listening on `port + index`.
pub fn worker_specs(config: &Config) -> anyhow::Result<Vec<WorkerSpec>> {
    (0..config.cluster.worker_count())
        .map(|index| -> anyhow::Result<WorkerSpec> {
            Ok(WorkerSpec {
                index,
                port: config.worker_port(index)?,
                bind_address: config.server.bind_address.clone(),
                log_level: config.logging.level.clone(),
            })
        })
        .collect()
}

/// The program and leading arguments used to start a worker; the worker's
/// own arguments from [`WorkerSpec::args`] follow.
#[derive(Debug, Clone)]
pub struct Launcher {
    program: PathBuf,
    base_args: Vec<String>,
}

impl Launcher {
    pub fn new(program: impl Into<PathBuf>, base_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            base_args,
        }
    }

    /// Re-runs the current executable.
    pub fn current_exe() -> anyhow::Result<Self> {
        let exe = std::env::current_exe().context("cannot locate current executable")?;
        Ok(Self::new(exe, Vec::new()))
    }

    fn spawn(&self, spec: &WorkerSpec) -> anyhow::Result<Child> {
        Command::new(&self.program)
            .args(&self.base_args)
            .args(spec.args())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| {
                format!(
                    "failed to spawn worker {} ({})",
                    spec.index,
                    self.program.display()
                )
            })
    }
}

pub struct Supervisor {
    launcher: Launcher,
    specs: Vec<WorkerSpec>,
}

impl Supervisor {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::with_launcher(Launcher::current_exe()?, worker_specs(config)?))
    }

    pub fn with_launcher(launcher: Launcher, specs: Vec<WorkerSpec>) -> Self {
        Self { launcher, specs }
    }

    /// Runs until Ctrl-C, then kills every worker.
    pub async fn run(self) -> anyhow::Result<()> {
        info!(
            "Primary {} is running, starting {} workers",
            std::process::id(),
            self.specs.len()
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut slots = JoinSet::new();
        for spec in self.specs {
            slots.spawn(supervise(self.launcher.clone(), spec, shutdown_rx.clone()));
        }

        // Slots only return on shutdown, so an early join is a panic.
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    warn!("failed to listen for ctrl-c: {}", e);
                }
                info!("Shutting down workers");
            }
            Some(res) = slots.join_next() => {
                error!("worker slot stopped unexpectedly: {:?}", res);
            }
        }

        let _ = shutdown_tx.send(true);
        while let Some(res) = slots.join_next().await {
            if let Err(e) = res {
                error!("worker slot panicked: {}", e);
            }
        }

        info!("Primary {} stopped", std::process::id());
        Ok(())
    }
}

/// Keeps one worker alive for `spec` until shutdown: every exit is followed
/// by an immediate respawn on the same port. Returns how many processes were
/// started.
pub async fn supervise(
    launcher: Launcher,
    spec: WorkerSpec,
    mut shutdown: watch::Receiver<bool>,
) -> usize {
    let mut spawned = 0;

    while !*shutdown.borrow() {
        let mut child = match launcher.spawn(&spec) {
            Ok(child) => child,
            Err(e) => {
                error!("{:#}", e);
                let stopped = tokio::select! {
                    _ = sleep(SPAWN_RETRY_DELAY) => false,
                    _ = shutdown.changed() => true,
                };
                if stopped {
                    break;
                }
                continue;
            }
        };
        spawned += 1;
        info!(
            "Worker {} started (pid {:?}, port {})",
            spec.index,
            child.id(),
            spec.port
        );

        tokio::select! {
            status = child.wait() => {
                if *shutdown.borrow() {
                    break;
                }
                match status {
                    Ok(status) => log_exit(&spec, status),
                    Err(e) => error!("failed to wait for worker {}: {}", spec.index, e),
                }
            }
            _ = shutdown.changed() => {
                child.kill().await.ok();
                break;
            }
        }
    }

    info!("Worker {} stopped", spec.index);
    spawned
}

fn log_exit(spec: &WorkerSpec, status: ExitStatus) {
    warn!(
        "Worker {} on port {} exited ({}), starting a replacement",
        spec.index, spec.port, status
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_specs_use_consecutive_ports() {
        let mut config = Config::default();
        config.server.port = 5000;
        config.cluster.enabled = true;
        config.cluster.workers = 3;

        let ports: Vec<u16> = worker_specs(&config)
            .unwrap()
            .into_iter()
            .map(|spec| spec.port)
            .collect();
        assert_eq!(ports, vec![5000, 5001, 5002]);
    }

    #[test]
    fn test_worker_args() {
        let spec = WorkerSpec {
            index: 2,
            port: 3002,
            bind_address: "127.0.0.1".to_string(),
            log_level: "debug".to_string(),
        };
        assert_eq!(
            spec.args(),
            vec![
                "--worker", "2", "--port", "3002", "--bind", "127.0.0.1", "--log-level", "debug"
            ]
        );
    }

    #[test]
    fn test_port_overflow_is_rejected() {
        let mut config = Config::default();
        config.server.port = u16::MAX;
        config.cluster.workers = 2;
        assert!(worker_specs(&config).is_err());
    }

    fn spec() -> WorkerSpec {
        WorkerSpec {
            index: 1,
            port: 3001,
            bind_address: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
        }
    }

    /// Each started process appends its arguments to `log`, then exits.
    fn recording_launcher(log: &std::path::Path) -> Launcher {
        Launcher::new(
            "sh",
            vec![
                "-c".to_string(),
                format!("echo \"$@\" >> '{}'", log.display()),
                "worker".to_string(),
            ],
        )
    }

    fn recorded(log: &std::path::Path) -> Vec<String> {
        std::fs::read_to_string(log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_exited_worker_is_replaced_on_same_port() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("spawns.log");
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let slot = tokio::spawn(supervise(recording_launcher(&log), spec(), shutdown_rx));

        tokio::time::timeout(Duration::from_secs(10), async {
            while recorded(&log).len() < 3 {
                sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .unwrap();
        assert!(!slot.is_finished());

        shutdown_tx.send(true).unwrap();
        let spawned = tokio::time::timeout(Duration::from_secs(10), slot)
            .await
            .unwrap()
            .unwrap();

        let lines = recorded(&log);
        assert!(spawned >= 3);
        assert!(lines.len() >= 3 && lines.len() <= spawned);
        let expected = spec().args().join(" ");
        assert!(lines.iter().all(|line| *line == expected));
    }

    #[tokio::test]
    async fn test_spawn_failure_keeps_slot_alive() {
        let launcher = Launcher::new("/nonexistent/user-service-worker", Vec::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let slot = tokio::spawn(supervise(launcher, spec(), shutdown_rx));
        sleep(SPAWN_RETRY_DELAY * 3).await;
        assert!(!slot.is_finished());

        shutdown_tx.send(true).unwrap();
        let spawned = tokio::time::timeout(Duration::from_secs(5), slot)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(spawned, 0);
    }

    #[tokio::test]
    async fn test_no_respawn_after_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("spawns.log");
        let (_shutdown_tx, shutdown_rx) = watch::channel(true);

        let spawned = supervise(recording_launcher(&log), spec(), shutdown_rx).await;
        assert_eq!(spawned, 0);
        assert!(recorded(&log).is_empty());
    }
}
