//! 日志基础设施

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub struct Logger;

impl Logger {
    /// `RUST_LOG` wins over the configured level.
    pub fn init(level: &str) -> anyhow::Result<()> {
        let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_ansi(true))
            .try_init()?;

        Ok(())
    }
}
