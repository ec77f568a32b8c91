//! 配置基础设施

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_PATHS: [&str; 2] = ["config.toml", "./config/config.toml"];
const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// 服务配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP 服务配置
    pub server: ServerConfig,
    /// 多进程配置
    pub cluster: ClusterConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 绑定地址
    pub bind_address: String,
    /// HTTP 服务端口；集群模式下为第一个 worker 的端口
    pub port: u16,
}

/// 多进程配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub enabled: bool,
    /// worker 数量，0 表示 CPU 数
    pub workers: usize,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别 (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ClusterConfig {
    pub fn worker_count(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }
}

impl Config {
    /// 从配置文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::FileRead(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Explicit path, then the default locations, then built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        match CONFIG_PATHS.iter().find(|path| Path::new(path).exists()) {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Port worker `index` listens on.
    pub fn worker_port(&self, index: usize) -> Result<u16, ConfigError> {
        u16::try_from(index)
            .ok()
            .and_then(|offset| self.server.port.checked_add(offset))
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "worker {} port overflows {} + {}",
                    index, self.server.port, index
                ))
            })
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind_address.is_empty() {
            return Err(ConfigError::Validation("bind address must not be empty".to_string()));
        }

        if !VALID_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "invalid log level: {}, expected one of {:?}",
                self.logging.level, VALID_LEVELS
            )));
        }

        if self.cluster.enabled {
            let workers = self.cluster.worker_count();
            if workers == 0 {
                return Err(ConfigError::Validation("cluster needs at least one worker".to_string()));
            }
            self.worker_port(workers - 1)?;
        }

        Ok(())
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(String),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Validation(String),
}
