//! # 用户服务
//!
//! 内存中的用户 CRUD HTTP 服务：
//! - `app`: 用户模型、存储、校验、处理器与路由表
//! - `core`: 错误、响应与中间件
//! - `infrastructure`: 配置、日志与 HTTP 服务
//! - `cluster`: 可选的多进程模式（每个 worker 独立存储）

pub mod app;
pub mod cluster;
pub mod core;
pub mod infrastructure;

pub use app::users::{AppState, User, UserStore};
pub use infrastructure::config::{Config, ConfigError};
pub use infrastructure::server::build_app;
