//! 基础设施层：配置、日志、HTTP 服务

pub mod config;
pub mod logger;
pub mod server;
