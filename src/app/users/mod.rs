//! 用户资源：模型、存储、校验、服务与路由

pub mod handler;
pub mod model;
pub mod router;
pub mod service;
pub mod store;
pub mod validator;

pub use handler::{dispatch, AppState};
pub use model::User;
pub use store::UserStore;
