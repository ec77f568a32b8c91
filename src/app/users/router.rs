//! 请求路由表
//!
//! Matching works on the raw request target (path plus query). There is no
//! trailing-slash normalization and no query-string parsing.

use axum::http::Method;

pub const USERS_PATH: &str = "/api/users";
const USERS_PREFIX: &str = "/api/users/";

/// Where a request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<'a> {
    ListUsers,
    GetUser(&'a str),
    CreateUser,
    UpdateUser(&'a str),
    DeleteUser(&'a str),
    NotFound,
}

impl<'a> Route<'a> {
    pub fn resolve(method: &Method, target: &'a str) -> Self {
        match *method {
            Method::GET if target == USERS_PATH => Route::ListUsers,
            Method::GET if target.starts_with(USERS_PREFIX) => Route::GetUser(user_id(target)),
            Method::POST if target == USERS_PATH => Route::CreateUser,
            Method::PUT if target.starts_with(USERS_PREFIX) => Route::UpdateUser(user_id(target)),
            Method::DELETE if target.starts_with(USERS_PREFIX) => {
                Route::DeleteUser(user_id(target))
            }
            _ => Route::NotFound,
        }
    }
}

/// The text between the third and fourth slash.
fn user_id(target: &str) -> &str {
    target.split('/').nth(3).unwrap_or_default()
}
