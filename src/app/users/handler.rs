//! 用户请求处理器

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, OriginalUri, State},
    http::Method,
    response::{IntoResponse, Response},
};

use super::{router::Route, service::UserService, store::UserStore};
use crate::core::error::CoreError;

#[derive(Clone, Default)]
pub struct AppState {
    pub user_service: UserService,
}

impl AppState {
    pub fn new(store: Arc<UserStore>) -> Self {
        Self {
            user_service: UserService::new(store),
        }
    }
}

/// Single entry point for every request; the route table lives in
/// [`Route::resolve`].
pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let service = &state.user_service;

    let result = match Route::resolve(&method, target) {
        Route::ListUsers => service.list_users().map(IntoResponse::into_response),
        Route::GetUser(id) => service.get_user(id).map(IntoResponse::into_response),
        Route::CreateUser => read_body(body)
            .and_then(|body| service.create_user(&body))
            .map(IntoResponse::into_response),
        Route::UpdateUser(id) => read_body(body)
            .and_then(|body| service.update_user(id, &body))
            .map(IntoResponse::into_response),
        Route::DeleteUser(id) => service.delete_user(id).map(IntoResponse::into_response),
        Route::NotFound => Err(CoreError::NotFound(format!("API not found at {}", target))),
    };

    match result {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

fn read_body(body: Result<Bytes, BytesRejection>) -> Result<Bytes, CoreError> {
    body.map_err(|e| CoreError::InternalServerError(format!("cannot read request body: {}", e)))
}
