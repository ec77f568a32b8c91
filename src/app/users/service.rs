//! 用户业务服务

use std::sync::Arc;

use tracing::{debug, info};

use super::model::{decode_body, NewUser, User, UserPatch};
use super::store::UserStore;
use super::validator::{has_required_fields, is_valid_id};
use crate::core::error::CoreError;
use crate::core::response::{ApiResponse, ListResponse};

pub const INCORRECT_USER_ID: &str = "Incorrect user id";
pub const USER_NOT_FOUND: &str = "User not found";
pub const MISSING_REQUIRED_FIELDS: &str = "Missing required fields";

#[derive(Clone, Default)]
pub struct UserService {
    store: Arc<UserStore>,
}

impl UserService {
    pub fn new(store: Arc<UserStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &UserStore {
        &self.store
    }

    pub fn list_users(&self) -> Result<ApiResponse<ListResponse<User>>, CoreError> {
        let data = self.store.list_all()?;
        Ok(ApiResponse::ok(ListResponse { data }))
    }

    pub fn get_user(&self, id: &str) -> Result<ApiResponse<User>, CoreError> {
        match self.store.find_by_id(id)? {
            Some(user) => Ok(ApiResponse::ok(user)),
            None => Err(absent_user(id)),
        }
    }

    pub fn create_user(&self, body: &[u8]) -> Result<ApiResponse<User>, CoreError> {
        let payload = decode_body(body)?;
        if !has_required_fields(&payload) {
            return Err(CoreError::BadRequest(MISSING_REQUIRED_FIELDS.to_string()));
        }

        let user = User::new(NewUser::from_payload(payload));
        self.store.insert(user.clone())?;
        info!("created user {}", user.id);

        Ok(ApiResponse::created(user))
    }

    /// The body is decoded before the lookup, so a malformed body is a 500
    /// even for an unknown id.
    pub fn update_user(&self, id: &str, body: &[u8]) -> Result<ApiResponse<User>, CoreError> {
        let patch = UserPatch::from_payload(decode_body(body)?);

        match self.store.replace(id, patch)? {
            Some(user) => {
                info!("updated user {}", user.id);
                Ok(ApiResponse::ok(user))
            }
            None => Err(absent_user(id)),
        }
    }

    pub fn delete_user(&self, id: &str) -> Result<ApiResponse<User>, CoreError> {
        match self.store.remove_by_id(id)? {
            Some(user) => {
                info!("deleted user {}", user.id);
                Ok(ApiResponse::no_content(user))
            }
            None => Err(absent_user(id)),
        }
    }
}

// Only reached once the id matched no record.
fn absent_user(id: &str) -> CoreError {
    if is_valid_id(id) {
        debug!("no user with id {}", id);
        CoreError::NotFound(USER_NOT_FOUND.to_string())
    } else {
        debug!("rejected malformed user id {:?}", id);
        CoreError::BadRequest(INCORRECT_USER_ID.to_string())
    }
}
