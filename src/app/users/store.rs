//! 内存用户存储

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use super::model::{User, UserPatch};
use crate::core::error::CoreError;

/// Ordered in-memory collection of users for one process. Never shared
/// across worker processes.
#[derive(Debug, Default)]
pub struct UserStore {
    users: RwLock<Vec<User>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_all(&self) -> Result<Vec<User>, CoreError> {
        Ok(self.read()?.clone())
    }

    /// Matches the exact textual id, so a differently-cased id is absent.
    pub fn find_by_id(&self, id: &str) -> Result<Option<User>, CoreError> {
        let users = self.read()?;
        Ok(position(&users, id).map(|index| users[index].clone()))
    }

    pub fn insert(&self, user: User) -> Result<(), CoreError> {
        self.write()?.push(user);
        Ok(())
    }

    pub fn replace(&self, id: &str, patch: UserPatch) -> Result<Option<User>, CoreError> {
        let mut users = self.write()?;
        Ok(position(&users, id).map(|index| {
            users[index].merge(patch);
            users[index].clone()
        }))
    }

    pub fn remove_by_id(&self, id: &str) -> Result<Option<User>, CoreError> {
        let mut users = self.write()?;
        Ok(position(&users, id).map(|index| users.remove(index)))
    }

    pub fn len(&self) -> Result<usize, CoreError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, CoreError> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<User>>, CoreError> {
        self.users
            .read()
            .map_err(|_| CoreError::InternalServerError("user store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<User>>, CoreError> {
        self.users
            .write()
            .map_err(|_| CoreError::InternalServerError("user store lock poisoned".to_string()))
    }
}

fn position(users: &[User], id: &str) -> Option<usize> {
    let mut buf = Uuid::encode_buffer();
    users
        .iter()
        .position(|user| user.id.hyphenated().encode_lower(&mut buf) == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: json!(name),
            age: json!(20),
            hobbies: json!([]),
        }
    }

    #[test]
    fn test_insert_preserves_order() {
        let store = UserStore::new();
        assert!(store.is_empty().unwrap());

        for name in ["a", "b", "c"] {
            store.insert(user(name)).unwrap();
        }

        let names: Vec<Value> = store
            .list_all()
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec![json!("a"), json!("b"), json!("c")]);
    }

    #[test]
    fn test_find_by_exact_text() {
        let store = UserStore::new();
        let u = user("a");
        let id = u.id.to_string();
        store.insert(u.clone()).unwrap();

        assert_eq!(store.find_by_id(&id).unwrap(), Some(u));
        assert_eq!(store.find_by_id(&id.to_uppercase()).unwrap(), None);
    }

    #[test]
    fn test_replace_keeps_position() {
        let store = UserStore::new();
        let first = user("a");
        let second = user("b");
        store.insert(first.clone()).unwrap();
        store.insert(second).unwrap();

        let patch = UserPatch {
            username: Some(json!("renamed")),
            ..UserPatch::default()
        };
        let merged = store.replace(&first.id.to_string(), patch).unwrap().unwrap();

        assert_eq!(merged.id, first.id);
        assert_eq!(merged.username, json!("renamed"));
        assert_eq!(store.list_all().unwrap()[0], merged);
    }

    #[test]
    fn test_replace_missing_returns_none() {
        let store = UserStore::new();
        let missing = Uuid::new_v4().to_string();
        assert!(store.replace(&missing, UserPatch::default()).unwrap().is_none());
    }

    #[test]
    fn test_remove() {
        let store = UserStore::new();
        let u = user("a");
        let id = u.id.to_string();
        store.insert(u.clone()).unwrap();

        assert_eq!(store.remove_by_id(&id).unwrap(), Some(u));
        assert_eq!(store.remove_by_id(&id).unwrap(), None);
        assert_eq!(store.len().unwrap(), 0);
    }
}
