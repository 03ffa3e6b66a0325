//! In-memory stores backing the test suite.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::resource::{Resource, ResourceKind, ResourceStore};
use crate::user::{NewUser, User, UserStore, email_taken};

#[derive(Default)]
struct Users {
    rows: Vec<User>,
    tokens: HashMap<String, i64>,
}

#[derive(Default)]
pub struct MemoryUserStore {
    inner: Mutex<Users>,
}

impl MemoryUserStore {
    /// Flip `is_active` off for a user.
    pub fn deactivate(&self, id: i64) {
        let mut users = self.inner.lock().unwrap();
        if let Some(user) = users.rows.iter_mut().find(|u| u.id == id) {
            user.is_active = false;
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let mut users = self.inner.lock().unwrap();
        if users.rows.iter().any(|u| u.email == user.email) {
            return Err(email_taken());
        }

        let user = User {
            id: users.rows.len() as i64 + 1,
            email: user.email,
            name: user.name,
            password: user.password,
            is_active: true,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            created_at: chrono::Utc::now(),
        };
        users.rows.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let users = self.inner.lock().unwrap();
        Ok(users.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.inner.lock().unwrap();
        Ok(users.rows.iter().find(|u| u.email == email).cloned())
    }

    async fn update(&self, user: &User) -> Result<()> {
        let mut users = self.inner.lock().unwrap();
        if let Some(row) = users.rows.iter_mut().find(|u| u.id == user.id) {
            row.name = user.name.clone();
            row.password = user.password.clone();
        }
        Ok(())
    }

    async fn insert_token(&self, token: &str, user_id: i64) -> Result<()> {
        let mut users = self.inner.lock().unwrap();
        users.tokens.insert(token.to_owned(), user_id);
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<User>> {
        let users = self.inner.lock().unwrap();
        Ok(users
            .tokens
            .get(token)
            .and_then(|id| users.rows.iter().find(|u| u.id == *id))
            .cloned())
    }
}

#[derive(Default)]
pub struct MemoryResourceStore {
    rows: Mutex<Vec<(ResourceKind, Resource)>>,
}

#[async_trait]
impl ResourceStore for MemoryResourceStore {
    async fn list(&self, kind: ResourceKind, owner: i64) -> Result<Vec<Resource>> {
        let rows = self.rows.lock().unwrap();
        let mut resources: Vec<Resource> = rows
            .iter()
            .filter(|(k, r)| *k == kind && r.owner == owner)
            .map(|(_, r)| r.clone())
            .collect();
        resources.sort_by(|a, b| b.name.cmp(&a.name).then(b.id.cmp(&a.id)));
        Ok(resources)
    }

    async fn insert(
        &self,
        kind: ResourceKind,
        owner: i64,
        name: &str,
    ) -> Result<Resource> {
        let mut rows = self.rows.lock().unwrap();
        let id = rows.iter().filter(|(k, _)| *k == kind).count() as i64 + 1;
        let resource = Resource {
            id,
            name: name.to_owned(),
            owner,
        };
        rows.push((kind, resource.clone()));
        Ok(resource)
    }
}
