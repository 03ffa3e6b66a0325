use std::sync::Arc;

use crate::error::{Result, ServerError};
use crate::resource::{MAX_NAME_LENGTH, Resource, ResourceKind, ResourceStore};
use crate::user::Caller;

/// Owner-scoped access to one kind of resource.
#[derive(Clone)]
pub struct ResourceService {
    kind: ResourceKind,
    store: Arc<dyn ResourceStore>,
}

impl ResourceService {
    /// Create a new [`ResourceService`].
    pub fn new(kind: ResourceKind, store: Arc<dyn ResourceStore>) -> Self {
        Self { kind, store }
    }

    /// Resources owned by `caller`.
    pub async fn list(&self, caller: &Caller) -> Result<Vec<Resource>> {
        self.store.list(self.kind, caller.user_id).await
    }

    /// Create a resource owned by `caller`.
    pub async fn create(&self, caller: &Caller, name: &str) -> Result<Resource> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServerError::field(
                "name",
                "required",
                "This field may not be blank.",
            ));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(ServerError::field(
                "name",
                "length",
                "Ensure this field has no more than 255 characters.",
            ));
        }

        let resource = self.store.insert(self.kind, caller.user_id, name).await?;
        tracing::debug!(
            kind = %self.kind,
            id = resource.id,
            owner = caller.user_id,
            "resource created"
        );

        Ok(resource)
    }
}
