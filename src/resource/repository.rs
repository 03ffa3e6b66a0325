//! Handle database requests.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::error::Result;
use crate::resource::{Resource, ResourceKind};

/// Persistence of owned resources.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Resources of `kind` owned by `owner`, by name descending.
    async fn list(&self, kind: ResourceKind, owner: i64) -> Result<Vec<Resource>>;

    /// Insert a resource of `kind` owned by `owner`.
    async fn insert(
        &self,
        kind: ResourceKind,
        owner: i64,
        name: &str,
    ) -> Result<Resource>;
}

#[derive(Clone)]
pub struct PgResourceStore {
    pool: Pool<Postgres>,
}

impl PgResourceStore {
    /// Create a new [`PgResourceStore`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResourceStore for PgResourceStore {
    async fn list(&self, kind: ResourceKind, owner: i64) -> Result<Vec<Resource>> {
        let query = format!(
            "SELECT id, name, user_id FROM {} WHERE user_id = $1 ORDER BY name DESC, id DESC",
            kind.table()
        );

        Ok(sqlx::query_as::<_, Resource>(&query)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert(
        &self,
        kind: ResourceKind,
        owner: i64,
        name: &str,
    ) -> Result<Resource> {
        let query = format!(
            "INSERT INTO {} (name, user_id) VALUES ($1, $2) RETURNING id, name, user_id",
            kind.table()
        );

        Ok(sqlx::query_as::<_, Resource>(&query)
            .bind(name)
            .bind(owner)
            .fetch_one(&self.pool)
            .await?)
    }
}
