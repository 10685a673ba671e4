//! PostgreSQL sharing grant repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use rider_types::{GrantScope, Permission};

use crate::error::DbResult;
use crate::models::GrantRow;
use crate::repo::GrantRepository;

/// PostgreSQL grant repository over `rider_permissions` and `project_permissions`
#[derive(Clone)]
pub struct PgGrantRepository {
    pool: PgPool,
}

impl PgGrantRepository {
    /// Create a new grant repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Table and foreign-key column holding grants for a scope
const fn table_for(scope: GrantScope) -> (&'static str, &'static str) {
    match scope {
        GrantScope::Rider => ("rider_permissions", "rider_id"),
        GrantScope::Project => ("project_permissions", "project_id"),
    }
}

#[async_trait]
impl GrantRepository for PgGrantRepository {
    async fn list(&self, scope: GrantScope, resource_id: Uuid) -> DbResult<Vec<GrantRow>> {
        let (table, fk) = table_for(scope);
        let sql = format!(
            "SELECT id, {fk} AS resource_id, email, permission, created_at \
             FROM {table} WHERE {fk} = $1 ORDER BY created_at"
        );

        let grants = sqlx::query_as::<_, GrantRow>(&sql)
            .bind(resource_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(grants)
    }

    async fn list_for_resources(
        &self,
        scope: GrantScope,
        resource_ids: &[Uuid],
    ) -> DbResult<Vec<GrantRow>> {
        if resource_ids.is_empty() {
            return Ok(Vec::new());
        }

        let (table, fk) = table_for(scope);
        let sql = format!(
            "SELECT id, {fk} AS resource_id, email, permission, created_at \
             FROM {table} WHERE {fk} = ANY($1) ORDER BY created_at"
        );

        let grants = sqlx::query_as::<_, GrantRow>(&sql)
            .bind(resource_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(grants)
    }

    async fn find_for_email(
        &self,
        scope: GrantScope,
        resource_id: Uuid,
        email: &str,
    ) -> DbResult<Vec<GrantRow>> {
        let (table, fk) = table_for(scope);
        let sql = format!(
            "SELECT id, {fk} AS resource_id, email, permission, created_at \
             FROM {table} WHERE {fk} = $1 AND email = $2"
        );

        let grants = sqlx::query_as::<_, GrantRow>(&sql)
            .bind(resource_id)
            .bind(email)
            .fetch_all(&self.pool)
            .await?;

        Ok(grants)
    }

    async fn create(
        &self,
        scope: GrantScope,
        resource_id: Uuid,
        email: &str,
        permission: Permission,
    ) -> DbResult<GrantRow> {
        let (table, fk) = table_for(scope);
        let sql = format!(
            "INSERT INTO {table} (id, {fk}, email, permission) VALUES ($1, $2, $3, $4) \
             RETURNING id, {fk} AS resource_id, email, permission, created_at"
        );

        let grant = sqlx::query_as::<_, GrantRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(resource_id)
            .bind(email)
            .bind(permission.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(grant)
    }

    async fn update_permission(
        &self,
        scope: GrantScope,
        resource_id: Uuid,
        grant_id: Uuid,
        permission: Permission,
    ) -> DbResult<Option<GrantRow>> {
        let (table, fk) = table_for(scope);
        let sql = format!(
            "UPDATE {table} SET permission = $1 WHERE id = $2 AND {fk} = $3 \
             RETURNING id, {fk} AS resource_id, email, permission, created_at"
        );

        let grant = sqlx::query_as::<_, GrantRow>(&sql)
            .bind(permission.as_str())
            .bind(grant_id)
            .bind(resource_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(grant)
    }

    async fn delete(&self, scope: GrantScope, resource_id: Uuid, grant_id: Uuid) -> DbResult<bool> {
        let (table, fk) = table_for(scope);
        let sql = format!("DELETE FROM {table} WHERE id = $1 AND {fk} = $2");

        let result = sqlx::query(&sql)
            .bind(grant_id)
            .bind(resource_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_selects_table() {
        assert_eq!(table_for(GrantScope::Rider), ("rider_permissions", "rider_id"));
        assert_eq!(
            table_for(GrantScope::Project),
            ("project_permissions", "project_id")
        );
    }
}
