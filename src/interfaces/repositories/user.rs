use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    entities::user::{User, UserRole},
    errors::StoreError,
    repositories::row_store::{Mutation, Query, RowStore, Table},
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, StoreError>;
    async fn create_user(&self, user: &User) -> Result<Uuid, StoreError>;
    async fn grant_role(&self, user_id: &Uuid, role: &str) -> Result<(), StoreError>;
    async fn is_admin(&self, user_id: &Uuid) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct StoreUserRepo {
    store: Arc<dyn RowStore>,
}

impl StoreUserRepo {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        StoreUserRepo { store }
    }

    async fn first(&self, query: Query) -> Result<Option<User>, StoreError> {
        let rows = match self.store.query(&query.limit(1)).await {
            Ok(rows) => rows,
            Err(StoreError::NotFound) => return Ok(None),
            Err(e) => return Err(e),
        };
        rows.into_iter()
            .next()
            .map(|row| {
                serde_json::from_value::<User>(row)
                    .map_err(|e| StoreError::Rejected(format!("malformed user row: {}", e)))
            })
            .transpose()
    }
}

#[async_trait]
impl UserRepository for StoreUserRepo {
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.first(Query::table(Table::Users).eq("email", email.trim().to_lowercase())).await
    }

    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, StoreError> {
        self.first(Query::table(Table::Users).eq("id", id.to_string())).await
    }

    async fn create_user(&self, user: &User) -> Result<Uuid, StoreError> {
        let row = serde_json::to_value(user).map_err(|e| StoreError::Rejected(e.to_string()))?;
        self.store.mutate(Table::Users, Mutation::Insert(vec![row])).await?;
        Ok(user.id)
    }

    async fn grant_role(&self, user_id: &Uuid, role: &str) -> Result<(), StoreError> {
        let row = serde_json::to_value(UserRole { user_id: *user_id, role: role.to_string() })
            .map_err(|e| StoreError::Rejected(e.to_string()))?;
        self.store.mutate(Table::UserRoles, Mutation::Upsert(row)).await?;
        Ok(())
    }

    async fn is_admin(&self, user_id: &Uuid) -> Result<bool, StoreError> {
        self.store.is_admin(*user_id).await
    }
}
