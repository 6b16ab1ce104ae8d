use std::sync::Arc;

use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, QueryOrder};

use crate::{
    entities::{
        fish_age::{self, Entity as FishAgeEntity},
        fish_type::{self, Entity as FishTypeEntity},
    },
    errors::ServiceError,
};

/// Existence lookup usable on any connection, transactions included.
pub async fn fish_type_exists<C: ConnectionTrait>(conn: &C, id: i64) -> Result<bool, ServiceError> {
    Ok(FishTypeEntity::find_by_id(id).one(conn).await?.is_some())
}

/// Existence lookup usable on any connection, transactions included.
pub async fn fish_age_exists<C: ConnectionTrait>(conn: &C, id: i64) -> Result<bool, ServiceError> {
    Ok(FishAgeEntity::find_by_id(id).one(conn).await?.is_some())
}

/// Existence lookups and listings for the fish species and age-class
/// reference tables. Batch referential validity is checked here before the
/// reconciler ever runs.
#[derive(Clone)]
pub struct ReferenceDataService {
    db: Arc<DatabaseConnection>,
}

impl ReferenceDataService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn fish_type_exists(&self, id: i64) -> Result<bool, ServiceError> {
        fish_type_exists(&*self.db, id).await
    }

    pub async fn fish_age_exists(&self, id: i64) -> Result<bool, ServiceError> {
        fish_age_exists(&*self.db, id).await
    }

    pub async fn list_fish_types(&self) -> Result<Vec<fish_type::Model>, ServiceError> {
        Ok(FishTypeEntity::find()
            .order_by_asc(fish_type::Column::Name)
            .all(&*self.db)
            .await?)
    }

    pub async fn list_fish_ages(&self) -> Result<Vec<fish_age::Model>, ServiceError> {
        Ok(FishAgeEntity::find()
            .order_by_asc(fish_age::Column::Id)
            .all(&*self.db)
            .await?)
    }
}
