use std::sync::Arc;

use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tracing::{info, instrument};

use crate::{
    entities::settings::{self, Entity as SettingsEntity},
    errors::ServiceError,
    services::status::StockingSettings,
};

/// Id of the single settings row, created by the seed migration.
const SETTINGS_ROW_ID: i64 = 1;

/// Settings Provider: exposes the two tunable stocking-window durations.
/// Read on every status derivation and every registration/deletion window
/// check, so values take effect without a restart.
#[derive(Clone)]
pub struct SettingsService {
    db: Arc<DatabaseConnection>,
}

impl SettingsService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn get(&self) -> Result<StockingSettings, ServiceError> {
        let row = SettingsEntity::find_by_id(SETTINGS_ROW_ID)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError("settings row is missing".to_string())
            })?;

        Ok(StockingSettings {
            min_time_till_stocking: row.min_time_till_stocking,
            max_time_for_registration: row.max_time_for_registration,
        })
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        min_time_till_stocking: i32,
        max_time_for_registration: i32,
    ) -> Result<StockingSettings, ServiceError> {
        if min_time_till_stocking < 0 || max_time_for_registration < 0 {
            return Err(ServiceError::ValidationError(
                "Stocking window durations must be non-negative".to_string(),
            ));
        }

        let active = settings::ActiveModel {
            id: Set(SETTINGS_ROW_ID),
            min_time_till_stocking: Set(min_time_till_stocking),
            max_time_for_registration: Set(max_time_for_registration),
        };
        let updated = active.update(&*self.db).await?;

        info!(
            min_time_till_stocking = updated.min_time_till_stocking,
            max_time_for_registration = updated.max_time_for_registration,
            "Stocking settings updated"
        );

        Ok(StockingSettings {
            min_time_till_stocking: updated.min_time_till_stocking,
            max_time_for_registration: updated.max_time_for_registration,
        })
    }
}
