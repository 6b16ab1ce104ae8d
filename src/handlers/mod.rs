pub mod health;
pub mod reference_data;
pub mod settings;
pub mod stocking_events;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::events::EventSender;
use crate::services::{
    geometry::{GeometryConverter, PassthroughGeometry},
    reference_data::ReferenceDataService,
    settings::SettingsService,
    stocking_events::StockingEventService,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub stocking_events: Arc<StockingEventService>,
    pub settings: SettingsService,
    pub reference_data: ReferenceDataService,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<Arc<EventSender>>) -> Self {
        let settings = SettingsService::new(db.clone());
        let reference_data = ReferenceDataService::new(db.clone());
        let geometry: Arc<dyn GeometryConverter> = Arc::new(PassthroughGeometry);
        let stocking_events = Arc::new(StockingEventService::new(
            db,
            settings.clone(),
            geometry,
            event_sender,
        ));
        Self {
            stocking_events,
            settings,
            reference_data,
        }
    }
}
