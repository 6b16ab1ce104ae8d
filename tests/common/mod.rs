// Not every test binary uses every helper.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tokio::sync::mpsc;
use uuid::Uuid;

use stocking_api::{
    auth::Actor,
    build_router,
    config::AppConfig,
    db::{self, DbConfig},
    entities::{fish_batch, person, stocking_event, tenant},
    events::{self, EventSender},
    handlers::AppServices,
    services::{
        batch_reconciler::BatchInput,
        geometry::Coordinates,
        notifications::{LogNotifier, Notifier},
        stocking_events::{RegisterStockingRequest, FISH_ORIGIN_GROWN},
    },
    AppState,
};

/// Helper harness for spinning up the service layer backed by a throwaway
/// SQLite database. Each instance gets its own database file so tests can
/// run in parallel.
pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub services: AppServices,
    event_sender: EventSender,
    db_file: PathBuf,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh, migrated database state.
    pub async fn new() -> Self {
        let db_file =
            std::env::temp_dir().join(format!("stocking_test_{}.db", Uuid::new_v4().simple()));

        let db_config = DbConfig {
            url: format!("sqlite://{}?mode=rwc", db_file.display()),
            max_connections: 5,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&db_config)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
        let event_task = tokio::spawn(events::process_events(event_rx, notifier));

        let services = AppServices::new(db.clone(), Some(Arc::new(event_sender.clone())));

        Self {
            db,
            services,
            event_sender,
            db_file,
            _event_task: event_task,
        }
    }

    /// Full application router over this instance's database, for tests
    /// driving the HTTP surface.
    #[allow(dead_code)]
    pub fn router(&self) -> axum::Router {
        let config = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        build_router(AppState {
            db: self.db.clone(),
            config,
            event_sender: self.event_sender.clone(),
            services: self.services.clone(),
        })
    }

    pub async fn seed_tenant(&self, name: &str) -> tenant::Model {
        tenant::ActiveModel {
            name: Set(name.to_string()),
            registry_code: Set(None),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .expect("seed tenant for tests")
    }

    pub async fn seed_person(&self, role: &str, tenant_id: Option<i64>) -> person::Model {
        person::ActiveModel {
            first_name: Set("Test".to_string()),
            last_name: Set(role.to_string()),
            email: Set(format!("{}@example.com", Uuid::new_v4().simple())),
            phone: Set(None),
            role: Set(role.to_string()),
            tenant_id: Set(tenant_id),
            authority: Set(None),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .expect("seed person for tests")
    }

    pub async fn seed_freelancer(&self) -> person::Model {
        self.seed_person(person::ROLE_USER, None).await
    }

    pub async fn seed_admin(&self) -> person::Model {
        self.seed_person(person::ROLE_ADMIN, None).await
    }

    pub async fn seed_inspector(&self) -> person::Model {
        self.seed_person(person::ROLE_INSPECTOR, None).await
    }

    pub fn actor(&self, person: &person::Model) -> Actor {
        Actor::from_person(person)
    }

    /// Inserts an event directly, bypassing the registration lead-time gate,
    /// so tests can place the event date anywhere on the timeline.
    pub async fn seed_event(
        &self,
        owner: &person::Model,
        event_time: DateTime<Utc>,
    ) -> stocking_event::Model {
        stocking_event::ActiveModel {
            event_time: Set(event_time),
            fish_origin: Set(FISH_ORIGIN_GROWN.to_string()),
            fish_origin_company_name: Set(Some("Kalakasvatus OÜ".to_string())),
            tenant_id: Set(owner.tenant_id),
            created_by: Set(owner.id),
            assigned_to: Set(owner.id),
            reservoir_name: Set("Lake Example".to_string()),
            geom_x: Set(658_000.0),
            geom_y: Set(6_470_000.0),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .expect("seed stocking event for tests")
    }

    pub async fn seed_batch(
        &self,
        event_id: i64,
        review_amount: Option<i32>,
    ) -> fish_batch::Model {
        fish_batch::ActiveModel {
            fish_stocking_id: Set(event_id),
            fish_type_id: Set(1),
            fish_age_id: Set(1),
            amount: Set(500),
            weight: Set(Some(12.5)),
            review_amount: Set(review_amount),
            review_weight: Set(review_amount.map(|a| f64::from(a) * 0.025)),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .expect("seed fish batch for tests")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
        let _ = std::fs::remove_file(&self.db_file);
    }
}

/// A desired batch line referencing the seeded reference data.
pub fn batch_input(id: Option<i64>, fish_type_id: i64, amount: i32) -> BatchInput {
    BatchInput {
        id,
        fish_type_id,
        fish_age_id: 1,
        amount,
        weight: Some(10.0),
        review_amount: None,
        review_weight: None,
    }
}

/// A valid registration request with the event date `days_out` days ahead.
pub fn register_request(assigned_to: i64, days_out: i64) -> RegisterStockingRequest {
    RegisterStockingRequest {
        event_time: Utc::now() + Duration::days(days_out),
        fish_origin: FISH_ORIGIN_GROWN.to_string(),
        fish_origin_company_name: Some("Kalakasvatus OÜ".to_string()),
        fish_origin_reservoir: None,
        tenant_id: None,
        stocking_customer_id: None,
        assigned_to,
        reservoir_cadastral_id: Some("VEE2075800".to_string()),
        reservoir_name: "Lake Example".to_string(),
        municipality: Some("Tartu vald".to_string()),
        reservoir_area: Some(180.5),
        reservoir_length: None,
        reservoir_category: None,
        coordinates: Coordinates {
            x: 658_000.0,
            y: 6_470_000.0,
        },
        batches: vec![batch_input(None, 1, 500)],
    }
}
