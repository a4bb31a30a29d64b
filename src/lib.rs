pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;

use sqlx::SqlitePool;

pub use config::Config;
use services::{
    ApprovalService, AttendanceService, PostingDispatcher, RecordService, RecordTypeRegistry,
    ScheduleService,
};

pub struct AppState {
    pub approval_service: ApprovalService,
    pub record_service: RecordService,
    pub schedule_service: ScheduleService,
    pub attendance_service: AttendanceService,
}

impl AppState {
    /// Wire the services over one pool, loading the record type registry from the database.
    pub async fn new(pool: SqlitePool, config: &Config) -> Result<Self, error::AppError> {
        let registry = RecordTypeRegistry::load(&pool).await?;
        Ok(Self::with_registry(pool, config, registry))
    }

    pub fn with_registry(pool: SqlitePool, config: &Config, registry: RecordTypeRegistry) -> Self {
        let record_service = RecordService::new(pool.clone(), registry);
        let dispatcher = PostingDispatcher::new(record_service.clone());

        Self {
            approval_service: ApprovalService::new(pool.clone(), dispatcher),
            record_service,
            schedule_service: ScheduleService::new(pool.clone()),
            attendance_service: AttendanceService::new(pool, config.rounding()),
        }
    }
}
