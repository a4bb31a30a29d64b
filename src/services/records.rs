use std::{collections::HashMap, sync::Arc};

use chrono::{Local, NaiveDate};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::database::{
    DatabaseTransaction,
    models::{Punch, Record, RecordInput, RecordType},
    repositories::{record as record_repo, user as user_repo},
};
use crate::error::AppError;

/// Record types the reconciliation write path accepts, keyed by name.
///
/// Loaded once from `record_types` at startup and handed to [`RecordService`].
#[derive(Debug, Clone)]
pub struct RecordTypeRegistry {
    by_name: HashMap<String, RecordType>,
}

impl RecordTypeRegistry {
    pub fn from_types(types: impl IntoIterator<Item = RecordType>) -> Self {
        Self {
            by_name: types
                .into_iter()
                .map(|record_type| (record_type.to_string(), record_type))
                .collect(),
        }
    }

    pub async fn load(pool: &SqlitePool) -> Result<Self, AppError> {
        let mut conn = pool.acquire().await?;
        let rows = record_repo::load_record_types(&mut conn).await?;

        let mut by_name = HashMap::new();
        for (id, name) in rows {
            match name.parse::<RecordType>() {
                Ok(record_type) => {
                    by_name.insert(name, record_type);
                }
                Err(_) => log::warn!("Ignoring unsupported record type {} ({})", name, id),
            }
        }
        log::info!("Loaded {} record types", by_name.len());

        Ok(Self { by_name })
    }

    pub fn resolve(&self, name: &str) -> Result<RecordType, AppError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("Record type not found: {}", name)))
    }

    pub fn contains(&self, record_type: RecordType) -> bool {
        self.by_name.values().any(|known| *known == record_type)
    }
}

/// Work day a punch belongs to.
///
/// Clock-ins always land on their own calendar date. Later punches go to the
/// shift that is open today, else to one opened yesterday (an overnight shift),
/// else to today.
pub async fn bucket_date(
    conn: &mut SqliteConnection,
    punch: &Punch,
) -> Result<NaiveDate, sqlx::Error> {
    let today = punch.timestamp.date();
    if punch.record_type == RecordType::Clockin {
        return Ok(today);
    }

    if record_repo::has_clockin(conn, punch.user_id, today).await? {
        return Ok(today);
    }

    if let Some(yesterday) = today.pred_opt() {
        if record_repo::has_clockin(conn, punch.user_id, yesterday).await? {
            return Ok(yesterday);
        }
    }

    Ok(today)
}

#[derive(Clone)]
pub struct RecordService {
    pool: SqlitePool,
    registry: Arc<RecordTypeRegistry>,
}

impl RecordService {
    pub fn new(pool: SqlitePool, registry: RecordTypeRegistry) -> Self {
        Self {
            pool,
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &RecordTypeRegistry {
        &self.registry
    }

    /// Live punch from a user or a clocking device.
    pub async fn submit_record(
        &self,
        actor: Uuid,
        record_type: &str,
        input: RecordInput,
    ) -> Result<Record, AppError> {
        let record_type = self.registry.resolve(record_type)?;
        let service = self.clone();

        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                let conn: &mut SqliteConnection = tx;

                let user_id = match input.target_account.as_deref() {
                    Some(account) => {
                        user_repo::find_by_account(conn, account)
                            .await?
                            .ok_or_else(|| {
                                AppError::NotFound(format!("User not found: {}", account))
                            })?
                            .id
                    }
                    None => {
                        user_repo::find_by_id(conn, actor)
                            .await?
                            .ok_or_else(|| {
                                AppError::NotFound(format!("User not found: {}", actor))
                            })?
                            .id
                    }
                };

                let device_id = match input.device_account.as_deref() {
                    Some(account) => Some(
                        user_repo::find_device_by_account(conn, account)
                            .await?
                            .ok_or_else(|| {
                                AppError::NotFound(format!("Device not found: {}", account))
                            })?
                            .id,
                    ),
                    None => None,
                };

                let punch = Punch {
                    user_id,
                    record_type,
                    timestamp: input.timestamp.unwrap_or_else(|| Local::now().naive_local()),
                    device_id,
                    apply_id: input.apply_id,
                };

                service.post_punch(conn, &punch).await
            })
        })
        .await
    }

    /// Bucket and write a punch on an open connection or transaction.
    pub async fn post_punch(
        &self,
        conn: &mut SqliteConnection,
        punch: &Punch,
    ) -> Result<Record, AppError> {
        if !self.registry.contains(punch.record_type) {
            return Err(AppError::NotFound(format!(
                "Record type not found: {}",
                punch.record_type
            )));
        }

        let date = bucket_date(conn, punch).await?;
        let record = record_repo::upsert_punch(conn, punch, date).await?;

        log::info!(
            "Posted {} for user {} at {} to work day {}",
            punch.record_type,
            punch.user_id,
            punch.timestamp,
            date
        );

        Ok(record)
    }

    pub async fn get_record(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Record>, AppError> {
        let mut conn = self.pool.acquire().await?;
        Ok(record_repo::find_record(&mut conn, user_id, date).await?)
    }
}
