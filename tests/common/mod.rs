#![allow(dead_code)]

use anyhow::Result;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use fake::{Fake, faker::name::en::Name};
use jsonwebtoken::{EncodingKey, Header, encode};
use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

use attendance::config::Config;
use attendance::database::init_database;
use attendance::database::models::*;
use attendance::database::repositories::{
    schedule as schedule_repo, user as user_repo, work_pattern as work_pattern_repo,
};
use attendance::handlers::shared::ApiResponse;
use attendance::services::{Claims, RecordTypeRegistry};
use attendance::AppState;

pub fn setup_test_env() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn test_config(database_url: &str) -> Config {
    Config {
        database_url: database_url.to_string(),
        database_max_connections: 8,
        jwt_secret: "test-jwt-secret-key-that-is-long-enough".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        client_base_url: "http://localhost:3000".to_string(),
        rounding_minutes: 0,
    }
}

/// A migrated SQLite database in a temp dir plus the wired services.
pub struct TestContext {
    pub pool: SqlitePool,
    pub config: Config,
    pub state: AppState,
    _temp_dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Result<Self> {
        Self::with_rounding(0).await
    }

    pub async fn with_rounding(rounding_minutes: u32) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let database_url = format!("sqlite:{}/test.db", temp_dir.path().display());
        let mut config = test_config(&database_url);
        config.rounding_minutes = rounding_minutes;

        let pool = init_database(&config.database_url, config.database_max_connections).await?;
        let state = AppState::new(pool.clone(), &config).await?;

        Ok(TestContext {
            pool,
            config,
            state,
            _temp_dir: temp_dir,
        })
    }

    /// Fresh state over the same pool with a hand-built registry.
    pub fn state_with_registry(&self, registry: RecordTypeRegistry) -> AppState {
        AppState::with_registry(self.pool.clone(), &self.config, registry)
    }

    pub async fn create_pattern(
        &self,
        name: &str,
        start: (u32, u32),
        end: (u32, u32),
    ) -> WorkPattern {
        let mut conn = self.pool.acquire().await.expect("Failed to acquire connection");
        work_pattern_repo::create_work_pattern(
            &mut conn,
            WorkPatternInput {
                name: name.to_string(),
                start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
                break_minutes: 60,
            },
        )
        .await
        .expect("Failed to create work pattern")
    }

    pub async fn create_user(&self, default_work_pattern_id: Option<Uuid>) -> User {
        let name: String = Name().fake();
        let account = format!("user-{}", Uuid::new_v4().simple());

        let mut conn = self.pool.acquire().await.expect("Failed to acquire connection");
        user_repo::create_user(
            &mut conn,
            UserInput {
                account,
                name,
                default_work_pattern_id,
            },
        )
        .await
        .expect("Failed to create user")
    }

    pub async fn create_device(&self, account: &str) -> Device {
        let mut conn = self.pool.acquire().await.expect("Failed to acquire connection");
        user_repo::create_device(&mut conn, account, "Front door terminal")
            .await
            .expect("Failed to create device")
    }

    pub async fn add_holiday(&self, date: NaiveDate, name: &str) {
        let mut conn = self.pool.acquire().await.expect("Failed to acquire connection");
        schedule_repo::add_holiday(&mut conn, date, name)
            .await
            .expect("Failed to add holiday");
    }

    pub async fn create_route(&self, input: ApprovalRouteInput) -> ApprovalRoute {
        self.state
            .approval_service
            .create_route(input)
            .await
            .expect("Failed to create route")
    }

    pub fn token_for(&self, user: &User) -> String {
        let claims = Claims {
            sub: user.id,
            account: user.account.clone(),
            exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_ref()),
        )
        .expect("Failed to encode token")
    }

    pub async fn count(&self, table: &str) -> i64 {
        let query = format!("SELECT COUNT(*) FROM {}", table);
        sqlx::query_scalar::<_, i64>(&query)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count rows")
    }

    pub async fn schedules_for(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<Schedule> {
        let mut conn = self.pool.acquire().await.expect("Failed to acquire connection");
        schedule_repo::schedules_in_range(&mut conn, user_id, from, to)
            .await
            .expect("Failed to load schedules")
    }

    pub async fn calendars_for(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<UserWorkPatternCalendar> {
        let mut conn = self.pool.acquire().await.expect("Failed to acquire connection");
        schedule_repo::calendars_in_range(&mut conn, user_id, from, to)
            .await
            .expect("Failed to load calendars")
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(date: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
    date.and_hms_opt(h, m, 0).unwrap()
}

pub fn apply_input(route_name: &str, from: NaiveDateTime, to: Option<NaiveDateTime>) -> ApplyInput {
    ApplyInput {
        target_account: None,
        date_time_from: from,
        date_time_to: to,
        date_related: None,
        reason: Some("Family matters".to_string()),
        contact: None,
        route_name: route_name.to_string(),
        work_pattern_name: None,
        options: Vec::new(),
    }
}

pub fn option(option_type: &str, option_value: &str) -> ApplyOptionInput {
    ApplyOptionInput {
        option_type: option_type.to_string(),
        option_value: option_value.to_string(),
    }
}

pub fn assert_success_response<T>(body: &[u8]) -> T
where
    T: serde::de::DeserializeOwned,
{
    let response: ApiResponse<T> =
        serde_json::from_slice(body).expect("Failed to parse JSON response");

    assert!(
        response.success,
        "Expected successful response but got error: {:?}",
        response.message
    );
    response.data.expect("Expected data in successful response")
}
